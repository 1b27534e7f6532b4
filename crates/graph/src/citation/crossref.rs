//! Crossref works API client
//!
//! Only `message.title[0]` and `message.reference[].DOI` are read.

use citenet_common::config::CrossrefConfig;
use citenet_common::errors::{AppError, Result};
use citenet_common::source::http_client;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

/// The parts of a Crossref work the BFS needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossrefWork {
    pub title: Option<String>,

    /// Reference DOIs as returned (unnormalized), references without a DOI skipped
    pub references: Vec<String>,
}

impl CrossrefWork {
    /// Parse a `/works/{doi}` response body
    pub fn from_json(body: &str) -> Result<Self> {
        let envelope: WorkEnvelope = serde_json::from_str(body)?;
        Ok(envelope.message.into())
    }
}

#[derive(Deserialize)]
struct WorkEnvelope {
    message: WorkMessage,
}

#[derive(Deserialize, Default)]
struct WorkMessage {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    reference: Vec<WorkReference>,
}

#[derive(Deserialize)]
struct WorkReference {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

impl From<WorkMessage> for CrossrefWork {
    fn from(message: WorkMessage) -> Self {
        let title = message
            .title
            .into_iter()
            .next()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let references = message
            .reference
            .into_iter()
            .filter_map(|r| r.doi)
            .filter(|d| !d.trim().is_empty())
            .collect();

        Self { title, references }
    }
}

/// Source of work metadata, one DOI at a time
#[async_trait]
pub trait WorkSource: Send + Sync {
    /// Fetch one work. Any error is a per-item failure.
    async fn fetch_work(&self, doi: &str) -> Result<CrossrefWork>;
}

/// HTTP client for `GET {base_url}/works/{doi}`
pub struct CrossrefClient {
    client: reqwest::Client,
    base_url: Url,
}

impl CrossrefClient {
    /// Create a client from configuration
    pub fn new(config: &CrossrefConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| AppError::Configuration {
            message: format!("Invalid Crossref base URL {}: {}", config.base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Configuration {
                message: format!("Crossref base URL cannot be a base: {}", config.base_url),
            });
        }

        let user_agent = match &config.mailto {
            Some(mailto) => format!("citenet/{} (mailto:{})", citenet_common::VERSION, mailto),
            None => format!("citenet/{}", citenet_common::VERSION),
        };
        let client = http_client(Duration::from_secs(config.timeout_secs), &user_agent)?;

        Ok(Self { client, base_url })
    }

    /// URL of one work; the DOI is a single percent-encoded segment
    pub fn work_url(&self, doi: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("works").push(doi);
        }
        url
    }
}

#[async_trait]
impl WorkSource for CrossrefClient {
    async fn fetch_work(&self, doi: &str) -> Result<CrossrefWork> {
        let url = self.work_url(doi);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::unavailable(format!("crossref:{}", doi), e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound {
                resource_type: "crossref work".to_string(),
                id: doi.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                message: format!("Crossref {} for {}: {}", status, doi, body.chars().take(200).collect::<String>()),
            });
        }

        let body = response.text().await?;
        CrossrefWork::from_json(&body)
    }
}

/// In-memory work source for tests
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockWorkSource {
        works: HashMap<String, CrossrefWork>,
        pub requests: Mutex<Vec<String>>,
    }

    impl MockWorkSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_work(mut self, doi: &str, title: Option<&str>, refs: &[&str]) -> Self {
            self.works.insert(
                doi.to_string(),
                CrossrefWork {
                    title: title.map(str::to_string),
                    references: refs.iter().map(|r| r.to_string()).collect(),
                },
            );
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl WorkSource for MockWorkSource {
        async fn fetch_work(&self, doi: &str) -> Result<CrossrefWork> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(doi.to_string());
            }
            self.works.get(doi).cloned().ok_or_else(|| AppError::NotFound {
                resource_type: "crossref work".to_string(),
                id: doi.to_string(),
            })
        }
    }
}
