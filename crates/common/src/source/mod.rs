//! Text resource loading
//!
//! CSV resources are addressed by a location string that is either a
//! filesystem path or an `http(s)://` URL.

use crate::errors::{AppError, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// Build the HTTP client used for resource and API fetches
pub fn http_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| AppError::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
        })
}

/// Whether a location refers to a remote resource
pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Decode bytes as UTF-8, replacing invalid sequences with U+FFFD
fn decode_lossy(location: &str, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(
                location,
                valid_up_to = e.utf8_error().valid_up_to(),
                "Resource is not valid UTF-8, decoding lossily"
            );
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Load a text resource from a path or URL.
///
/// Any failure to obtain the bytes (missing file, network error, non-2xx
/// status) is reported as `ResourceUnavailable`. Invalid UTF-8 is
/// decoded lossily on both branches, so one bad byte only affects its row.
pub async fn load_text(client: &reqwest::Client, location: &str) -> Result<String> {
    if is_remote(location) {
        let response = client
            .get(location)
            .send()
            .await
            .map_err(|e| AppError::unavailable(location, e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::unavailable(
                location,
                format!("HTTP {}", response.status()),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::unavailable(location, e.to_string()))?;
        debug!(location, bytes = text.len(), "Loaded remote resource");
        Ok(text)
    } else {
        let bytes = tokio::fs::read(location)
            .await
            .map_err(|e| AppError::unavailable(location, e.to_string()))?;
        debug!(location, bytes = bytes.len(), "Loaded local resource");
        Ok(decode_lossy(location, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.org/edges.csv"));
        assert!(is_remote("HTTP://example.org/edges.csv"));
        assert!(!is_remote("public/citation_edges.csv"));
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let client = reqwest::Client::new();
        let err = load_text(&client, "/definitely/not/here.csv").await.unwrap_err();
        assert!(err.is_no_data());
    }

    #[tokio::test]
    async fn test_reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "source,target\na,b\n").unwrap();

        let client = reqwest::Client::new();
        let text = load_text(&client, file.path().to_str().unwrap()).await.unwrap();
        assert!(text.starts_with("source,target"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_decoded_lossily() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"source,target\nca\xe9,b\nc,d\n").unwrap();

        let client = reqwest::Client::new();
        let text = load_text(&client, file.path().to_str().unwrap()).await.unwrap();
        assert!(text.contains("ca\u{FFFD},b"));
        assert!(text.ends_with("c,d\n"));
    }
}
