//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub papers: CheckResult,
    pub citation_edges: CheckResult,
    pub storage: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    fn up(count: Option<usize>) -> Self {
        Self {
            status: "up".to_string(),
            count,
            error: None,
        }
    }

    fn down(error: impl ToString) -> Self {
        Self {
            status: "down".to_string(),
            count: None,
            error: Some(error.to_string()),
        }
    }

    fn is_up(&self) -> bool {
        self.status == "up"
    }
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: citenet_common::VERSION.to_string(),
    })
}

/// Readiness probe - checks both CSV resources and the state store
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let papers = match state.data.papers().await {
        Ok(corpus) => CheckResult::up(Some(corpus.len())),
        Err(e) => CheckResult::down(e),
    };

    let citation_edges = match state.data.edges().await {
        Ok(edges) => CheckResult::up(Some(edges.len())),
        Err(e) => CheckResult::down(e),
    };

    let storage = match state.store.get(citenet_common::BOOKMARKS_KEY).await {
        Ok(_) => CheckResult::up(None),
        Err(e) => CheckResult::down(e),
    };

    let all_healthy = papers.is_up() && citation_edges.is_up() && storage.is_up();

    Json(ReadyResponse {
        status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
        checks: HealthChecks {
            papers,
            citation_edges,
            storage,
        },
    })
}
