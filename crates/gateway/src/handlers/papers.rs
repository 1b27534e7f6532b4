//! Paper corpus handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use citenet_common::{
    errors::{AppError, Result},
    PaperRecord,
};

/// Query for listing papers
#[derive(Debug, Deserialize, Validate)]
pub struct ListPapersQuery {
    /// Case-insensitive title filter
    #[serde(default)]
    pub q: Option<String>,

    #[validate(range(min = 1, max = 500))]
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize { 50 }

/// Compact paper listing entry
#[derive(Serialize)]
pub struct PaperSummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub concepts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<f64>,
    pub bookmarked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark_index: Option<usize>,
}

#[derive(Serialize)]
pub struct ListPapersResponse {
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub papers: Vec<PaperSummary>,
}

/// Full paper with bookmark state
#[derive(Serialize)]
pub struct PaperResponse {
    #[serde(flatten)]
    pub paper: PaperRecord,
    pub bookmarked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark_index: Option<usize>,
}

/// List papers, optionally filtered by title
pub async fn list_papers(
    State(state): State<AppState>,
    Query(query): Query<ListPapersQuery>,
) -> Result<Json<ListPapersResponse>> {
    query.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("limit".to_string()),
    })?;

    let corpus = state.data.papers().await?;
    let bookmarked = state.bookmarks.ids().await;

    let matches: Vec<&PaperRecord> = corpus.search(query.q.as_deref().unwrap_or("")).collect();
    let total = matches.len();

    let papers = matches
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .map(|p| {
            let bookmark_index = bookmarked.iter().position(|id| *id == p.id).map(|i| i + 1);
            PaperSummary {
                id: p.id.clone(),
                title: p.title.clone(),
                doi: p.doi.clone(),
                authors: p.authors.clone(),
                year: p.year,
                concepts: p.concepts.clone(),
                citations: p.citations,
                bookmarked: bookmark_index.is_some(),
                bookmark_index,
            }
        })
        .collect();

    Ok(Json(ListPapersResponse {
        total,
        offset: query.offset,
        limit: query.limit,
        papers,
    }))
}

/// Get a paper by ID
pub async fn get_paper(
    State(state): State<AppState>,
    Path(paper_id): Path<String>,
) -> Result<Json<PaperResponse>> {
    let corpus = state.data.papers().await?;

    let paper = corpus
        .get(&paper_id)
        .cloned()
        .ok_or_else(|| AppError::PaperNotFound { id: paper_id.clone() })?;

    let bookmark_index = state.bookmarks.index(&paper_id).await;

    Ok(Json(PaperResponse {
        paper,
        bookmarked: bookmark_index.is_some(),
        bookmark_index,
    }))
}
