//! Bookmark handlers
//!
//! Every change schedules a rebuild of the saved-papers graph.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::AppState;
use citenet_common::{
    bookmarks::ToggleOutcome,
    errors::{AppError, Result},
};

#[derive(Serialize)]
pub struct BookmarkEntry {
    pub id: String,
    /// 1-based position in bookmark order
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Serialize)]
pub struct BookmarksResponse {
    pub count: usize,
    pub bookmarks: Vec<BookmarkEntry>,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
    pub persisted: bool,
}

/// List bookmarks in insertion order
pub async fn list_bookmarks(State(state): State<AppState>) -> Result<Json<BookmarksResponse>> {
    let ids = state.bookmarks.ids().await;

    // Titles are best effort; bookmarks stay listable without the corpus
    let corpus = state.data.papers().await.ok();

    let bookmarks: Vec<BookmarkEntry> = ids
        .into_iter()
        .enumerate()
        .map(|(i, id)| BookmarkEntry {
            title: corpus
                .as_ref()
                .and_then(|c| c.get(&id))
                .map(|p| p.title.clone()),
            id,
            index: i + 1,
        })
        .collect();

    Ok(Json(BookmarksResponse {
        count: bookmarks.len(),
        bookmarks,
    }))
}

/// Toggle a paper's bookmark
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    Path(paper_id): Path<String>,
) -> Result<Json<ToggleOutcome>> {
    let corpus = state.data.papers().await?;
    if corpus.get(&paper_id).is_none() {
        return Err(AppError::PaperNotFound { id: paper_id });
    }

    let outcome = state.bookmarks.toggle(&paper_id).await;
    state.saved_graph.schedule_rebuild();

    tracing::info!(
        paper_id = %paper_id,
        bookmarked = outcome.bookmarked,
        persisted = outcome.persisted,
        "Bookmark toggled"
    );

    Ok(Json(outcome))
}

/// Remove every bookmark
pub async fn clear_bookmarks(State(state): State<AppState>) -> Json<ClearResponse> {
    let persisted = state.bookmarks.clear().await;
    state.saved_graph.schedule_rebuild();

    tracing::info!(persisted, "Bookmarks cleared");

    Json(ClearResponse {
        cleared: true,
        persisted,
    })
}
