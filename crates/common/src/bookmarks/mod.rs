//! Bookmark store
//!
//! The bookmark set is loaded once, kept in insertion order (the order
//! drives the 1-based badge shown next to saved papers) and written
//! through to the state store on every mutation. A failed write leaves
//! the in-memory set authoritative for the rest of the session.

use crate::errors::Result;
use crate::metrics;
use crate::store::{get_json, set_json, StateStore};
use crate::BOOKMARKS_KEY;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Result of a toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub id: String,
    pub bookmarked: bool,
    /// 1-based bookmark index after the toggle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Whether the new state reached persistent storage
    pub persisted: bool,
}

/// Insertion-ordered set of bookmarked paper ids
pub struct BookmarkStore {
    store: Arc<dyn StateStore>,
    ids: RwLock<Vec<String>>,
}

impl BookmarkStore {
    /// Load the persisted set; unreadable state starts an empty set
    pub async fn load(store: Arc<dyn StateStore>) -> Self {
        let ids = match get_json::<Vec<String>>(store.as_ref(), BOOKMARKS_KEY).await {
            Ok(Some(ids)) => dedup_in_order(ids),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Persisted bookmarks unreadable, starting empty");
                Vec::new()
            }
        };

        debug!(count = ids.len(), backend = store.backend(), "Bookmarks loaded");
        Self {
            store,
            ids: RwLock::new(ids),
        }
    }

    /// Snapshot of bookmarked ids in insertion order
    pub async fn ids(&self) -> Vec<String> {
        self.ids.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.ids.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.ids.read().await.is_empty()
    }

    pub async fn is_bookmarked(&self, id: &str) -> bool {
        self.ids.read().await.iter().any(|i| i == id)
    }

    /// 1-based position in insertion order
    pub async fn index(&self, id: &str) -> Option<usize> {
        self.ids.read().await.iter().position(|i| i == id).map(|p| p + 1)
    }

    /// Add the id if absent, remove it if present
    pub async fn toggle(&self, id: &str) -> ToggleOutcome {
        let mut ids = self.ids.write().await;

        let bookmarked = match ids.iter().position(|i| i == id) {
            Some(pos) => {
                ids.remove(pos);
                false
            }
            None => {
                ids.push(id.to_string());
                true
            }
        };

        let index = ids.iter().position(|i| i == id).map(|p| p + 1);
        let persisted = self.persist(&ids).await.is_ok();
        metrics::record_bookmark_toggle(bookmarked);

        ToggleOutcome {
            id: id.to_string(),
            bookmarked,
            index,
            persisted,
        }
    }

    /// Remove every bookmark, returning whether the change was persisted
    pub async fn clear(&self) -> bool {
        let mut ids = self.ids.write().await;
        ids.clear();
        self.persist(&ids).await.is_ok()
    }

    async fn persist(&self, ids: &[String]) -> Result<()> {
        if let Err(e) = set_json(self.store.as_ref(), BOOKMARKS_KEY, ids).await {
            warn!(error = %e, "Failed to persist bookmarks, keeping them for this session only");
            return Err(e);
        }
        Ok(())
    }
}

fn dedup_in_order(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
