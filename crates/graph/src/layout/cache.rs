//! Content-addressed layout cache
//!
//! A single persisted entry `{signature, positions}`. A lookup hits only
//! when the stored signature equals the graph's and every node has a
//! position; any other state is replaced wholesale by a fresh layout.

use super::{covers, graph_signature, Positions};
use crate::citation::Graph;
use citenet_common::metrics;
use citenet_common::store::{get_json, set_json, StateStore};
use citenet_common::LAYOUT_CACHE_KEY;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// The persisted entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLayout {
    #[serde(alias = "sig")]
    pub signature: String,

    #[serde(alias = "pos")]
    pub positions: Positions,
}

/// Positions for a graph, and where they came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutOutcome {
    pub signature: String,
    pub positions: Positions,

    /// True when served from the cache without computing
    pub reused: bool,
}

/// Layout cache over a state store
#[derive(Clone)]
pub struct LayoutCache {
    store: Arc<dyn StateStore>,
    key: String,
}

impl LayoutCache {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            key: LAYOUT_CACHE_KEY.to_string(),
        }
    }

    /// Stored positions for `signature`; unreadable entries are misses
    pub async fn lookup(&self, signature: &str) -> Option<Positions> {
        match get_json::<CachedLayout>(self.store.as_ref(), &self.key).await {
            Ok(Some(entry)) if entry.signature == signature => Some(entry.positions),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, key = %self.key, "Layout cache unreadable, treating as miss");
                None
            }
        }
    }

    /// Replace the stored entry. Failures are logged and ignored.
    pub async fn store(&self, signature: &str, positions: &Positions) {
        let entry = CachedLayout {
            signature: signature.to_string(),
            positions: positions.clone(),
        };
        if let Err(e) = set_json(self.store.as_ref(), &self.key, &entry).await {
            warn!(error = %e, key = %self.key, "Failed to persist layout, continuing uncached");
        }
    }

    /// Cached positions for `graph`, or `compute` them and overwrite the
    /// entry.
    pub async fn get_or_compute<F>(&self, graph: &Graph, compute: F) -> LayoutOutcome
    where
        F: FnOnce(&Graph) -> Positions,
    {
        let signature = graph_signature(graph);

        if let Some(positions) = self.lookup(&signature).await {
            if covers(&positions, graph) {
                metrics::record_cache(true, "layout");
                debug!(signature = %&signature[..12], "Layout cache hit");
                return LayoutOutcome {
                    signature,
                    positions,
                    reused: true,
                };
            }
        }

        metrics::record_cache(false, "layout");
        let positions = compute(graph);
        self.store(&signature, &positions).await;
        debug!(signature = %&signature[..12], nodes = positions.len(), "Layout computed");

        LayoutOutcome {
            signature,
            positions,
            reused: false,
        }
    }
}
