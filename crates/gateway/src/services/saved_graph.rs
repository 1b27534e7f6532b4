//! Saved-papers graph service
//!
//! Keeps the latest direct + co-citation graph of the bookmarked papers.
//! Every build takes a ticket from a [`BuildGate`]; a snapshot is only
//! replaced by one from a newer ticket, so a slow build that finishes
//! after a faster, newer one is dropped.

use super::dataset::DataSet;
use chrono::{DateTime, Utc};
use citenet_common::{errors::Result, BookmarkStore};
use citenet_graph::{
    build_direct_graph, BuildGate, DirectGraphInput, ForceLayout, Graph, LayoutCache, LayoutOutcome,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A published build
#[derive(Debug, Clone)]
pub struct SavedSnapshot {
    /// Ticket generation that produced this snapshot
    pub generation: u64,

    /// Bookmarked paper ids the graph was built from
    pub seed_ids: Vec<String>,

    pub graph: Arc<Graph>,

    pub built_at: DateTime<Utc>,
}

pub struct SavedGraphService {
    data: Arc<DataSet>,
    bookmarks: Arc<BookmarkStore>,
    layouts: LayoutCache,
    layout: ForceLayout,
    gate: BuildGate,
    snapshot: RwLock<Option<SavedSnapshot>>,
}

impl SavedGraphService {
    pub fn new(
        data: Arc<DataSet>,
        bookmarks: Arc<BookmarkStore>,
        layouts: LayoutCache,
        layout: ForceLayout,
    ) -> Self {
        Self {
            data,
            bookmarks,
            layouts,
            layout,
            gate: BuildGate::new(),
            snapshot: RwLock::new(None),
        }
    }

    /// Snapshot matching the current bookmark set, rebuilding when stale
    pub async fn current(&self) -> Result<SavedSnapshot> {
        let ids = self.bookmarks.ids().await;
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            if snapshot.seed_ids == ids {
                return Ok(snapshot.clone());
            }
        }
        self.rebuild().await
    }

    /// Build from the current bookmark set and publish unless a newer
    /// build already has
    pub async fn rebuild(&self) -> Result<SavedSnapshot> {
        let ticket = self.gate.begin();
        let seed_ids = self.bookmarks.ids().await;
        let graph = self.assemble(&seed_ids).await?;

        let built = SavedSnapshot {
            generation: ticket.generation(),
            seed_ids,
            graph: Arc::new(graph),
            built_at: Utc::now(),
        };

        Ok(self.publish(built).await)
    }

    /// Publish `built` unless a newer snapshot is already out; returns
    /// whichever snapshot is published afterwards
    async fn publish(&self, built: SavedSnapshot) -> SavedSnapshot {
        let mut slot = self.snapshot.write().await;
        match slot.as_ref() {
            Some(published) if published.generation > built.generation => {
                debug!(
                    stale = built.generation,
                    published = published.generation,
                    "Discarding superseded saved-graph build"
                );
                published.clone()
            }
            _ => {
                *slot = Some(built.clone());
                built
            }
        }
    }

    /// Rebuild in the background after a bookmark change
    pub fn schedule_rebuild(self: &Arc<Self>) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.rebuild().await {
                warn!(error = %e, "Background saved-graph rebuild failed");
            }
        });
    }

    /// Layout of the current snapshot, from cache when unchanged
    pub async fn layout(&self) -> Result<(SavedSnapshot, LayoutOutcome)> {
        let snapshot = self.current().await?;
        let layout = self.layout.clone();
        let outcome = self
            .layouts
            .get_or_compute(&snapshot.graph, move |graph| layout.compute(graph))
            .await;
        Ok((snapshot, outcome))
    }

    async fn assemble(&self, seed_ids: &[String]) -> Result<Graph> {
        if seed_ids.is_empty() {
            return Ok(Graph::default());
        }

        let corpus = self.data.papers().await?;
        let edges = self.data.edges().await?;

        let mut input = DirectGraphInput {
            titles_by_doi: corpus.titles_by_doi(),
            ..Default::default()
        };
        let mut saved_index_by_doi = HashMap::new();
        for (pos, id) in seed_ids.iter().enumerate() {
            match corpus.doi_for(id) {
                Some(doi) => {
                    saved_index_by_doi.entry(doi.clone()).or_insert(pos + 1);
                    input.seed_dois.push(doi);
                }
                None => debug!(paper_id = %id, "Bookmarked paper has no DOI, left out of graph"),
            }
        }
        input.saved_index_by_doi = saved_index_by_doi;

        Ok(build_direct_graph(&input, &edges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citenet_common::store::{MemoryStore, StateStore};
    use citenet_common::PaperCorpus;
    use citenet_graph::CitationEdge;

    const PAPERS: &str = "\
Title,DOI
Paper A,10.1/a
Paper B,https://doi.org/10.1/B
No DOI paper,
";

    async fn service() -> (Arc<SavedGraphService>, Arc<BookmarkStore>, PaperCorpus) {
        let corpus = PaperCorpus::parse(PAPERS).unwrap();
        let edges = vec![
            CitationEdge::new("10.1/a", "10.1/x"),
            CitationEdge::new("10.1/b", "10.1/x"),
            CitationEdge::new("10.1/b", "10.1/y"),
        ];
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let bookmarks = Arc::new(BookmarkStore::load(store.clone()).await);
        let data = Arc::new(DataSet::preloaded(corpus.clone(), edges));

        let service = SavedGraphService::new(
            data,
            bookmarks.clone(),
            LayoutCache::new(store),
            ForceLayout::default(),
        );
        (Arc::new(service), bookmarks, corpus)
    }

    fn id_of(corpus: &PaperCorpus, title: &str) -> String {
        corpus
            .papers()
            .iter()
            .find(|p| p.title == title)
            .map(|p| p.id.clone())
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_bookmarks_give_empty_graph() {
        let (service, _, _) = service().await;
        let snapshot = service.current().await.unwrap();
        assert!(snapshot.graph.is_empty());
    }

    #[tokio::test]
    async fn test_graph_follows_bookmarks() {
        let (service, bookmarks, corpus) = service().await;

        bookmarks.toggle(&id_of(&corpus, "Paper B")).await;
        bookmarks.toggle(&id_of(&corpus, "Paper A")).await;
        bookmarks.toggle(&id_of(&corpus, "No DOI paper")).await;

        let snapshot = service.current().await.unwrap();
        let graph = &snapshot.graph;
        assert_eq!(graph.nodes.len(), 4);

        let a = graph.node("10.1/a").unwrap();
        assert_eq!(a.label, "Paper A");
        assert_eq!(a.index, Some(2));
        assert_eq!(graph.node("10.1/b").unwrap().index, Some(1));

        // Same bookmark set: served from the snapshot
        let again = service.current().await.unwrap();
        assert_eq!(again.generation, snapshot.generation);

        bookmarks.toggle(&id_of(&corpus, "Paper A")).await;
        let after = service.current().await.unwrap();
        assert!(after.generation > snapshot.generation);
        assert!(after.graph.node("10.1/a").is_none());
    }

    #[tokio::test]
    async fn test_older_build_never_replaces_newer() {
        let (service, bookmarks, corpus) = service().await;
        bookmarks.toggle(&id_of(&corpus, "Paper A")).await;

        // Two builds start; the newer one publishes first
        let older_ticket = service.gate.begin();
        let newer = service.rebuild().await.unwrap();
        assert!(!older_ticket.is_current());

        let late = SavedSnapshot {
            generation: older_ticket.generation(),
            seed_ids: vec![],
            graph: Arc::new(Graph::default()),
            built_at: Utc::now(),
        };
        let published = service.publish(late).await;
        assert_eq!(published.generation, newer.generation);
        assert!(!published.graph.is_empty());

        let current = service.current().await.unwrap();
        assert_eq!(current.generation, newer.generation);
    }

    #[tokio::test]
    async fn test_layout_is_cached() {
        let (service, bookmarks, corpus) = service().await;
        bookmarks.toggle(&id_of(&corpus, "Paper A")).await;

        let (_, first) = service.layout().await.unwrap();
        let (_, second) = service.layout().await.unwrap();
        assert!(!first.reused);
        assert!(second.reused);
        assert_eq!(first.positions, second.positions);
    }
}
