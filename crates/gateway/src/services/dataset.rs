//! Lazily loaded CSV data
//!
//! Both CSVs are loaded on first use. A failed load is not remembered,
//! so the next request tries again.

use citenet_common::{
    config::DataConfig,
    errors::{AppError, Result},
    PaperCorpus,
};
use citenet_graph::{load_edges, CitationEdge};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

pub struct DataSet {
    client: reqwest::Client,
    papers_location: String,
    edges_location: String,
    papers: OnceCell<Arc<PaperCorpus>>,
    edges: OnceCell<Arc<Vec<CitationEdge>>>,
}

impl DataSet {
    pub fn new(client: reqwest::Client, config: &DataConfig) -> Self {
        Self {
            client,
            papers_location: config.papers_csv.clone(),
            edges_location: config.citation_edges_csv.clone(),
            papers: OnceCell::new(),
            edges: OnceCell::new(),
        }
    }

    /// Data set with both resources already in memory
    #[cfg(test)]
    pub fn preloaded(papers: PaperCorpus, edges: Vec<CitationEdge>) -> Self {
        Self {
            client: reqwest::Client::new(),
            papers_location: String::new(),
            edges_location: String::new(),
            papers: OnceCell::new_with(Some(Arc::new(papers))),
            edges: OnceCell::new_with(Some(Arc::new(edges))),
        }
    }

    /// The paper corpus
    pub async fn papers(&self) -> Result<Arc<PaperCorpus>> {
        self.papers
            .get_or_try_init(|| async {
                let corpus = PaperCorpus::load(&self.client, &self.papers_location).await?;
                info!(location = %self.papers_location, papers = corpus.len(), "Paper corpus loaded");
                Ok::<_, AppError>(Arc::new(corpus))
            })
            .await
            .cloned()
    }

    /// The citation edge list
    pub async fn edges(&self) -> Result<Arc<Vec<CitationEdge>>> {
        self.edges
            .get_or_try_init(|| async {
                let edges = load_edges(&self.client, &self.edges_location).await?;
                info!(location = %self.edges_location, edges = edges.len(), "Citation edges loaded");
                Ok::<_, AppError>(Arc::new(edges))
            })
            .await
            .cloned()
    }
}
