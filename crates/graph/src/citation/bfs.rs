//! Breadth-first citation expansion against a remote work source
//!
//! Strictly one request in flight, with a fixed pause between requests.
//! The pause is a courtesy to Crossref's rate expectations, so lookups
//! are never fanned out.

use super::crossref::WorkSource;
use super::graph::GraphBuilder;
use super::{node_size, Graph, GraphLink};
use crate::gate::BuildTicket;
use citenet_common::config::CrossrefConfig;
use citenet_common::doi::normalize_doi;
use citenet_common::errors::{AppError, Result};
use citenet_common::metrics;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Traversal bounds
#[derive(Debug, Clone)]
pub struct BfsOptions {
    /// Reference hops explored past the seeds
    pub max_depth: usize,

    /// New links recorded per fetched work
    pub max_refs_per_node: usize,

    /// Stop once the graph holds this many nodes
    pub max_total_nodes: Option<usize>,

    /// Pause between consecutive requests
    pub delay: Duration,
}

impl Default for BfsOptions {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_refs_per_node: 30,
            max_total_nodes: None,
            delay: Duration::from_millis(120),
        }
    }
}

impl From<&CrossrefConfig> for BfsOptions {
    fn from(config: &CrossrefConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_refs_per_node: config.max_refs_per_node,
            max_total_nodes: config.max_total_nodes,
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

/// Builds a citation graph by walking references breadth-first
pub struct CrossrefGraphBuilder {
    source: Arc<dyn WorkSource>,
    options: BfsOptions,
}

impl CrossrefGraphBuilder {
    pub fn new(source: Arc<dyn WorkSource>, options: BfsOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &BfsOptions {
        &self.options
    }

    /// Copy of this builder with other bounds, same work source
    pub fn with_options(&self, options: BfsOptions) -> Self {
        Self {
            source: self.source.clone(),
            options,
        }
    }

    /// Expand from `seed_dois`.
    ///
    /// A work at depth `d` is fetched only while `d < max_depth`; its
    /// references become nodes at `d + 1` and are queued only while
    /// `d + 1 < max_depth`. Each DOI is queued at most once. A failed
    /// fetch is logged and skipped. With a `ticket`, the walk stops with
    /// `StaleResponse` as soon as a newer build has started.
    pub async fn build(
        &self,
        seed_dois: &[String],
        titles_by_doi: &HashMap<String, String>,
        ticket: Option<&BuildTicket>,
    ) -> Result<Graph> {
        let started = Instant::now();
        let opts = &self.options;

        let titles: HashMap<String, String> = titles_by_doi
            .iter()
            .map(|(k, v)| (normalize_doi(k), v.trim().to_string()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect();
        let label_for = |id: &str| titles.get(id).cloned().unwrap_or_else(|| id.to_string());

        let mut graph = GraphBuilder::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        let mut queued: HashSet<String> = HashSet::new();

        for seed in seed_dois {
            let doi = normalize_doi(seed);
            if doi.is_empty() || !queued.insert(doi.clone()) {
                continue;
            }
            graph.ensure_node(&doi, || label_for(&doi));
            if opts.max_depth > 0 {
                queue.push_back((doi, 0));
            }
        }

        let mut fetched = 0usize;
        let mut failed = 0usize;

        while let Some((doi, depth)) = queue.pop_front() {
            if fetched > 0 {
                tokio::time::sleep(opts.delay).await;
            }
            if let Some(ticket) = ticket {
                ticket.ensure_current()?;
            }

            fetched += 1;
            match self.source.fetch_work(&doi).await {
                Ok(work) => {
                    metrics::record_crossref_fetch(true);

                    if let Some(title) = work.title {
                        if !titles.contains_key(&doi) {
                            if let Some(node) = graph.node_mut(&doi) {
                                node.label = title;
                            }
                        }
                    }

                    let mut added = 0usize;
                    for reference in &work.references {
                        let target = normalize_doi(reference);
                        if target.is_empty() {
                            continue;
                        }

                        graph.ensure_node(&target, || label_for(&target));
                        if !graph.add_link(GraphLink::direct(doi.as_str(), target.as_str())) {
                            continue;
                        }
                        added += 1;

                        if depth + 1 < opts.max_depth && queued.insert(target.clone()) {
                            queue.push_back((target, depth + 1));
                        }
                        if added >= opts.max_refs_per_node {
                            break;
                        }
                    }

                    debug!(doi = %doi, depth, references = added, "Expanded work");
                }
                Err(e) => {
                    metrics::record_crossref_fetch(false);
                    failed += 1;
                    warn!(doi = %doi, depth, error = %e, "Crossref fetch failed, continuing");
                }
            }

            if let Some(cap) = opts.max_total_nodes {
                if graph.node_count() >= cap {
                    info!(cap, pending = queue.len(), "Node cap reached, stopping expansion");
                    break;
                }
            }
        }

        if let Some(ticket) = ticket {
            if !ticket.is_current() {
                return Err(AppError::StaleResponse);
            }
        }

        let graph = graph.finish(|n| node_size(n.degree_in, false));

        info!(
            seeds = seed_dois.len(),
            fetched,
            failed,
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "Crossref citation graph built"
        );
        metrics::record_graph_build(
            "crossref",
            started.elapsed().as_secs_f64(),
            graph.nodes.len(),
            graph.links.len(),
        );

        Ok(graph)
    }
}
