//! Corpus overview graph weighted by shared references

use super::graph::GraphBuilder;
use super::{shared_node_size, CitationEdge, Graph, GraphLink, LinkKind};
use citenet_common::doi::normalize_doi;
use citenet_common::metrics;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::debug;

/// Options of the shared-weight assembler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedGraphOptions {
    /// Minimum shared references for a `shared` link
    #[serde(default = "default_min_shared")]
    pub min_shared: usize,

    /// Keep only the largest N nodes
    #[serde(default)]
    pub max_nodes: Option<usize>,
}

fn default_min_shared() -> usize {
    1
}

impl Default for SharedGraphOptions {
    fn default() -> Self {
        Self {
            min_shared: default_min_shared(),
            max_nodes: None,
        }
    }
}

/// Build the shared-reference graph among the seed papers.
///
/// Nodes are the seeds only. A `direct` link joins two seeds when one
/// cites the other; a `shared` link joins two seeds whose reference sets
/// intersect in at least `min_shared` DOIs, weighted by the intersection
/// size.
pub fn build_shared_graph(
    seed_dois: &[String],
    titles_by_doi: &HashMap<String, String>,
    edges: &[CitationEdge],
    options: &SharedGraphOptions,
) -> Graph {
    let started = Instant::now();

    let mut seen = HashSet::new();
    let seeds: Vec<String> = seed_dois
        .iter()
        .map(|d| normalize_doi(d))
        .filter(|d| !d.is_empty() && seen.insert(d.clone()))
        .collect();

    let titles: HashMap<String, String> = titles_by_doi
        .iter()
        .map(|(k, v)| (normalize_doi(k), v.trim().to_string()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect();

    let mut graph = GraphBuilder::new();
    for id in &seeds {
        graph.ensure_node(id, || titles.get(id).cloned().unwrap_or_else(|| id.clone()));
    }

    let mut refs_by_seed: HashMap<&str, HashSet<String>> = HashMap::new();
    for edge in edges {
        let source = normalize_doi(&edge.source);
        let target = normalize_doi(&edge.target);
        let Some(seed) = seen.get(&source) else {
            continue;
        };
        if target.is_empty() {
            continue;
        }

        if seen.contains(&target) {
            graph.add_link(GraphLink::direct(source.as_str(), target.as_str()));
        }
        refs_by_seed.entry(seed.as_str()).or_default().insert(target);
    }

    let mut shared_degree: HashMap<&str, u32> = HashMap::new();
    for (i, a) in seeds.iter().enumerate() {
        let Some(refs_a) = refs_by_seed.get(a.as_str()).filter(|r| !r.is_empty()) else {
            continue;
        };

        for b in &seeds[i + 1..] {
            let Some(refs_b) = refs_by_seed.get(b.as_str()).filter(|r| !r.is_empty()) else {
                continue;
            };

            let shared = refs_a.iter().filter(|r| refs_b.contains(*r)).count();
            if shared == 0 || shared < options.min_shared {
                continue;
            }

            let weight = shared as u32;
            if graph.add_link(GraphLink {
                source: a.clone(),
                target: b.clone(),
                kind: LinkKind::Shared,
                weight: Some(weight),
            }) {
                *shared_degree.entry(a.as_str()).or_default() += weight;
                *shared_degree.entry(b.as_str()).or_default() += weight;
            }
        }
    }

    let mut graph = graph.finish(|n| {
        shared_node_size(n.degree_in, shared_degree.get(n.id.as_str()).copied().unwrap_or(0))
    });
    for node in &mut graph.nodes {
        node.shared_degree = Some(shared_degree.get(node.id.as_str()).copied().unwrap_or(0));
    }

    if let Some(max) = options.max_nodes {
        if graph.nodes.len() > max {
            // Stable: equal sizes keep seed order
            graph.nodes.sort_by(|a, b| b.size.cmp(&a.size));
            graph.nodes.truncate(max);

            let kept: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
            graph
                .links
                .retain(|l| kept.contains(l.source.as_str()) && kept.contains(l.target.as_str()));
        }
    }

    debug!(
        seeds = seeds.len(),
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        min_shared = options.min_shared,
        "Shared citation graph assembled"
    );
    metrics::record_graph_build(
        "shared",
        started.elapsed().as_secs_f64(),
        graph.nodes.len(),
        graph.links.len(),
    );

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<CitationEdge> {
        pairs.iter().map(|(s, t)| CitationEdge::new(*s, *t)).collect()
    }

    fn shared_link<'a>(graph: &'a Graph, a: &str, b: &str) -> Option<&'a GraphLink> {
        graph.links.iter().find(|l| {
            l.kind == LinkKind::Shared
                && ((l.source == a && l.target == b) || (l.source == b && l.target == a))
        })
    }

    #[test]
    fn test_weighted_shared_links() {
        let graph = build_shared_graph(
            &seeds(&["a", "b", "c"]),
            &HashMap::new(),
            &edges(&[("a", "x"), ("a", "y"), ("b", "x"), ("b", "y"), ("c", "z")]),
            &SharedGraphOptions::default(),
        );

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(shared_link(&graph, "a", "b").unwrap().weight, Some(2));
        assert!(shared_link(&graph, "a", "c").is_none());

        let a = graph.node("a").unwrap();
        assert_eq!(a.shared_degree, Some(2));
        assert_eq!(a.size, shared_node_size(0, 2));
        assert_eq!(graph.node("c").unwrap().size, 10);
        assert!(graph.is_closed());
    }

    #[test]
    fn test_min_shared_threshold() {
        let options = SharedGraphOptions {
            min_shared: 2,
            max_nodes: None,
        };
        let graph = build_shared_graph(
            &seeds(&["a", "b"]),
            &HashMap::new(),
            &edges(&[("a", "x"), ("b", "x")]),
            &options,
        );
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_direct_links_between_seeds_only() {
        let mut titles = HashMap::new();
        titles.insert("https://doi.org/B".to_string(), "Paper B".to_string());

        let graph = build_shared_graph(
            &seeds(&["a", "b"]),
            &titles,
            &edges(&[("a", "b"), ("a", "outside")]),
            &SharedGraphOptions::default(),
        );

        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.node("outside").is_none());
        let b = graph.node("b").unwrap();
        assert_eq!(b.label, "Paper B");
        assert_eq!(b.degree_in, 1);
        assert_eq!(graph.links.iter().filter(|l| l.kind == LinkKind::Direct).count(), 1);
    }

    #[test]
    fn test_max_nodes_prunes_links() {
        let graph = build_shared_graph(
            &seeds(&["a", "b", "c"]),
            &HashMap::new(),
            &edges(&[("a", "x"), ("b", "x"), ("c", "x"), ("a", "b"), ("c", "b")]),
            &SharedGraphOptions {
                min_shared: 1,
                max_nodes: Some(2),
            },
        );

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].id, "b");
        assert!(graph.is_closed());
    }
}
