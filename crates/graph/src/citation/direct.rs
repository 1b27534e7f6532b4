//! Bookmark-seeded graph: direct references plus binary co-citation

use super::graph::GraphBuilder;
use super::{node_size, pair_key, CitationEdge, Graph, GraphLink, LinkKind};
use citenet_common::doi::normalize_doi;
use citenet_common::metrics;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::debug;

/// Inputs of the direct assembler
#[derive(Debug, Clone, Default)]
pub struct DirectGraphInput {
    /// Seed DOIs as stored on the papers (raw, unnormalized)
    pub seed_dois: Vec<String>,

    /// DOI -> title; keys may be raw or normalized
    pub titles_by_doi: HashMap<String, String>,

    /// DOI -> 1-based bookmark index; keys may be raw or normalized
    pub saved_index_by_doi: HashMap<String, usize>,
}

/// Build the direct + co-citation graph around the seed set.
///
/// Only edges whose source is a seed are considered. Two seeds get one
/// `cocite` link when they cite at least one common reference, however
/// many they share.
pub fn build_direct_graph(input: &DirectGraphInput, edges: &[CitationEdge]) -> Graph {
    let started = Instant::now();

    let titles: HashMap<String, String> = input
        .titles_by_doi
        .iter()
        .map(|(k, v)| (normalize_doi(k), v.trim().to_string()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect();
    let indices: HashMap<String, usize> = input
        .saved_index_by_doi
        .iter()
        .map(|(k, &v)| (normalize_doi(k), v))
        .collect();
    let label_for = |id: &str| titles.get(id).cloned().unwrap_or_else(|| id.to_string());

    // Ordered seed set
    let mut seen = HashSet::new();
    let seeds: Vec<String> = input
        .seed_dois
        .iter()
        .map(|d| normalize_doi(d))
        .filter(|d| !d.is_empty() && seen.insert(d.clone()))
        .collect();

    let mut graph = GraphBuilder::new();
    for id in &seeds {
        let node = graph.ensure_node(id, || label_for(id));
        node.is_saved = true;
        node.index = indices.get(id).copied();
    }

    // child -> seeds citing it, in discovery order
    let mut child_to_parents: Vec<(String, Vec<String>)> = Vec::new();
    let mut child_pos: HashMap<String, usize> = HashMap::new();

    for edge in edges {
        let source = normalize_doi(&edge.source);
        let target = normalize_doi(&edge.target);
        if source.is_empty() || target.is_empty() || !seen.contains(&source) {
            continue;
        }

        graph.ensure_node(&target, || label_for(&target));
        graph.add_link(GraphLink::direct(source.as_str(), target.as_str()));

        let pos = *child_pos.entry(target.clone()).or_insert_with(|| {
            child_to_parents.push((target.clone(), Vec::new()));
            child_to_parents.len() - 1
        });
        let parents = &mut child_to_parents[pos].1;
        if !parents.contains(&source) {
            parents.push(source);
        }
    }

    let mut cocite_keys = HashSet::new();
    for (_, parents) in &child_to_parents {
        for (i, a) in parents.iter().enumerate() {
            for b in &parents[i + 1..] {
                if !cocite_keys.insert(pair_key(a, b)) {
                    continue;
                }
                graph.add_link(GraphLink {
                    source: a.clone(),
                    target: b.clone(),
                    kind: LinkKind::Cocite,
                    weight: None,
                });
            }
        }
    }

    let graph = graph.finish(|n| node_size(n.degree_in, n.is_saved));

    debug!(
        seeds = seeds.len(),
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        "Direct citation graph assembled"
    );
    metrics::record_graph_build(
        "direct",
        started.elapsed().as_secs_f64(),
        graph.nodes.len(),
        graph.links.len(),
    );

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(seeds: &[&str]) -> DirectGraphInput {
        DirectGraphInput {
            seed_dois: seeds.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<CitationEdge> {
        pairs.iter().map(|(s, t)| CitationEdge::new(*s, *t)).collect()
    }

    fn cocite_count(graph: &Graph) -> usize {
        graph.links.iter().filter(|l| l.kind == LinkKind::Cocite).count()
    }

    #[test]
    fn test_zero_seeds_is_empty() {
        let graph = build_direct_graph(&input(&[]), &edges(&[("a", "x")]));
        assert!(graph.is_empty());
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_isolated_seed() {
        let graph = build_direct_graph(&input(&["https://doi.org/10.1/A"]), &edges(&[("10.1/b", "10.1/x")]));

        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.links.is_empty());
        let node = &graph.nodes[0];
        assert_eq!(node.id, "10.1/a");
        assert_eq!(node.label, "10.1/a");
        assert!(node.is_saved);
        assert_eq!(node.degree_in, 0);
        assert_eq!(node.size, 20);
    }

    #[test]
    fn test_shared_children_give_one_cocite_link() {
        let graph = build_direct_graph(
            &input(&["a", "b"]),
            &edges(&[("a", "x"), ("a", "y"), ("b", "x"), ("b", "y")]),
        );

        assert_eq!(cocite_count(&graph), 1);
        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.node("x").unwrap().degree_in, 2);
        assert!(!graph.node("x").unwrap().is_saved);
        assert!(graph.is_closed());
    }

    #[test]
    fn test_non_seed_sources_ignored() {
        let graph = build_direct_graph(&input(&["a"]), &edges(&[("a", "x"), ("z", "a"), ("z", "x")]));

        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.node("z").is_none());
        assert_eq!(graph.node("a").unwrap().degree_in, 0);
        assert_eq!(graph.node("x").unwrap().degree_in, 1);
    }

    #[test]
    fn test_seed_citing_seed() {
        let graph = build_direct_graph(&input(&["a", "b"]), &edges(&[("a", "b"), ("a", "b")]));

        let b = graph.node("b").unwrap();
        assert!(b.is_saved);
        assert_eq!(b.degree_in, 1);
        assert_eq!(b.size, node_size(1, true));
        assert_eq!(graph.links.len(), 1);
    }

    #[test]
    fn test_three_seeds_pairwise() {
        let graph = build_direct_graph(
            &input(&["a", "b", "c"]),
            &edges(&[("a", "x"), ("b", "x"), ("c", "x"), ("a", "y"), ("c", "y")]),
        );

        assert_eq!(cocite_count(&graph), 3);
        let keys: HashSet<String> = graph
            .links
            .iter()
            .filter(|l| l.kind == LinkKind::Cocite)
            .map(|l| pair_key(&l.source, &l.target))
            .collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_labels_and_indices_use_normalized_keys() {
        let mut input = input(&["10.1/A"]);
        input
            .titles_by_doi
            .insert("https://doi.org/10.1/A".into(), "  Paper A ".into());
        input.titles_by_doi.insert("10.1/x".into(), "   ".into());
        input.saved_index_by_doi.insert("10.1/a".into(), 3);

        let graph = build_direct_graph(&input, &edges(&[("10.1/a", "10.1/x")]));
        let a = graph.node("10.1/a").unwrap();
        assert_eq!(a.label, "Paper A");
        assert_eq!(a.index, Some(3));
        assert_eq!(graph.node("10.1/x").unwrap().label, "10.1/x");
    }

    /// DOI from a small pool, sometimes behind a resolver prefix or upper-cased
    fn pooled_doi() -> impl Strategy<Value = String> {
        (0u8..8, 0u8..3).prop_map(|(i, form)| match form {
            0 => format!("10.1/p{}", i),
            1 => format!("https://doi.org/10.1/P{}", i),
            _ => format!(" 10.1/P{} ", i),
        })
    }

    proptest! {
        #[test]
        fn prop_direct_graph_is_well_formed(
            seeds in prop::collection::vec(pooled_doi(), 0..6),
            pairs in prop::collection::vec((pooled_doi(), pooled_doi()), 0..40),
        ) {
            let edge_list: Vec<CitationEdge> = pairs
                .iter()
                .map(|(s, t)| CitationEdge::new(s.as_str(), t.as_str()))
                .collect();
            let graph = build_direct_graph(
                &DirectGraphInput { seed_dois: seeds.clone(), ..Default::default() },
                &edge_list,
            );

            prop_assert!(graph.is_closed());

            let mut cocite = HashSet::new();
            let mut direct = HashSet::new();
            for link in &graph.links {
                match link.kind {
                    LinkKind::Cocite => {
                        prop_assert_ne!(&link.source, &link.target);
                        prop_assert!(cocite.insert(pair_key(&link.source, &link.target)));
                    }
                    LinkKind::Direct => {
                        prop_assert!(direct.insert((link.source.clone(), link.target.clone())));
                    }
                    LinkKind::Shared => prop_assert!(false, "shared link in direct graph"),
                }
            }

            for node in &graph.nodes {
                let incoming = graph
                    .links
                    .iter()
                    .filter(|l| l.kind == LinkKind::Direct && l.target == node.id)
                    .count();
                prop_assert_eq!(node.degree_in, incoming);
                prop_assert!(node.size >= crate::citation::MIN_NODE_SIZE);
            }

            for seed in &seeds {
                let id = normalize_doi(seed);
                prop_assert!(graph.node(&id).map_or(false, |n| n.is_saved));
            }
        }
    }
}
