//! Graph layout
//!
//! Positions are computed by a small force simulation and cached under a
//! content signature, so an unchanged node/link set is never laid out
//! twice.

mod cache;
mod force;

pub use cache::{CachedLayout, LayoutCache, LayoutOutcome};
pub use force::ForceLayout;

use crate::citation::Graph;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Position of one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Node id -> position
pub type Positions = BTreeMap<String, Position>;

/// Content signature of a graph.
///
/// SHA-256 over the sorted node ids and the sorted `source->target:kind`
/// link list. Independent of node and link order.
pub fn graph_signature(graph: &Graph) -> String {
    let mut node_ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    node_ids.sort_unstable();

    let mut links: Vec<String> = graph
        .links
        .iter()
        .map(|l| format!("{}->{}:{}", l.source, l.target, l.kind.as_str()))
        .collect();
    links.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(node_ids.join("|").as_bytes());
    hasher.update(b"__");
    hasher.update(links.join("|").as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether `positions` covers every node of `graph`
pub fn covers(positions: &Positions, graph: &Graph) -> bool {
    graph.nodes.iter().all(|n| positions.contains_key(&n.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::{GraphLink, GraphNode, LinkKind};

    fn graph(nodes: &[&str], links: &[(&str, &str, LinkKind)]) -> Graph {
        Graph {
            nodes: nodes.iter().map(|id| GraphNode::new(*id, *id)).collect(),
            links: links
                .iter()
                .map(|(s, t, kind)| GraphLink {
                    source: s.to_string(),
                    target: t.to_string(),
                    kind: *kind,
                    weight: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_signature_ignores_order() {
        let a = graph(
            &["a", "b", "c"],
            &[("a", "b", LinkKind::Direct), ("a", "c", LinkKind::Direct)],
        );
        let b = graph(
            &["c", "a", "b"],
            &[("a", "c", LinkKind::Direct), ("a", "b", LinkKind::Direct)],
        );
        assert_eq!(graph_signature(&a), graph_signature(&b));
        assert_eq!(graph_signature(&a).len(), 64);
    }

    #[test]
    fn test_signature_changes_with_one_link() {
        let a = graph(&["a", "b"], &[("a", "b", LinkKind::Direct)]);
        let reversed = graph(&["a", "b"], &[("b", "a", LinkKind::Direct)]);
        let kind = graph(&["a", "b"], &[("a", "b", LinkKind::Cocite)]);

        assert_ne!(graph_signature(&a), graph_signature(&reversed));
        assert_ne!(graph_signature(&a), graph_signature(&kind));
    }

    #[test]
    fn test_covers() {
        let g = graph(&["a", "b"], &[]);
        let mut positions = Positions::new();
        positions.insert("a".into(), Position { x: 0.0, y: 0.0 });
        assert!(!covers(&positions, &g));

        positions.insert("b".into(), Position { x: 1.0, y: 1.0 });
        assert!(covers(&positions, &g));
    }
}
