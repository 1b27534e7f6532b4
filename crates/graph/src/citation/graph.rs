//! Graph accumulator shared by the builders
//!
//! Keeps nodes in creation order, refuses links whose endpoints are not
//! nodes yet, and collapses duplicate links.

use super::{pair_key, Graph, GraphLink, GraphNode, LinkKind};
use std::collections::{HashMap, HashSet};

/// In-progress graph
#[derive(Debug, Default)]
pub struct GraphBuilder {
    /// Nodes in creation order
    nodes: Vec<GraphNode>,

    /// Node id -> position in `nodes`
    index: HashMap<String, usize>,

    /// Links in discovery order
    links: Vec<GraphLink>,

    /// Canonical keys of recorded links
    link_keys: HashSet<String>,

    /// Reverse adjacency over `direct` links: target -> sources
    incoming: HashMap<String, Vec<String>>,
}

impl GraphBuilder {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a node. `label` is only evaluated on creation.
    pub fn ensure_node(&mut self, id: &str, label: impl FnOnce() -> String) -> &mut GraphNode {
        let pos = match self.index.get(id) {
            Some(&pos) => pos,
            None => {
                let pos = self.nodes.len();
                self.nodes.push(GraphNode::new(id, label()));
                self.index.insert(id.to_string(), pos);
                pos
            }
        };
        &mut self.nodes[pos]
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        let pos = *self.index.get(id)?;
        Some(&mut self.nodes[pos])
    }

    /// Record a link. Returns false when it is a duplicate or when an
    /// endpoint is not a node.
    pub fn add_link(&mut self, link: GraphLink) -> bool {
        if !self.contains(&link.source) || !self.contains(&link.target) {
            return false;
        }

        let key = match link.kind {
            LinkKind::Direct => format!("{}>{}", link.source, link.target),
            LinkKind::Cocite | LinkKind::Shared => {
                format!("{}:{}", link.kind.as_str(), pair_key(&link.source, &link.target))
            }
        };
        if !self.link_keys.insert(key) {
            return false;
        }

        if link.kind == LinkKind::Direct {
            self.incoming
                .entry(link.target.clone())
                .or_default()
                .push(link.source.clone());
        }
        self.links.push(link);
        true
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Finalize: set in-degrees from `direct` links, then sizes
    pub fn finish(mut self, size: impl Fn(&GraphNode) -> u32) -> Graph {
        for node in &mut self.nodes {
            node.degree_in = self.incoming.get(&node.id).map(|v| v.len()).unwrap_or(0);
            node.size = size(node);
        }

        Graph {
            nodes: self.nodes,
            links: self.links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::node_size;

    #[test]
    fn test_graph_construction() {
        let mut graph = GraphBuilder::new();

        // A cites B, B cites C
        graph.ensure_node("a", || "A".into());
        graph.ensure_node("b", || "B".into());
        graph.ensure_node("c", || "C".into());
        assert!(graph.add_link(GraphLink::direct("a", "b")));
        assert!(graph.add_link(GraphLink::direct("b", "c")));

        assert_eq!(graph.node_count(), 3);

        let built = graph.finish(|n| node_size(n.degree_in, n.is_saved));
        assert_eq!(built.node("a").unwrap().degree_in, 0);
        assert_eq!(built.node("b").unwrap().degree_in, 1);
        assert_eq!(built.node("c").unwrap().degree_in, 1);
    }

    #[test]
    fn test_duplicate_and_dangling_links_rejected() {
        let mut graph = GraphBuilder::new();
        graph.ensure_node("a", || "a".into());
        graph.ensure_node("b", || "b".into());

        assert!(graph.add_link(GraphLink::direct("a", "b")));
        assert!(!graph.add_link(GraphLink::direct("a", "b")));
        assert!(!graph.add_link(GraphLink::direct("a", "missing")));

        let cocite = |s: &str, t: &str| GraphLink {
            source: s.into(),
            target: t.into(),
            kind: LinkKind::Cocite,
            weight: None,
        };
        assert!(graph.add_link(cocite("b", "a")));
        assert!(!graph.add_link(cocite("a", "b")));

        let built = graph.finish(|n| node_size(n.degree_in, n.is_saved));
        assert_eq!(built.links.len(), 2);
    }

    #[test]
    fn test_ensure_node_keeps_first_label() {
        let mut graph = GraphBuilder::new();
        graph.ensure_node("a", || "first".into());
        graph.ensure_node("a", || "second".into());

        let built = graph.finish(|n| node_size(n.degree_in, n.is_saved));
        assert_eq!(built.nodes.len(), 1);
        assert_eq!(built.nodes[0].label, "first");
    }

    #[test]
    fn test_finish_sets_degree_and_size() {
        let mut graph = GraphBuilder::new();
        for id in ["a", "b", "c", "d", "e"] {
            graph.ensure_node(id, || id.to_string());
        }
        for src in ["a", "b", "c", "d"] {
            graph.add_link(GraphLink::direct(src, "e"));
        }

        let built = graph.finish(|n| node_size(n.degree_in, n.is_saved));
        let hub = built.node("e").unwrap();
        assert_eq!(hub.degree_in, 4);
        assert_eq!(hub.size, 20);
        assert!(built.is_closed());
    }
}
