//! Citation graph construction
//!
//! Three builders produce the same node/link shape:
//! - [`build_direct_graph`]: bookmarked papers, their references, and
//!   binary co-citation links between bookmarks
//! - [`build_shared_graph`]: corpus papers linked by the number of
//!   references they share
//! - [`CrossrefGraphBuilder`]: breadth-first expansion against Crossref
//!
//! Node identity is always the normalized DOI.

mod bfs;
mod crossref;
mod direct;
mod edges;
mod graph;
mod shared;

pub use bfs::{BfsOptions, CrossrefGraphBuilder};
pub use crossref::{CrossrefClient, CrossrefWork, WorkSource};
pub use direct::{build_direct_graph, DirectGraphInput};
pub use edges::{detect_layout, load_edges, parse_edges, EdgeLayout};
pub use graph::GraphBuilder;
pub use shared::{build_shared_graph, SharedGraphOptions};

use serde::{Deserialize, Serialize};

/// One `source -> target` reference pair from the edge CSV
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CitationEdge {
    /// Citing paper DOI (normalized)
    pub source: String,

    /// Cited paper DOI (normalized)
    pub target: String,
}

impl CitationEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Kind of link in a built graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Paper -> one of its references
    Direct,
    /// Two bookmarks citing at least one common reference
    Cocite,
    /// Two corpus papers sharing `weight` references
    Shared,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Direct => "direct",
            LinkKind::Cocite => "cocite",
            LinkKind::Shared => "shared",
        }
    }
}

/// Node of a built graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Normalized DOI
    pub id: String,

    /// Best-known title, or the DOI when no title is known
    pub label: String,

    /// Render radius
    pub size: u32,

    /// Incoming `direct` links
    pub degree_in: usize,

    /// Whether the node is a bookmarked seed
    #[serde(default)]
    pub is_saved: bool,

    /// 1-based bookmark index of a saved node
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    /// Accumulated `shared` link weight (shared view only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_degree: Option<u32>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            size: MIN_NODE_SIZE,
            degree_in: 0,
            is_saved: false,
            index: None,
            shared_degree: None,
        }
    }
}

/// Link of a built graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub kind: LinkKind,

    /// Shared-reference count for `shared` links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl GraphLink {
    pub fn direct(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: LinkKind::Direct,
            weight: None,
        }
    }
}

/// A built graph. Consumers must rely on the node and link sets, not on
/// link order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Whether every link endpoint is a node of the graph
    pub fn is_closed(&self) -> bool {
        let ids: std::collections::HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.links
            .iter()
            .all(|l| ids.contains(l.source.as_str()) && ids.contains(l.target.as_str()))
    }
}

/// Floor for direct and BFS node sizes
pub const MIN_NODE_SIZE: u32 = 10;

/// Flat size boost for bookmarked seeds
pub const SAVED_BOOST: f64 = 12.0;

/// Floor for shared-view node sizes
pub const MIN_SHARED_SIZE: u32 = 8;

/// Size from in-degree: square-root scaling keeps hubs from dominating
pub fn node_size(degree_in: usize, is_saved: bool) -> u32 {
    let boost = if is_saved { SAVED_BOOST } else { 0.0 };
    let raw = (8.0 + (degree_in as f64).sqrt() * 6.0 + boost).round();
    (raw as u32).max(MIN_NODE_SIZE)
}

/// Size for the shared view from direct in-degree and shared weight
pub fn shared_node_size(in_direct: usize, shared_degree: u32) -> u32 {
    let score = in_direct as f64 * 2.0 + (shared_degree as f64).sqrt();
    let raw = (10.0 + score * 4.0).round();
    (raw as u32).max(MIN_SHARED_SIZE)
}

/// Canonical key for an unordered pair
pub(crate) fn pair_key(a: &str, b: &str) -> String {
    if a < b {
        format!("{}|{}", a, b)
    } else {
        format!("{}|{}", b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_size() {
        assert_eq!(node_size(0, false), 10);
        assert_eq!(node_size(0, true), 20);
        assert_eq!(node_size(4, false), 20);
        assert_eq!(node_size(1, true), 26);
    }

    #[test]
    fn test_shared_node_size() {
        assert_eq!(shared_node_size(0, 0), 10);
        assert_eq!(shared_node_size(1, 4), 26);
    }

    #[test]
    fn test_pair_key_is_symmetric() {
        assert_eq!(pair_key("a", "b"), pair_key("b", "a"));
        assert_eq!(pair_key("x", "y"), "x|y");
    }

    #[test]
    fn test_link_kind_serializes_lowercase() {
        let json = serde_json::to_string(&LinkKind::Cocite).unwrap();
        assert_eq!(json, "\"cocite\"");
    }
}
