//! citenet Graph Library
//!
//! Citation graph construction over a seed set of DOIs:
//! - Edge-list CSV parsing (edge list or wide adjacency)
//! - Direct + co-citation graph of bookmarked papers
//! - Shared-reference graph of the corpus
//! - Breadth-first expansion against Crossref
//! - Force layout with a content-addressed cache

pub mod citation;
pub mod gate;
pub mod layout;

pub use citation::{
    build_direct_graph, build_shared_graph, load_edges, parse_edges, BfsOptions, CitationEdge,
    CrossrefClient, CrossrefGraphBuilder, DirectGraphInput, Graph, GraphLink, GraphNode, LinkKind,
    SharedGraphOptions, WorkSource,
};
pub use gate::{BuildGate, BuildTicket};
pub use layout::{graph_signature, ForceLayout, LayoutCache, LayoutOutcome, Positions};
