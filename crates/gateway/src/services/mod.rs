//! Stateful services behind the handlers

pub mod dataset;
pub mod saved_graph;

pub use dataset::DataSet;
pub use saved_graph::SavedGraphService;
