//! citenet Common Library
//!
//! Shared code for the citenet crates including:
//! - Error types and handling
//! - Configuration management
//! - DOI normalization
//! - Paper corpus loading from CSV
//! - Persisted state stores and the bookmark set
//! - Metrics and observability

pub mod bookmarks;
pub mod config;
pub mod doi;
pub mod errors;
pub mod metrics;
pub mod papers;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use bookmarks::BookmarkStore;
pub use config::AppConfig;
pub use doi::normalize_doi;
pub use errors::{AppError, Result};
pub use papers::{PaperCorpus, PaperRecord};
pub use store::StateStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Storage key holding the JSON array of bookmarked paper ids
pub const BOOKMARKS_KEY: &str = "bookmarks:v1";

/// Storage key holding the cached force-layout solution
pub const LAYOUT_CACHE_KEY: &str = "savedNet:layout:v1";
