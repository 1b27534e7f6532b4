//! Edge-list CSV parsing
//!
//! `citation_edges.csv` comes in two shapes:
//! - an edge list whose header names a parent and a child column under
//!   one of several aliases (`source,target`, `parent_doi,child_doi`, ...)
//! - a wide adjacency list: first column is the parent, every further
//!   non-empty cell in the row is a child
//!
//! Both sides are DOI-normalized. Rows left with an empty side are
//! dropped silently; bibliographic exports are full of them.

use super::CitationEdge;
use citenet_common::doi::normalize_doi;
use citenet_common::errors::Result;
use citenet_common::source::load_text;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, warn};

/// Header aliases for the citing column
pub const PARENT_ALIASES: &[&str] = &["parent_doi", "source", "src", "seed_doi", "paper_doi", "from", "parent"];

/// Header aliases for the cited column
pub const CHILD_ALIASES: &[&str] = &[
    "child_doi",
    "target",
    "dst",
    "ref_doi",
    "cited_doi",
    "reference_doi",
    "to",
    "child",
];

/// Detected CSV shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLayout {
    /// Explicit parent and child columns
    EdgeList { parent: usize, child: usize },
    /// First column parent, remaining columns children
    Wide,
}

/// Detect the layout from the header row (case-insensitive)
pub fn detect_layout(headers: &StringRecord) -> EdgeLayout {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect();

    let parent = normalized.iter().position(|h| PARENT_ALIASES.contains(&h.as_str()));
    let child = normalized.iter().position(|h| CHILD_ALIASES.contains(&h.as_str()));

    match (parent, child) {
        (Some(parent), Some(child)) if parent != child => EdgeLayout::EdgeList { parent, child },
        _ => EdgeLayout::Wide,
    }
}

/// Parse edge CSV text into normalized edges
pub fn parse_edges(text: &str) -> Result<Vec<CitationEdge>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let layout = detect_layout(&headers);
    debug!(?layout, "Edge CSV layout detected");

    let mut edges = Vec::new();
    let mut dropped = 0usize;

    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable edge row");
                dropped += 1;
                continue;
            }
        };

        match layout {
            EdgeLayout::EdgeList { parent, child } => {
                let source = normalize_doi(row.get(parent).unwrap_or_default());
                let target = normalize_doi(row.get(child).unwrap_or_default());
                if source.is_empty() || target.is_empty() {
                    dropped += 1;
                    continue;
                }
                edges.push(CitationEdge { source, target });
            }
            EdgeLayout::Wide => {
                let source = normalize_doi(row.get(0).unwrap_or_default());
                if source.is_empty() {
                    dropped += 1;
                    continue;
                }
                for cell in row.iter().skip(1) {
                    let target = normalize_doi(cell);
                    if !target.is_empty() {
                        edges.push(CitationEdge {
                            source: source.clone(),
                            target,
                        });
                    }
                }
            }
        }
    }

    info!(edges = edges.len(), dropped, "Parsed citation edges");
    Ok(edges)
}

/// Load and parse the edge CSV from a path or URL.
///
/// A fetch failure surfaces as `ResourceUnavailable`; callers treat it as
/// "no graph data".
pub async fn load_edges(client: &reqwest::Client, location: &str) -> Result<Vec<CitationEdge>> {
    let text = load_text(client, location).await?;
    parse_edges(&text)
}
