//! Citation graph handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use validator::Validate;

use crate::AppState;
use citenet_common::errors::{AppError, Result};
use citenet_graph::{
    build_shared_graph, BfsOptions, Graph, GraphLink, GraphNode, Positions, SharedGraphOptions,
};

const EMPTY_SAVED_HINT: &str = "Bookmark papers to see how they cite each other";

/// Graph payload shared by all graph endpoints
#[derive(Serialize)]
pub struct GraphResponse {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub stats: GraphStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub link_count: usize,
    pub elapsed_ms: u64,
}

impl GraphResponse {
    fn new(graph: Graph, started: Instant) -> Self {
        Self {
            stats: GraphStats {
                node_count: graph.nodes.len(),
                link_count: graph.links.len(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            },
            nodes: graph.nodes,
            links: graph.links,
            hint: None,
        }
    }
}

#[derive(Serialize)]
pub struct SavedGraphResponse {
    pub generation: u64,
    pub built_at: String,
    #[serde(flatten)]
    pub graph: GraphResponse,
}

#[derive(Serialize)]
pub struct LayoutResponse {
    pub generation: u64,
    pub signature: String,
    pub reused: bool,
    pub positions: Positions,
}

/// Shared-reference graph request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SharedGraphRequest {
    #[validate(range(min = 1))]
    pub min_shared: Option<usize>,

    #[validate(range(min = 1, max = 5000))]
    pub max_nodes: Option<usize>,
}

/// Crossref expansion request
#[derive(Debug, Deserialize, Validate)]
pub struct CrossrefGraphRequest {
    #[validate(length(min = 1, max = 100))]
    pub seed_dois: Vec<String>,

    #[validate(range(max = 5))]
    pub max_depth: Option<usize>,

    #[validate(range(min = 1, max = 200))]
    pub max_refs_per_node: Option<usize>,

    #[validate(range(min = 1, max = 10000))]
    pub max_total_nodes: Option<usize>,
}

fn validation_error(e: validator::ValidationErrors) -> AppError {
    let field = e.field_errors().keys().next().map(|k| k.to_string());
    AppError::Validation {
        message: e.to_string(),
        field,
    }
}

/// Direct + co-citation graph of the bookmarked papers
pub async fn saved_graph(State(state): State<AppState>) -> Result<Json<SavedGraphResponse>> {
    let started = Instant::now();
    let snapshot = state.saved_graph.current().await?;

    // No bookmarked paper with a DOI means no seeds, whatever the bookmark count
    let mut graph = GraphResponse::new(snapshot.graph.as_ref().clone(), started);
    if graph.nodes.is_empty() {
        graph.hint = Some(EMPTY_SAVED_HINT.to_string());
    }

    Ok(Json(SavedGraphResponse {
        generation: snapshot.generation,
        built_at: snapshot.built_at.to_rfc3339(),
        graph,
    }))
}

/// Layout of the saved-papers graph
pub async fn saved_layout(State(state): State<AppState>) -> Result<Json<LayoutResponse>> {
    let (snapshot, outcome) = state.saved_graph.layout().await?;

    Ok(Json(LayoutResponse {
        generation: snapshot.generation,
        signature: outcome.signature,
        reused: outcome.reused,
        positions: outcome.positions,
    }))
}

/// Shared-reference graph over the whole corpus
pub async fn shared_graph(
    State(state): State<AppState>,
    body: Option<Json<SharedGraphRequest>>,
) -> Result<Json<GraphResponse>> {
    let started = Instant::now();
    let request = body.map(|Json(r)| r).unwrap_or_default();
    request.validate().map_err(validation_error)?;

    let options = SharedGraphOptions {
        min_shared: request.min_shared.unwrap_or(state.config.graph.min_shared),
        max_nodes: request.max_nodes.or(state.config.graph.max_nodes),
    };

    let corpus = state.data.papers().await?;
    let edges = state.data.edges().await?;
    let graph = build_shared_graph(&corpus.dois(), &corpus.titles_by_doi(), &edges, &options);

    Ok(Json(GraphResponse::new(graph, started)))
}

/// Breadth-first graph from Crossref; a newer request supersedes this one
pub async fn crossref_graph(
    State(state): State<AppState>,
    Json(request): Json<CrossrefGraphRequest>,
) -> Result<Json<GraphResponse>> {
    let started = Instant::now();
    request.validate().map_err(validation_error)?;

    let defaults = state.crossref.options();
    let options = BfsOptions {
        max_depth: request.max_depth.unwrap_or(defaults.max_depth),
        max_refs_per_node: request.max_refs_per_node.unwrap_or(defaults.max_refs_per_node),
        max_total_nodes: request.max_total_nodes.or(defaults.max_total_nodes),
        delay: defaults.delay,
    };

    // Corpus titles win over Crossref titles when the corpus is available
    let titles = match state.data.papers().await {
        Ok(corpus) => corpus.titles_by_doi(),
        Err(e) => {
            tracing::debug!(error = %e, "Corpus unavailable, using Crossref titles only");
            HashMap::new()
        }
    };

    let ticket = state.crossref_gate.begin();
    tracing::info!(
        generation = ticket.generation(),
        seeds = request.seed_dois.len(),
        max_depth = options.max_depth,
        "Crossref graph build started"
    );

    let graph = state
        .crossref
        .with_options(options)
        .build(&request.seed_dois, &titles, Some(&ticket))
        .await?;

    Ok(Json(GraphResponse::new(graph, started)))
}
