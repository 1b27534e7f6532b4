//! citenet API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Paper corpus browsing
//! - Bookmarks (write-through to the state store)
//! - Citation graph builds and cached layouts
//! - Rate limiting
//! - Observability (logging, metrics)

mod handlers;
mod middleware;
mod services;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use citenet_common::{
    config::AppConfig,
    metrics,
    source::http_client,
    store::{open_store, StateStore},
    BookmarkStore,
};
use citenet_graph::{
    BfsOptions, BuildGate, CrossrefClient, CrossrefGraphBuilder, ForceLayout, LayoutCache,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use services::{DataSet, SavedGraphService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn StateStore>,
    pub data: Arc<DataSet>,
    pub bookmarks: Arc<BookmarkStore>,
    pub saved_graph: Arc<SavedGraphService>,
    pub crossref: Arc<CrossrefGraphBuilder>,
    pub crossref_gate: BuildGate,
}

impl AppState {
    /// Wire the services over an opened store
    pub async fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn StateStore>,
        data: Arc<DataSet>,
        crossref: Arc<CrossrefGraphBuilder>,
    ) -> Self {
        let bookmarks = Arc::new(BookmarkStore::load(store.clone()).await);
        let saved_graph = Arc::new(SavedGraphService::new(
            data.clone(),
            bookmarks.clone(),
            LayoutCache::new(store.clone()),
            ForceLayout::from(&config.graph),
        ));

        Self {
            config,
            store,
            data,
            bookmarks,
            saved_graph,
            crossref,
            crossref_gate: BuildGate::new(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration; APP_CONFIG names an explicit file
    let config = match std::env::var("APP_CONFIG") {
        Ok(path) => AppConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        Err(_) => AppConfig::load().context("Failed to load configuration")?,
    };
    let config = Arc::new(config);

    // Initialize tracing
    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting citenet API Gateway v{}",
        citenet_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port > 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .set_buckets(metrics::BUILD_BUCKETS)
            .context("Invalid histogram buckets")?
            .add_global_label("service", config.observability.service_name.clone())
            .with_http_listener(metrics_addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }
    metrics::register_metrics();

    // Persisted state
    let store = open_store(&config.storage)
        .await
        .context("Failed to open state store")?;

    // CSV resources, loaded on first use
    let client = http_client(config.request_timeout(), &format!("citenet/{}", citenet_common::VERSION))?;
    let data = Arc::new(DataSet::new(client, &config.data));

    // Crossref BFS builder
    let crossref_client = CrossrefClient::new(&config.crossref)?;
    let crossref = Arc::new(CrossrefGraphBuilder::new(
        Arc::new(crossref_client),
        BfsOptions::from(&config.crossref),
    ));

    // Create app state
    let state = AppState::new(config.clone(), store, data, crossref).await;

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let mut api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Paper endpoints
        .route("/papers", get(handlers::papers::list_papers))
        .route("/papers/{id}", get(handlers::papers::get_paper))

        // Bookmark endpoints
        .route(
            "/bookmarks",
            get(handlers::bookmarks::list_bookmarks).delete(handlers::bookmarks::clear_bookmarks),
        )
        .route("/bookmarks/{id}/toggle", post(handlers::bookmarks::toggle_bookmark))

        // Graph endpoints
        .route("/graphs/saved", get(handlers::graphs::saved_graph))
        .route("/graphs/saved/layout", get(handlers::graphs::saved_layout))
        .route("/graphs/shared", post(handlers::graphs::shared_graph))
        .route("/graphs/crossref", post(handlers::graphs::crossref_graph));

    if state.config.rate_limit.enabled {
        let limiter = middleware::RateLimitState::from_config(&state.config.rate_limit);
        api_routes = api_routes.layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
