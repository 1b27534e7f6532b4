//! Configuration management for citenet
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Locations of the CSV resources
    #[serde(default)]
    pub data: DataConfig,

    /// Crossref (remote bibliographic API) configuration
    #[serde(default)]
    pub crossref: CrossrefConfig,

    /// Graph assembly and layout configuration
    #[serde(default)]
    pub graph: GraphConfig,

    /// Persisted state configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// Paper metadata CSV (path or http(s) URL)
    #[serde(default = "default_papers_csv")]
    pub papers_csv: String,

    /// Citation edge CSV (path or http(s) URL)
    #[serde(default = "default_edges_csv")]
    pub citation_edges_csv: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrossrefConfig {
    /// API base URL
    #[serde(default = "default_crossref_base")]
    pub base_url: String,

    /// Contact address for Crossref's polite pool
    pub mailto: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_crossref_timeout")]
    pub timeout_secs: u64,

    /// Delay between consecutive requests in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Number of reference hops explored from the seeds
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// References followed per fetched work
    #[serde(default = "default_max_refs")]
    pub max_refs_per_node: usize,

    /// Optional global node cap
    pub max_total_nodes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphConfig {
    /// Minimum shared references for a `shared` edge
    #[serde(default = "default_min_shared")]
    pub min_shared: usize,

    /// Optional cap on nodes kept in the shared view
    pub max_nodes: Option<usize>,

    /// Layout canvas width
    #[serde(default = "default_layout_width")]
    pub layout_width: f64,

    /// Layout canvas height
    #[serde(default = "default_layout_height")]
    pub layout_height: f64,

    /// Simulation ticks per layout
    #[serde(default = "default_layout_iterations")]
    pub layout_iterations: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Backend: file, memory, redis
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Directory for the file backend
    #[serde(default = "default_storage_dir")]
    pub dir: String,

    /// Redis URL for the redis backend
    pub redis_url: Option<String>,

    /// Key prefix for namespacing
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_papers_csv() -> String { "public/papers_enriched.csv".to_string() }
fn default_edges_csv() -> String { "public/citation_edges.csv".to_string() }
fn default_crossref_base() -> String { "https://api.crossref.org".to_string() }
fn default_crossref_timeout() -> u64 { 30 }
fn default_delay_ms() -> u64 { 120 }
fn default_max_depth() -> usize { 3 }
fn default_max_refs() -> usize { 30 }
fn default_min_shared() -> usize { 1 }
fn default_layout_width() -> f64 { 1200.0 }
fn default_layout_height() -> f64 { 600.0 }
fn default_layout_iterations() -> usize { 260 }
fn default_storage_backend() -> String { "file".to_string() }
fn default_storage_dir() -> String { ".citenet".to_string() }
fn default_key_prefix() -> String { "citenet".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "citenet".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            papers_csv: default_papers_csv(),
            citation_edges_csv: default_edges_csv(),
        }
    }
}

impl Default for CrossrefConfig {
    fn default() -> Self {
        Self {
            base_url: default_crossref_base(),
            mailto: None,
            timeout_secs: default_crossref_timeout(),
            delay_ms: default_delay_ms(),
            max_depth: default_max_depth(),
            max_refs_per_node: default_max_refs(),
            max_total_nodes: None,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_shared: default_min_shared(),
            max_nodes: None,
            layout_width: default_layout_width(),
            layout_height: default_layout_height(),
            layout_iterations: default_layout_iterations(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            dir: default_storage_dir(),
            redis_url: None,
            key_prefix: default_key_prefix(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__CROSSREF__DELAY_MS=250
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}
