//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all citenet metrics
pub const METRICS_PREFIX: &str = "citenet";

/// Buckets for graph build latency (BFS builds are slow by design)
pub const BUILD_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.010,  // 10ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.500,  // 500ms
    1.000,  // 1s
    5.000,  // 5s
    15.00,  // 15s
    60.00,  // 1min
    300.0,  // 5min
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_graph_builds_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of citation graph builds"
    );

    describe_histogram!(
        format!("{}_graph_build_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Citation graph build latency in seconds"
    );

    describe_counter!(
        format!("{}_crossref_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total Crossref work lookups"
    );

    describe_counter!(
        format!("{}_layout_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Layout cache hits"
    );

    describe_counter!(
        format!("{}_layout_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Layout cache misses"
    );

    describe_counter!(
        format!("{}_bookmark_toggles_total", METRICS_PREFIX),
        Unit::Count,
        "Bookmark toggles"
    );

    tracing::info!("Metrics registered");
}

/// Record a finished graph build
pub fn record_graph_build(variant: &str, duration_secs: f64, nodes: usize, links: usize) {
    counter!(
        format!("{}_graph_builds_total", METRICS_PREFIX),
        "variant" => variant.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_graph_build_duration_seconds", METRICS_PREFIX),
        "variant" => variant.to_string()
    )
    .record(duration_secs);

    tracing::debug!(variant, nodes, links, duration_secs, "Graph built");
}

/// Record one Crossref lookup
pub fn record_crossref_fetch(success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_crossref_requests_total", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a layout cache lookup
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_layout_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_layout_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

/// Record a bookmark toggle
pub fn record_bookmark_toggle(added: bool) {
    let action = if added { "add" } else { "remove" };

    counter!(
        format!("{}_bookmark_toggles_total", METRICS_PREFIX),
        "action" => action.to_string()
    )
    .increment(1);
}
