//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the Reelhound server:
//! - HTTP request metrics (latency, counts)
//! - Session working sets (collected dynamically)
//! - Engine metrics registered from `reelhound_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

use reelhound_core::ResultCache;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelhound_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 15.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelhound_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reelhound_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Session Metrics (collected dynamically)
// =============================================================================

/// Sessions holding a working set.
pub static SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("reelhound_sessions_active", "Number of known search sessions").unwrap()
});

/// Entries in the result cache, expired ones included until reaped.
pub static CACHE_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("reelhound_cache_entries", "Number of result cache entries").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Sessions and cache
    registry.register(Box::new(SESSIONS_ACTIVE.clone())).unwrap();
    registry.register(Box::new(CACHE_ENTRIES.clone())).unwrap();

    // Core metrics (providers, cache lookups, aggregation, cascade)
    for metric in reelhound_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Update gauges from current application state before encoding.
pub async fn collect_dynamic_metrics(state: &AppState) {
    SESSIONS_ACTIVE.set(state.sessions().read().await.len() as i64);
    CACHE_ENTRIES.set(state.engine().cache().len().await as i64);
}

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("Invalid regex pattern defined in code")
});

static NUMERIC_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+(/|$)").expect("Invalid regex pattern defined in code"));

/// Normalize a path for metric labels (replace session ids and indexes).
pub fn normalize_path(path: &str) -> String {
    let result = UUID.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{index}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_session() {
        let path = "/api/v1/sessions/550e8400-e29b-41d4-a716-446655440000/titles";
        assert_eq!(normalize_path(path), "/api/v1/sessions/{id}/titles");
    }

    #[test]
    fn test_normalize_path_resolve() {
        let path = "/api/v1/sessions/550e8400-e29b-41d4-a716-446655440000/titles/3/resolve";
        assert_eq!(
            normalize_path(path),
            "/api/v1/sessions/{id}/titles/{index}/resolve"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("reelhound_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        reelhound_core::metrics::SEARCHES
            .with_label_values(&["found"])
            .inc();
        reelhound_core::metrics::CASCADE_OUTCOMES
            .with_label_values(&["exhausted"])
            .inc();
        SESSIONS_ACTIVE.set(0);

        let output = encode_metrics();

        assert!(output.contains("reelhound_searches_total"));
        assert!(output.contains("reelhound_cascade_outcomes_total"));
        assert!(output.contains("reelhound_sessions_active"));
    }
}
