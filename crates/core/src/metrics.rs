//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Provider calls (counts by outcome, latency)
//! - Result cache lookups
//! - Aggregation runs and the fallback cascade

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Provider Metrics
// =============================================================================

/// Provider calls by provider, operation and outcome.
pub static PROVIDER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelhound_provider_requests_total",
            "Total provider calls",
        ),
        &["provider", "operation", "status"], // "success" or an error kind
    )
    .unwrap()
});

/// Provider call duration in seconds.
pub static PROVIDER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelhound_provider_duration_seconds",
            "Duration of provider calls",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0]),
        &["provider", "operation"],
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by operation and result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelhound_cache_lookups_total", "Total result cache lookups"),
        &["operation", "result"], // "search"/"resolve", "hit"/"miss"
    )
    .unwrap()
});

// =============================================================================
// Aggregation Metrics
// =============================================================================

/// Aggregation runs by outcome.
pub static SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelhound_searches_total", "Total aggregation runs"),
        &["outcome"], // "found", "no_results"
    )
    .unwrap()
});

/// Titles returned per aggregation run.
pub static TITLES_PER_SEARCH: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelhound_titles_per_search",
            "Number of merged titles per aggregation run",
        )
        .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Cascade Metrics
// =============================================================================

/// Cascade runs by outcome.
pub static CASCADE_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reelhound_cascade_outcomes_total", "Total cascade runs"),
        &["outcome"], // "already_resolved", "resolved", "exhausted"
    )
    .unwrap()
});

/// Providers probed per cascade run.
pub static CASCADE_PROBES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reelhound_cascade_probes",
            "Number of fallback providers probed per cascade run",
        )
        .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 10.0]),
        &[],
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Providers
        Box::new(PROVIDER_REQUESTS.clone()),
        Box::new(PROVIDER_DURATION.clone()),
        // Cache
        Box::new(CACHE_LOOKUPS.clone()),
        // Aggregation
        Box::new(SEARCHES.clone()),
        Box::new(TITLES_PER_SEARCH.clone()),
        // Cascade
        Box::new(CASCADE_OUTCOMES.clone()),
        Box::new(CASCADE_PROBES.clone()),
    ]
}
