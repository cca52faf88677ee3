//! Prometheus metrics for index rebuilds and searches.
//!
//! Metrics live in a crate-wide registry and are cheap to update from any
//! task. Call [`init_metrics`] once at startup to register them, and
//! [`gather_metrics`] to render the text exposition format.
//!
//! # Example
//! ```no_run
//! use course_search::metrics::{self, SEARCH_REQUESTS_TOTAL};
//!
//! metrics::init_metrics().unwrap();
//! SEARCH_REQUESTS_TOTAL.with_label_values(&["success"]).inc();
//! ```

use lazy_static::lazy_static;
use prometheus::{
    core::Collector, Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry,
};

const NAMESPACE: &str = "course_search";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Indexing Metrics
    // ============================================================================

    /// Total number of index rebuilds
    ///
    /// Labels: outcome (success, schema_failure, partial_write)
    pub static ref REBUILDS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("rebuilds_total", "Total number of class index rebuilds")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create REBUILDS_TOTAL metric");

    /// Class documents successfully written
    pub static ref DOCUMENTS_INDEXED_TOTAL: Counter = Counter::with_opts(
        Opts::new("documents_indexed_total", "Total number of class documents written")
            .namespace(NAMESPACE)
    ).expect("Failed to create DOCUMENTS_INDEXED_TOTAL metric");

    /// Sections dropped because no matching class existed
    pub static ref ORPHANED_SECTIONS_TOTAL: Counter = Counter::with_opts(
        Opts::new("orphaned_sections_total", "Total number of sections without a matching class")
            .namespace(NAMESPACE)
    ).expect("Failed to create ORPHANED_SECTIONS_TOTAL metric");

    // ============================================================================
    // Search Metrics
    // ============================================================================

    /// Total number of searches
    ///
    /// Labels: outcome (success, failure)
    pub static ref SEARCH_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("search_requests_total", "Total number of search requests")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create SEARCH_REQUESTS_TOTAL metric");

    /// End-to-end search duration in seconds
    pub static ref SEARCH_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("search_duration_seconds", "Search duration in seconds")
            .namespace(NAMESPACE)
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])
    ).expect("Failed to create SEARCH_DURATION_SECONDS metric");

    /// Filter entries dropped during validation
    ///
    /// Labels: filter
    pub static ref FILTERS_REJECTED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("filters_rejected_total", "Total number of rejected filter entries")
            .namespace(NAMESPACE),
        &["filter"]
    ).expect("Failed to create FILTERS_REJECTED_TOTAL metric");
}

fn register(collector: Box<dyn Collector>) -> Result<(), prometheus::Error> {
    match PROMETHEUS_REGISTRY.register(collector) {
        Err(prometheus::Error::AlreadyReg) => Ok(()),
        other => other,
    }
}

/// Register every metric with the global registry.
///
/// Safe to call more than once.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    register(Box::new(REBUILDS_TOTAL.clone()))?;
    register(Box::new(DOCUMENTS_INDEXED_TOTAL.clone()))?;
    register(Box::new(ORPHANED_SECTIONS_TOTAL.clone()))?;
    register(Box::new(SEARCH_REQUESTS_TOTAL.clone()))?;
    register(Box::new(SEARCH_DURATION_SECONDS.clone()))?;
    register(Box::new(FILTERS_REJECTED_TOTAL.clone()))?;

    tracing::debug!("Metrics registered");
    Ok(())
}

/// Render all registered metrics in Prometheus text format
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
