//! Prometheus metrics for the edge daemon
//!
//! Diagnostic only; nothing here feeds back into the loop.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_int_counter, CounterVec,
    Encoder, Gauge, Histogram, IntCounter, TextEncoder,
};

lazy_static! {
    /// Counter: cycles by outcome
    pub static ref CYCLES: CounterVec = register_counter_vec!(
        "edge_vertex_cycles_total",
        "Total aggregation cycles by status",
        &["status"]
    )
    .expect("Failed to create cycles metric");

    /// Counter: failed edge fetches by edge
    pub static ref EDGE_ERRORS: CounterVec = register_counter_vec!(
        "edge_vertex_edge_errors_total",
        "Failed edge queries by edge address",
        &["edge"]
    )
    .expect("Failed to create edge_errors metric");

    /// Counter: items selected for publishing
    pub static ref ITEMS_SELECTED: IntCounter = register_int_counter!(
        "edge_vertex_items_selected_total",
        "Novel ready items selected for publishing"
    )
    .expect("Failed to create items_selected metric");

    /// Counter: DDM publish results per item
    pub static ref PUBLISHED: CounterVec = register_counter_vec!(
        "edge_vertex_published_total",
        "Items reported by DDM as accepted or rejected",
        &["result"]
    )
    .expect("Failed to create published metric");

    /// Gauge: size of the seen set
    pub static ref SEEN_IDS: Gauge = register_gauge!(
        "edge_vertex_seen_ids",
        "Content identifiers selected since startup"
    )
    .expect("Failed to create seen_ids metric");

    /// Histogram: cycle duration (seconds)
    pub static ref CYCLE_DURATION: Histogram = register_histogram!(
        "edge_vertex_cycle_duration_seconds",
        "Duration of aggregate and publish cycles",
        vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]
    )
    .expect("Failed to create cycle_duration metric");

    /// Gauge: daemon health status (1 = running, 0 = stopped)
    pub static ref HEALTH_STATUS: Gauge = register_gauge!(
        "edge_vertex_health_status",
        "Daemon health status (1 = running, 0 = stopped)"
    )
    .expect("Failed to create health_status metric");
}

/// Record a finished cycle
pub fn record_cycle(status: &str, duration_secs: f64) {
    CYCLES.with_label_values(&[status]).inc();
    CYCLE_DURATION.observe(duration_secs);
}

/// Record a failed edge query
pub fn record_edge_error(edge: &str) {
    EDGE_ERRORS.with_label_values(&[edge]).inc();
}

/// Record items selected in a cycle
pub fn record_selected(count: usize) {
    ITEMS_SELECTED.inc_by(count as u64);
}

/// Record DDM's verdict on a batch
pub fn record_published(accepted: usize, rejected: usize) {
    PUBLISHED
        .with_label_values(&["accepted"])
        .inc_by(accepted as f64);
    PUBLISHED
        .with_label_values(&["rejected"])
        .inc_by(rejected as f64);
}

/// Set the seen set size
pub fn set_seen_ids(count: usize) {
    SEEN_IDS.set(count as f64);
}

/// Set health status
pub fn set_health_status(healthy: bool) {
    HEALTH_STATUS.set(if healthy { 1.0 } else { 0.0 });
}

/// Encode all metrics as Prometheus text format
pub fn encode_metrics() -> crate::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| crate::EdgeVertexError::Other(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| crate::EdgeVertexError::Other(format!("Metrics are not UTF-8: {}", e)))
}
