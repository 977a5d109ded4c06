//! Metrics collection and exposition.
//!
//! # Metrics
//! - `failover_peer_transitions_total` (counter): up/down transitions by pool, state
//! - `failover_peers_up` (gauge): peers currently up, by pool
//! - `failover_exhausted_total` (counter): connect calls that ran out of peers

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_peer_transition(pool: &str, state: &'static str) {
    metrics::counter!("failover_peer_transitions_total", "pool" => pool.to_string(), "state" => state)
        .increment(1);
}

pub fn record_peers_up(pool: &str, up: usize) {
    metrics::gauge!("failover_peers_up", "pool" => pool.to_string()).set(up as f64);
}

pub fn record_exhausted(pool: &str) {
    metrics::counter!("failover_exhausted_total", "pool" => pool.to_string()).increment(1);
}
