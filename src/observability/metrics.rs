//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lounge_sessions_total` (counter): sessions started
//! - `lounge_sessions_active` (gauge): sessions currently running
//! - `lounge_session_events_total` (counter): events applied, by kind
//! - `lounge_refresh_total` (counter): refresh ticks, by outcome
//! - `lounge_content_loads_total` (counter): viewer loads, by outcome

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_session_opened() {
    metrics::counter!("lounge_sessions_total").increment(1);
    metrics::gauge!("lounge_sessions_active").increment(1.0);
}

pub fn record_session_closed() {
    metrics::gauge!("lounge_sessions_active").decrement(1.0);
}

pub fn record_session_event(kind: &'static str) {
    metrics::counter!("lounge_session_events_total", "kind" => kind).increment(1);
}

pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("lounge_refresh_total", "outcome" => outcome).increment(1);
}

pub fn record_content_load(outcome: &'static str) {
    metrics::counter!("lounge_content_loads_total", "outcome" => outcome).increment(1);
}
