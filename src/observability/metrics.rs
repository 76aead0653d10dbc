//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_outcomes_total` (counter): gated calls by label, outcome
//! - `gate_wait_seconds` (histogram): time spent waiting on a gated call
//! - `gate_discarded_total` (counter): abandoned calls that settled after their deadline
//! - `onboarding_views_total` (counter): onboarding page decisions by view
//! - `upload_authorizations_total` (counter): upload authorizations by result
//! - `http_requests_total` (counter): requests by method, status
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exporter is optional and owns its own listener

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_gate_outcome(label: &str, outcome: &'static str, waited: Duration) {
    let label = label.to_string();
    metrics::counter!("gate_outcomes_total", "label" => label.clone(), "outcome" => outcome).increment(1);
    metrics::histogram!("gate_wait_seconds", "label" => label).record(waited.as_secs_f64());
}

pub fn record_gate_discarded(label: &str) {
    metrics::counter!("gate_discarded_total", "label" => label.to_string()).increment(1);
}

pub fn record_onboarding_view(view: &'static str) {
    metrics::counter!("onboarding_views_total", "view" => view).increment(1);
}

pub fn record_upload_authorization(result: &'static str) {
    metrics::counter!("upload_authorizations_total", "result" => result).increment(1);
}

pub fn record_request(method: &str, status: u16) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
