//! Metrics collection and exposition.
//!
//! # Metrics
//! - `funnel_dispatch_total` (counter): dispatches by mode and outcome
//! - `funnel_dispatch_duration_seconds` (histogram): dispatch latency by mode
//! - `funnel_node_failures_total` (counter): node failures by login type
//! - `funnel_breaker_transitions_total` (counter): breaker transitions by login type and target state
//! - `funnel_healthy_nodes` (gauge): size of the last healthy snapshot per login type
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::funnel::LoginType;
use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics recorder"),
    }
}

/// Record a finished dispatch.
pub fn record_dispatch(mode: &'static str, outcome: &'static str, start: Instant) {
    counter!("funnel_dispatch_total", "mode" => mode, "outcome" => outcome).increment(1);
    histogram!("funnel_dispatch_duration_seconds", "mode" => mode)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_node_failure(login_type: LoginType) {
    counter!("funnel_node_failures_total", "login_type" => login_type.as_str()).increment(1);
}

pub fn record_breaker_transition(login_type: LoginType, to: CircuitState) {
    counter!(
        "funnel_breaker_transitions_total",
        "login_type" => login_type.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

pub fn record_healthy_nodes(login_type: LoginType, count: usize) {
    gauge!("funnel_healthy_nodes", "login_type" => login_type.as_str()).set(count as f64);
}
