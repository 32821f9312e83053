//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cluster_query_plans_total` (counter): plans built, by policy
//! - `cluster_query_plan_hosts` (histogram): snapshot size per plan
//! - `cluster_plan_hosts_skipped_total` (counter): hosts skipped as not considerably up
//! - `cluster_host_considerably_up` (gauge): 1=selectable, 0=excluded, by host
//! - `cluster_connections_total` (counter): connection attempts, by outcome
//! - `cluster_keepalive_failures_total` (counter): keep-alive installs that failed
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Host labels use the socket address

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_query_plan(policy: &'static str, hosts: usize) {
    metrics::counter!("cluster_query_plans_total", "policy" => policy).increment(1);
    metrics::histogram!("cluster_query_plan_hosts", "policy" => policy).record(hosts as f64);
}

pub fn record_host_skipped() {
    metrics::counter!("cluster_plan_hosts_skipped_total").increment(1);
}

pub fn record_host_state(addr: &SocketAddr, considerably_up: bool) {
    let value = if considerably_up { 1.0 } else { 0.0 };
    metrics::gauge!("cluster_host_considerably_up", "host" => addr.to_string()).set(value);
}

pub fn record_connect(addr: &SocketAddr, outcome: &'static str) {
    metrics::counter!(
        "cluster_connections_total",
        "host" => addr.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_keepalive_failure() {
    metrics::counter!("cluster_keepalive_failures_total").increment(1);
}
