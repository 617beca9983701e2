//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wallet_rpc_requests_total` (counter): RPC calls by method, outcome
//! - `wallet_refresh_total` (counter): balance/history refreshes by outcome
//! - `wallet_history_dropped_total` (counter): detail fetches dropped from history
//! - `wallet_submissions_total` (counter): transfer submissions by outcome
//! - `wallet_connected` (gauge): 1 while an account is connected
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rpc_request(method: &'static str, outcome: &'static str) {
    metrics::counter!("wallet_rpc_requests_total", "method" => method, "outcome" => outcome)
        .increment(1);
}

pub fn record_refresh(kind: &'static str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!("wallet_refresh_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_history_dropped(count: usize) {
    if count > 0 {
        metrics::counter!("wallet_history_dropped_total").increment(count as u64);
    }
}

pub fn record_submission(outcome: &'static str) {
    metrics::counter!("wallet_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_connected(connected: bool) {
    metrics::gauge!("wallet_connected").set(if connected { 1.0 } else { 0.0 });
}
