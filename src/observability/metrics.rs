//! Metrics collection and exposition.
//!
//! # Metrics
//! - `nse_cache_lookups_total` (counter): cache reads by key and hit/miss
//! - `nse_upstream_attempts_total` (counter): upstream calls by policy and outcome
//! - `nse_session_handshakes_total` (counter): handshake attempts by outcome
//! - `nse_fetch_exhausted_total` (counter): fetches that ran out of retries
//! - `nse_singleflight_joined_total` (counter): callers that joined an in-flight fetch
//! - `nse_http_request_duration_seconds` (histogram): downstream latency by route, status
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_cache_lookup(key: &'static str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("nse_cache_lookups_total", "key" => key, "result" => result).increment(1);
}

pub fn record_upstream_attempt(policy: &'static str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("nse_upstream_attempts_total", "policy" => policy, "outcome" => outcome).increment(1);
}

pub fn record_handshake(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("nse_session_handshakes_total", "outcome" => outcome).increment(1);
}

pub fn record_exhausted(policy: &'static str) {
    counter!("nse_fetch_exhausted_total", "policy" => policy).increment(1);
}

pub fn record_singleflight_join(key: &'static str) {
    counter!("nse_singleflight_joined_total", "key" => key).increment(1);
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    histogram!(
        "nse_http_request_duration_seconds",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
