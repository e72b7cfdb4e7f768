//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_content_hash_total` (counter): injector outcomes by `result`
//! - `edge_requests_total` (counter): proxied requests by method, status
//! - `edge_request_duration_seconds` (histogram): proxy latency by method
//!
//! Extension methods are folded into `method="other"` so clients cannot mint
//! new series.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus exporter on `addr`. Needs a running Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Count one injector outcome (`injected`, `no_body`, `decode_error`, ...).
pub fn record_content_hash(result: &'static str) {
    counter!("edge_content_hash_total", "result" => result).increment(1);
}

/// Label value for a request method: the standard verbs as-is, anything else `other`.
pub fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "CONNECT" => "CONNECT",
        "OPTIONS" => "OPTIONS",
        "TRACE" => "TRACE",
        "PATCH" => "PATCH",
        _ => "other",
    }
}

/// Record a completed proxy request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method_label(method);
    counter!(
        "edge_requests_total",
        "method" => method,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("edge_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}
