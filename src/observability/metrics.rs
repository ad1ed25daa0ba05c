//! Metrics collection and exposition.
//!
//! # Metrics
//! - `httplog_requests_total` (counter): requests answered, by method and status
//! - `httplog_capture_wait_seconds` (histogram): time spent publishing a record
//! - `httplog_records_rendered_total` (counter): records written by the consumer
//! - `httplog_render_failures_total` (counter): records the consumer failed to write
//! - `httplog_response_file_errors_total` (counter): unreadable file-backed bodies
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16) {
    metrics::counter!(
        "httplog_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Backpressure indicator: large values mean the consumer is falling behind.
pub fn record_capture_wait(started: Instant) {
    metrics::histogram!("httplog_capture_wait_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_rendered() {
    metrics::counter!("httplog_records_rendered_total").increment(1);
}

pub fn record_render_failure() {
    metrics::counter!("httplog_render_failures_total").increment(1);
}

pub fn record_file_error() {
    metrics::counter!("httplog_response_file_errors_total").increment(1);
}
