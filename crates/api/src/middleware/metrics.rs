//! Prometheus metrics: HTTP middleware, sweep counters and the scrape endpoint.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

use domain::services::SweepReport;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Middleware to record HTTP request metrics.
///
/// - `http_requests_total`: counter (method, path, status)
/// - `http_request_duration_seconds`: histogram (method, path)
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = method_to_str(req.method());
    // Matched route template keeps label cardinality bounded
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        "http_requests_total",
        "method" => method,
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(duration);

    response
}

fn method_to_str(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "OTHER",
    }
}

/// Records the outcome of one lifecycle sweep.
pub fn record_lifecycle_sweep(report: &SweepReport) {
    counter!("lifecycle_sweep_updates_total", "phase" => "registration_closed")
        .increment(report.registrations_closed);
    counter!("lifecycle_sweep_updates_total", "phase" => "event_ended")
        .increment(report.events_ended);
    counter!("lifecycle_sweep_updates_total", "phase" => "marked_absent")
        .increment(report.participants_marked_absent);
    if report.failures > 0 {
        counter!("lifecycle_sweep_failures_total").increment(report.failures);
    }
}

/// Records reminders dispatched by one reminder run.
pub fn record_reminders_sent(count: usize) {
    counter!("reminders_sent_total").increment(count as u64);
}

/// Records a sweep skipped because another instance holds its lease.
pub fn record_sweep_skipped(sweep: &'static str) {
    counter!("sweep_skipped_total", "sweep" => sweep).increment(1);
}

/// Handler for /metrics endpoint that returns Prometheus text format.
pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        ),
    }
}

/// Installs the global Prometheus recorder.
///
/// Call once at startup, before any metric is recorded. A second call is a
/// no-op.
pub fn init_metrics() -> Result<(), BuildError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(&[0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0])?
        .install_recorder()?;

    let _ = PROMETHEUS_HANDLE.set(handle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_to_str() {
        assert_eq!(method_to_str(&Method::GET), "GET");
        assert_eq!(method_to_str(&Method::POST), "POST");
        assert_eq!(method_to_str(&Method::DELETE), "DELETE");
        assert_eq!(method_to_str(&Method::TRACE), "OTHER");
    }

    #[test]
    fn test_recording_without_recorder_is_harmless() {
        record_lifecycle_sweep(&SweepReport {
            registrations_closed: 1,
            events_ended: 1,
            participants_marked_absent: 3,
            failures: 1,
        });
        record_reminders_sent(2);
        record_sweep_skipped("lifecycle_sweep");
    }
}
