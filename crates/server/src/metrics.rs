//! Prometheus metrics
//!
//! - `store_assistant_http_requests_total{route, method, status}`
//! - `store_assistant_http_request_duration_seconds{route, method}`
//! - `store_assistant_errors_total{kind, stage}`
//! - `store_assistant_answers_total{entry, source}`
//! - `store_assistant_artifacts_purged_total`
//!
//! The recorder is process-global and installed once by `init_metrics`.
//! Until then every `record_*` call is a no-op.

use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use store_assistant_core::{AnswerSource, PipelineStage};

use crate::ServerError;

const LATENCY_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder
pub fn init_metrics() -> Result<&'static PrometheusHandle, ServerError> {
    METRICS_HANDLE.get_or_try_init(|| {
        PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                LATENCY_BUCKETS,
            )
            .map_err(|e| ServerError::Internal(format!("metrics buckets: {}", e)))?
            .install_recorder()
            .map_err(|e| ServerError::Internal(format!("metrics recorder: {}", e)))
    })
}

/// GET /metrics
pub async fn metrics_handler() -> Response {
    match METRICS_HANDLE.get() {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

/// Per-route request counter and latency histogram
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    record_request(&route, &method, response.status(), start.elapsed());
    response
}

pub fn record_request(route: &str, method: &str, status: StatusCode, elapsed: Duration) {
    metrics::counter!(
        "store_assistant_http_requests_total",
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!(
        "store_assistant_http_request_duration_seconds",
        "route" => route.to_string(),
        "method" => method.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_failure(kind: &'static str, stage: Option<PipelineStage>) {
    metrics::counter!(
        "store_assistant_errors_total",
        "kind" => kind,
        "stage" => stage.map_or("none", |s| s.as_str())
    )
    .increment(1);
}

pub fn record_answer(entry: &'static str, source: AnswerSource) {
    metrics::counter!(
        "store_assistant_answers_total",
        "entry" => entry,
        "source" => source.as_str()
    )
    .increment(1);
}

pub fn record_artifacts_purged(count: usize) {
    metrics::counter!("store_assistant_artifacts_purged_total").increment(count as u64);
}
