//! Prometheus collectors for movie-service and the `/metrics` handler.
//!
//! HTTP collectors are fed by [`crate::middleware::MetricsMiddleware`]; task
//! collectors by the worker. Pool gauges come from `db-pool`.

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "movie_http_requests_total",
        "Total HTTP requests by method, route pattern and status",
        &["method", "route", "status"]
    )
    .expect("failed to register movie_http_requests_total")
});

pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "movie_http_request_duration_seconds",
        "HTTP request latency by method, route pattern and status",
        &["method", "route", "status"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("failed to register movie_http_request_duration_seconds")
});

/// Outcome is one of `succeeded`, `retried`, `dead_lettered`.
pub static TASKS_PROCESSED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "movie_tasks_processed_total",
        "Background tasks processed by task name and outcome",
        &["task", "outcome"]
    )
    .expect("failed to register movie_tasks_processed_total")
});

pub static TASK_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "movie_task_duration_seconds",
        "Background task execution time",
        &["task"]
    )
    .expect("failed to register movie_task_duration_seconds")
});

pub fn record_task(task: &str, outcome: &str) {
    TASKS_PROCESSED_TOTAL
        .with_label_values(&[task, outcome])
        .inc();
}

/// Render every registered collector in the text exposition format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_counter_increments_per_outcome() {
        let before = TASKS_PROCESSED_TOTAL
            .with_label_values(&["cleanup_expired_tokens", "succeeded"])
            .get();
        record_task("cleanup_expired_tokens", "succeeded");
        let after = TASKS_PROCESSED_TOTAL
            .with_label_values(&["cleanup_expired_tokens", "succeeded"])
            .get();
        assert_eq!(after, before + 1);
    }
}
