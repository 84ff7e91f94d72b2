// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::sync::LazyLock;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec,
};
use shared_types::StatsResult;
use tracing::error;

/// Total number of stats requests served, labeled by outcome.
pub static STATS_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "collection_stats_requests_total",
        "Total number of stats requests, labeled by outcome",
        &["outcome"]
    )
    .expect("Failed to create collection_stats_requests_total counter vec")
});

/// Histogram for stats aggregation durations in seconds.
pub static STATS_AGGREGATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "collection_stats_aggregation_duration",
        "Stats aggregation durations in seconds",
        &["outcome"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("Failed to create stats aggregation duration histogram")
});

/// Outcome label of a stats result
pub fn outcome_label(result: &StatsResult) -> &'static str {
    if result.is_ok() { "ok" } else { "error" }
}

/// Record one served stats request and how long its aggregation took
///
/// # Arguments
/// * `result` - The aggregated result returned to the client
/// * `duration_secs` - The duration of the aggregation in seconds
pub fn observe_stats_request(result: &StatsResult, duration_secs: f64) {
    let outcome = outcome_label(result);
    STATS_REQUESTS.with_label_values(&[outcome]).inc();
    STATS_AGGREGATION_DURATION
        .with_label_values(&[outcome])
        .observe(duration_secs);
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
