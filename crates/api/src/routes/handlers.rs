// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! This module provides the stats and health handlers. Both are
//! cancellation aware: a stats request still in flight when shutdown begins
//! answers with an error payload instead of being dropped.

use std::time::Instant;

use axum::{Json, extract::State};
use shared_types::StatsResult;
use tracing::warn;

use crate::{
    metrics,
    state::{HealthCheck, ServerState},
};

/// Collection stats endpoint handler
///
/// Always answers 200; upstream failures are reported with `ok: false`.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    summary = "Collection stats",
    description = "Returns the holder count, total asset count and floor price of the configured collection. The same payload is served at `/`. Failures are reported in the body with `ok: false`; the status code is always 200 and responses are never cached.",
    responses(
        (status = 200, description = "Aggregated stats or an error payload", body = StatsResult,
            headers(("cache-control" = String, description = "Always `no-store`")))
    )
)]
pub async fn stats_handler(State(state): State<ServerState>) -> Json<StatsResult> {
    let start_time = Instant::now();

    let result = tokio::select! {
        result = state.aggregator().collect() => result,
        () = state.cancellation_token.cancelled() => {
            warn!("stats request interrupted by shutdown");
            StatsResult::failure("server is shutting down")
        }
    };

    metrics::observe_stats_request(&result, start_time.elapsed().as_secs_f64());
    Json(result)
}

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the current health status of the service including version, environment, the configured collection, and the status of every indexer mirror.",
    responses(
        (status = 200, description = "Health report", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthCheck> {
    Json(state.health_check().await)
}
