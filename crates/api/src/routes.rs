// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration and handlers for the collection
//! stats server.

pub mod handlers;

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, header},
    routing::get,
};
use handlers::{health_handler, stats_handler};
use tower_http::{set_header::SetResponseHeaderLayer, timeout::TimeoutLayer};

use crate::{
    metrics::metrics_handler,
    openapi::{OPENAPI_JSON_PATH, openapi_spec, swagger_ui},
    state::ServerState,
};

/// Create application routes
///
/// The stats routes carry no route timeout: each indexer request has its own
/// timeout and holder pagination stops at the page cap, so they always answer
/// with a JSON body. Every other route gets `timeout`.
pub fn create_routes(timeout: Duration) -> Router<ServerState> {
    let stats_routes = Router::new()
        .route("/", get(stats_handler))
        .route("/stats", get(stats_handler))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    let health_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let docs_routes = Router::new()
        .route(OPENAPI_JSON_PATH, get(openapi_spec))
        .route("/swagger-ui", get(swagger_ui));

    let bounded_routes = health_routes
        .merge(docs_routes)
        .layer(TimeoutLayer::new(timeout));

    Router::new().merge(stats_routes).merge(bounded_routes)
}
