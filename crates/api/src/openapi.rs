// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` documentation module
//!
//! This module provides the `OpenAPI` document and the `Swagger UI` page that
//! renders it.

use axum::{Json, response::Html};
use shared_types::{CollectionStats, StatsFailure, StatsResult};
use utoipa::OpenApi;

use crate::{
    config::Environment,
    routes::handlers,
    state::{HealthCheck, HealthStatus},
};

/// Route serving the JSON document
pub const OPENAPI_JSON_PATH: &str = "/api-doc/openapi.json";

const SWAGGER_UI_VERSION: &str = "5.17.14";

/// `OpenAPI` document for the collection stats service
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Collection Stats API",
        description = "Holder count, total assets and floor price of a single NFT collection, aggregated from AtomicAssets indexer mirrors."
    ),
    paths(handlers::stats_handler, handlers::health_handler),
    components(schemas(
        StatsResult,
        CollectionStats,
        StatsFailure,
        HealthCheck,
        HealthStatus,
        Environment
    )),
    tags(
        (name = "stats", description = "Collection statistics"),
        (name = "health", description = "Service and mirror health")
    )
)]
pub struct ApiDoc;

/// `OpenAPI` specification endpoint
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Swagger UI endpoint
pub async fn swagger_ui() -> Html<String> {
    Html(swagger_page(&ApiDoc::openapi().info.title))
}

fn swagger_page(title: &str) -> String {
    let assets = format!("https://unpkg.com/swagger-ui-dist@{SWAGGER_UI_VERSION}");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <link rel="stylesheet" type="text/css" href="{assets}/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="{assets}/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {{
            SwaggerUIBundle({{
                url: '{OPENAPI_JSON_PATH}',
                dom_id: '#swagger-ui',
                deepLinking: true
            }});
        }}
    </script>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/stats"));
        assert!(doc.paths.paths.contains_key("/health"));
        assert_eq!(doc.info.title, "Collection Stats API");
    }

    #[test]
    fn swagger_page_points_at_document() {
        let page = swagger_page("Collection Stats API");
        assert!(page.contains("<title>Collection Stats API</title>"));
        assert!(page.contains("url: '/api-doc/openapi.json'"));
        assert!(page.contains(SWAGGER_UI_VERSION));
    }
}
