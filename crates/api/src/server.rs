// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server implementation module
//!
//! This module provides the main server struct and implementation for the
//! collection stats server, including server lifecycle management, router
//! configuration, and coordinated graceful shutdown using `CancellationToken`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, http::HeaderName};
use external_apis::{IndexerClient, ResilientFetcher, StatsAggregator};
use hyper::Request;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info, info_span, warn};

use crate::{
    config::ServerConfig,
    error::{ServerError, ServerResult},
    routes::create_routes,
    state::ServerState,
};

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for server shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Maximum time in-flight requests get to finish once shutdown begins
    pub graceful_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    config: ServerConfig,
    /// Application router
    router: Router,
    /// Server state
    state: ServerState,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
    /// Configuration for coordinated shutdown
    graceful_shutdown_config: ShutdownConfig,
}

impl Server {
    /// Create new server instance
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Dependency` if the indexer client cannot be built.
    pub fn new(config: ServerConfig, shutdown_config: ShutdownConfig) -> ServerResult<Self> {
        let aggregator = Self::create_aggregator_from_config(&config)?;
        Self::with_aggregator(config, shutdown_config, Arc::new(aggregator))
    }

    /// Create the stats aggregator from server configuration
    fn create_aggregator_from_config(
        config: &ServerConfig,
    ) -> ServerResult<StatsAggregator<IndexerClient>> {
        let fetcher = ResilientFetcher::new(config.indexer.fetcher_config()).map_err(|e| {
            ServerError::Dependency {
                message: format!("failed to create indexer fetcher: {e}"),
            }
        })?;
        let client = IndexerClient::new(fetcher, config.indexer.indexer_config());

        info!(
            collection = %config.indexer.collection,
            mirrors = config.indexer.mirrors.urls().len(),
            "indexer client configured"
        );

        Ok(StatsAggregator::new(client))
    }

    /// Create server with a custom aggregator for dependency injection
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid.
    pub fn with_aggregator(
        config: ServerConfig,
        graceful_shutdown_config: ShutdownConfig,
        aggregator: Arc<StatsAggregator<IndexerClient>>,
    ) -> ServerResult<Self> {
        let cancellation_token = CancellationToken::new();
        let state = ServerState::new(
            config.clone(),
            aggregator,
            cancellation_token.child_token(),
        );
        let router = Self::create_router(state.clone());

        Ok(Self {
            config,
            router,
            state,
            cancellation_token,
            graceful_shutdown_config,
        })
    }

    /// Create application router with middleware
    fn create_router(state: ServerState) -> Router {
        let timeout_duration = state.config().timeout_seconds.value();

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                    if let Some(request_id) = req.headers().get(REQUEST_ID_HEADER) {
                        info_span!("http_request", ?request_id, path = %req.uri().path())
                    } else {
                        error!("failed to extract id from request");
                        info_span!("http_request", request_id = "unknown", path = %req.uri().path())
                    }
                }),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(CorsLayer::permissive());

        create_routes(timeout_duration)
            .layer(middleware)
            .with_state(state)
    }

    /// Run the server with coordinated graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address,
    /// or `ServerError::Startup` if the server fails to start.
    pub async fn run(self) -> ServerResult<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        info!(
            address = %actual_addr,
            environment = %self.config.environment,
            collection = %self.config.indexer.collection,
            "collection stats server starting",
        );

        let cancellation_token = self.cancellation_token.clone();
        let shutdown_token = cancellation_token.clone();
        tokio::spawn(async move {
            info!("spawning the graceful shutdown task");
            Self::shutdown_signal_handler(shutdown_token).await;
        });

        let drain_token = cancellation_token.clone();
        let graceful_timeout = self.graceful_shutdown_config.graceful_timeout;
        let serve = axum::serve(listener, self.router).with_graceful_shutdown(async move {
            cancellation_token.cancelled().await;
            info!("collection stats server draining connections");
        });

        let server_result = tokio::select! {
            result = serve.into_future() => result,
            () = async {
                drain_token.cancelled().await;
                tokio::time::sleep(graceful_timeout).await;
            } => {
                warn!(?graceful_timeout, "graceful shutdown timed out, dropping open connections");
                Ok(())
            }
        };

        if let Err(e) = server_result {
            error!(error = ?e, "Server error during shutdown");
            Err(ServerError::Shutdown { source: e })
        } else {
            info!("collection stats server shut down");
            Ok(())
        }
    }

    /// Cancel `cancellation_token` once SIGINT or SIGTERM arrives
    ///
    /// Returns early if the token is cancelled programmatically first.
    async fn shutdown_signal_handler(cancellation_token: CancellationToken) {
        tokio::select! {
            signal_name = wait_for_signal() => {
                warn!(signal = signal_name, "shutdown signal received, cancelling in-flight work");
                cancellation_token.cancel();
            },
            () = cancellation_token.cancelled() => {
                debug!("shutdown already requested, signal handler exiting");
            }
        }
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the server's cancellation token
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Run server for testing, returns the bound address
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Bind` if unable to bind to the configured address.
    pub async fn run_for_testing(self) -> ServerResult<(SocketAddr, CancellationToken)> {
        let addr = self.config.socket_addr();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                address: addr,
                source,
            })?;

        let actual_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Startup { source })?;

        info!(address = %actual_addr, "collection stats test server starting");

        let token = self.cancellation_token.child_token();
        let task = token.child_token();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, self.router)
                .with_graceful_shutdown(async move { task.cancelled().await })
                .await
            {
                error!(error = ?e, "test server stopped with an error");
            }
        });

        Ok((actual_addr, token))
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server state for testing
    pub fn state(&self) -> &ServerState {
        &self.state
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        },
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "failed to register signal handlers, only programmatic shutdown is available");
            std::future::pending().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install CTRL+C handler, only programmatic shutdown is available");
        std::future::pending::<()>().await;
    }
    "CTRL+C"
}
