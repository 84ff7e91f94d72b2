// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Collection Stats Server Implementation
//!
//! This crate provides the HTTP server for the collection stats service, built
//! with Axum. It answers a single question about one NFT collection (how many
//! holders, how many assets, what is the floor price) by aggregating the
//! AtomicAssets indexer across redundant mirrors.
//!
//! # Module Structure
//!
//! - [`config`]: Server and indexer configuration with hierarchical loading
//! - [`error`]: Error types and HTTP response handling
//! - [`state`]: Shared application state and mirror health reporting
//! - [`server`]: Main server implementation, lifecycle, and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`metrics`]: Prometheus counters and histograms for stats requests
//! - [`openapi`]: `OpenAPI` specification and Swagger UI endpoints
//!
//! # Key Features
//!
//! - **Always Answers**: `/stats` responds 200 with either stats or an error payload
//! - **Mirror Failover**: every indexer query falls back across configured mirrors
//! - **Graceful Shutdown**: coordinated termination using `CancellationToken`
//! - **Health Monitoring**: concurrent health probes of every indexer mirror

pub mod config;
pub mod error;
pub mod metrics;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, IndexerSettings, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use shared_types::StatsResult;
pub use state::{HealthCheck, ServerState};
