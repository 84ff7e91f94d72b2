// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! External API integrations for collection statistics
//!
//! This crate implements the `StatsProvider` trait on top of the AtomicAssets
//! indexer and aggregates its queries into the service's response.
//!
//! # Architecture
//!
//! - **Fetching**: [`fetcher::ResilientFetcher`] - JSON GETs with ordered mirror fallback
//! - **Decoding**: [`fields`], [`price`] - table-driven field probing and price shapes
//! - **Client Implementation**: [`atomic::IndexerClient`] - holder, stats and floor queries
//! - **Aggregation**: [`aggregator::StatsAggregator`] - concurrent fan-out and merge
//!
//! # Features
//!
//! - **Automatic Failover**: mirrors are tried in order until one answers with JSON
//! - **Concurrent Queries**: the three lookups run together via `tokio::join!`
//! - **Bounded Requests**: every outbound call carries a timeout
//! - **Testing Support**: integration tests simulate mirrors with wiremock

pub mod aggregator;
pub mod atomic;
pub mod fetcher;
pub mod fields;
pub mod price;

pub use aggregator::*;
pub use atomic::*;
pub use fetcher::*;
pub use price::{PriceShape, decode_price};
