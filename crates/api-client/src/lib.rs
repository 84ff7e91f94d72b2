// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Generic provider traits and utilities for collection stats sources
//!
//! This crate provides the abstractions the aggregator is written against, so
//! that indexer integrations and test doubles can be swapped freely.
//!
//! # Core Abstractions
//!
//! - **`StatsProvider` Trait**: the three independent queries a stats source answers
//! - **Health Check System**: standardized health status reporting for provider mirrors
//! - **Error Handling**: `ApiError` classification of provider failures
//! - **Data Types**: [`HolderTally`], the result of holder pagination

use thiserror::Error;

pub mod health;
pub mod types;

pub use health::*;
pub use types::*;

/// Source of collection statistics
///
/// Each query is independent of the others so callers may run them
/// concurrently. Only [`StatsProvider::holder_tally`] reports failures; the
/// optional lookups absorb their errors and answer `None`.
pub trait StatsProvider: Send + Sync {
    /// Count holders and sum their assets by paging through the accounts listing
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be fetched from any provider host
    fn holder_tally(&self) -> impl Future<Output = Result<HolderTally, ApiError>> + Send;

    /// Total asset count reported by the collection stats endpoint
    ///
    /// `None` when the endpoint is unreachable or reports no usable total.
    fn collection_total(&self) -> impl Future<Output = Option<u64>> + Send;

    /// Lowest active listing price in the base token
    ///
    /// `None` when there are no listings or no price could be decoded.
    fn floor_price(&self) -> impl Future<Output = Option<f64>> + Send;

    /// Get the name/identifier of this provider
    fn name(&self) -> &'static str;
}

/// Common errors that can occur when working with stats providers
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {message}")]
    Http { message: String },

    /// Invalid response format
    #[error("Invalid response format: {message}")]
    InvalidResponse { message: String },

    /// Network timeout
    #[error("Request timeout after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    /// Every provider host failed for a request
    #[error("All {attempts} provider hosts failed, last error: {last_error}")]
    AllProvidersFailed { attempts: usize, last_error: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}
