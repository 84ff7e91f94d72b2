// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the collection stats service
//!
//! This crate provides common types that are shared across multiple crates
//! in the workspace, avoiding circular dependencies.

pub mod collection;
pub mod stats;

pub use collection::{
    BaseToken, CollectionName, CollectionNameError, DEFAULT_COLLECTION_NAME,
    DEFAULT_TOKEN_PRECISION, DEFAULT_TOKEN_SYMBOL,
};
pub use stats::{CollectionStats, StatsFailure, StatsResult};
