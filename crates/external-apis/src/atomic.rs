// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! AtomicAssets / AtomicMarket indexer integration
//!
//! This module provides an implementation of the `StatsProvider` trait on top of
//! the public AtomicAssets and AtomicMarket REST APIs. All requests go through
//! the [`ResilientFetcher`], so every query falls back across the configured
//! mirrors.

use std::fmt;

use api_client::{ApiError, HolderTally, StatsProvider};
use serde_json::Value;
use shared_types::{BaseToken, CollectionName};
use tracing::{debug, info, warn};

use crate::{
    fetcher::{FetchError, FetchTarget, ResilientFetcher},
    fields::{count_value, first_populated, numeric_value},
    price::decode_price,
};

/// Largest page the accounts listing serves
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Upper bound on pages fetched per tally; an approximation guard, not a
/// statement about collection size
pub const DEFAULT_PAGE_CAP: u32 = 10;

/// Keys probed, in order, for the collection's total asset count
pub const TOTAL_ASSET_FIELDS: &[&str] = &["assets", "assets_count", "num_assets", "assetsTotal"];

/// Keys probed, in order, for a sale record's price
///
/// `listing_price` is not probed: it is a bare integer in the listing token's
/// smallest unit with no precision attached.
pub const SALE_PRICE_FIELDS: &[&str] = &["price"];

const ACCOUNTS_PATH: &str = "/atomicassets/v1/accounts";

/// Marketplace API revision used for sales queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketApiVersion {
    /// `atomicmarket/v1`, filtered by token symbol
    V1,
    /// `atomicmarket/v2`, no symbol filter
    V2,
}

impl MarketApiVersion {
    /// Versions in the order they are tried
    pub const fn fallback_order() -> [Self; 2] {
        [Self::V1, Self::V2]
    }

    /// Path of the sales listing for this version
    pub const fn sales_path(self) -> &'static str {
        match self {
            Self::V1 => "/atomicmarket/v1/sales",
            Self::V2 => "/atomicmarket/v2/sales",
        }
    }

    /// Whether this version's query carries the `symbol` filter
    pub const fn filters_by_symbol(self) -> bool {
        matches!(self, Self::V1)
    }
}

impl fmt::Display for MarketApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

/// Query settings for the indexer client
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Collection to report on
    pub collection: CollectionName,
    /// Token that prices are denominated in
    pub token: BaseToken,
    /// Accounts requested per page
    pub page_size: u32,
    /// Maximum pages fetched per tally
    pub page_cap: u32,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            collection: CollectionName::default(),
            token: BaseToken::default(),
            page_size: DEFAULT_PAGE_SIZE,
            page_cap: DEFAULT_PAGE_CAP,
        }
    }
}

/// Stats provider backed by the AtomicAssets indexer
#[derive(Debug, Clone)]
pub struct IndexerClient {
    fetcher: ResilientFetcher,
    config: IndexerConfig,
}

impl IndexerClient {
    /// Create a new indexer client
    pub fn new(fetcher: ResilientFetcher, config: IndexerConfig) -> Self {
        Self { fetcher, config }
    }

    /// The underlying fetcher
    pub fn fetcher(&self) -> &ResilientFetcher {
        &self.fetcher
    }

    /// The query settings
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Page through the accounts listing, counting holders and summing assets
    ///
    /// Stops at an empty page, a short page, or the page cap.
    ///
    /// # Errors
    ///
    /// Returns an error if any page fails on every mirror
    pub async fn count_holders(&self) -> Result<HolderTally, FetchError> {
        let page_size = self.config.page_size.max(1);
        let page_cap = self.config.page_cap.max(1);

        let mut holders: u64 = 0;
        let mut asset_sum: u64 = 0;
        let mut pages_fetched = 0;
        let mut truncated = false;

        for page in 1..=page_cap {
            let target = FetchTarget::path(ACCOUNTS_PATH)
                .query("collection_name", &self.config.collection)
                .query("page", page)
                .query("limit", page_size);

            let data = self.fetcher.get_json(&target).await?;
            let Some(records) = data.as_array() else {
                warn!(page, "accounts listing returned a non-array payload, stopping");
                break;
            };

            if records.is_empty() {
                break;
            }

            pages_fetched += 1;
            holders = holders.saturating_add(records.len() as u64);
            asset_sum = records
                .iter()
                .map(record_asset_count)
                .fold(asset_sum, u64::saturating_add);

            debug!(page, records = records.len(), holders, asset_sum, "accounts page counted");

            if records.len() < page_size as usize {
                break;
            }

            if page == page_cap {
                truncated = true;
                warn!(
                    page_cap,
                    holders, "page cap reached with full pages, holder count is a lower bound"
                );
            }
        }

        Ok(HolderTally::new(holders, asset_sum, pages_fetched, truncated))
    }

    /// Look up the collection's total asset count on the stats endpoint
    ///
    /// Failures are logged and reported as `None`.
    pub async fn lookup_total(&self) -> Option<u64> {
        let target = FetchTarget::path(format!(
            "/atomicassets/v1/collections/{}/stats",
            self.config.collection
        ));

        match self.fetcher.get_json(&target).await {
            Ok(data) => {
                let total = total_from_stats(&data);
                if total.is_none() {
                    debug!("collection stats carried no usable asset total");
                }
                total
            }
            Err(error) => {
                warn!(%error, "collection stats unavailable");
                None
            }
        }
    }

    /// Look up the lowest active listing, trying each marketplace version in turn
    ///
    /// Failures are logged and reported as `None`.
    pub async fn lookup_floor(&self) -> Option<f64> {
        for version in MarketApiVersion::fallback_order() {
            match self.floor_from_version(version).await {
                Ok(Some(price)) => {
                    debug!(%version, price, "floor price found");
                    return Some(price);
                }
                Ok(None) => debug!(%version, "no usable floor price"),
                Err(error) => warn!(%version, %error, "floor price lookup failed"),
            }
        }
        None
    }

    async fn floor_from_version(&self, version: MarketApiVersion) -> Result<Option<f64>, FetchError> {
        let mut target = FetchTarget::path(version.sales_path())
            .query("collection_name", &self.config.collection)
            .query("state", 1)
            .query("order", "asc")
            .query("sort", "price");
        if version.filters_by_symbol() {
            target = target.query("symbol", &self.config.token.symbol);
        }
        target = target.query("limit", 1);

        let data = self.fetcher.get_json(&target).await?;
        Ok(floor_from_sales(&data, self.config.token.precision))
    }
}

impl StatsProvider for IndexerClient {
    async fn holder_tally(&self) -> Result<HolderTally, ApiError> {
        info!(collection = %self.config.collection, "counting collection holders");
        Ok(self.count_holders().await?)
    }

    async fn collection_total(&self) -> Option<u64> {
        self.lookup_total().await
    }

    async fn floor_price(&self) -> Option<f64> {
        self.lookup_floor().await
    }

    fn name(&self) -> &'static str {
        "atomicassets"
    }
}

/// Asset count of one holder record
///
/// Uses the record's `assets` when present, otherwise the sum of its
/// `templates[*].assets`. Missing or non-numeric values count as zero.
pub fn record_asset_count(record: &Value) -> u64 {
    match record.get("assets").filter(|assets| !assets.is_null()) {
        Some(assets) => count_value(Some(assets)),
        None => record
            .get("templates")
            .and_then(Value::as_array)
            .map_or(0, |templates| {
                templates
                    .iter()
                    .map(|template| count_value(template.get("assets")))
                    .fold(0, u64::saturating_add)
            }),
    }
}

/// Total asset count from a stats payload
///
/// The first populated key of [`TOTAL_ASSET_FIELDS`] is taken; it must parse to
/// a finite number greater than zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn total_from_stats(data: &Value) -> Option<u64> {
    let total = numeric_value(first_populated(data, TOTAL_ASSET_FIELDS)?)?;
    (total.is_finite() && total > 0.0).then(|| total.trunc() as u64)
}

/// Floor price from a sales listing payload
///
/// Reads the first sale's price from the first populated key of
/// [`SALE_PRICE_FIELDS`].
pub fn floor_from_sales(data: &Value, default_precision: u32) -> Option<f64> {
    let sale = data.as_array()?.first()?;
    decode_price(first_populated(sale, SALE_PRICE_FIELDS)?, default_precision)
}
