// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Collection stats aggregation
//!
//! [`StatsAggregator`] runs the three provider queries concurrently and merges
//! them into a single [`StatsResult`]. Only a failed holder tally turns into an
//! error payload; missing totals and floor prices become `null` fields.

use api_client::{ApiError, HolderTally, StatsProvider};
use shared_types::StatsResult;
use tracing::{error, info, warn};

/// Aggregates collection statistics from a provider
///
/// No deadline is imposed on a whole run: each outbound request carries its
/// own timeout and pagination stops at the page cap, so a run always ends.
#[derive(Debug)]
pub struct StatsAggregator<P> {
    provider: P,
}

impl<P: StatsProvider> StatsAggregator<P> {
    /// Create an aggregator over `provider`
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The underlying provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run all queries concurrently and merge the results
    ///
    /// Always returns a well-formed result; failures are reported through
    /// [`StatsResult::Failure`].
    pub async fn collect(&self) -> StatsResult {
        let (tally, stats_total, floor) = tokio::join!(
            self.provider.holder_tally(),
            self.provider.collection_total(),
            self.provider.floor_price(),
        );

        match &tally {
            Ok(tally) if tally.truncated => warn!(
                provider = self.provider.name(),
                pages_fetched = tally.pages_fetched,
                holders = tally.holders,
                "holder pagination hit the page cap, holder count is a lower bound"
            ),
            Ok(tally) => info!(
                provider = self.provider.name(),
                pages_fetched = tally.pages_fetched,
                "holder pagination complete"
            ),
            Err(e) => error!(provider = self.provider.name(), error = %e, "holder tally failed"),
        }

        let result = merge(tally, stats_total, floor);
        if let Some(stats) = result.stats() {
            info!(
                provider = self.provider.name(),
                holders = stats.holders,
                total_assets = ?stats.total_assets,
                floor_wax = ?stats.floor_wax,
                "collection stats aggregated"
            );
        }
        result
    }
}

/// Merge the three query outcomes
///
/// The stats endpoint total takes precedence over the pagination sum.
pub fn merge(
    tally: Result<HolderTally, ApiError>,
    stats_total: Option<u64>,
    floor: Option<f64>,
) -> StatsResult {
    match tally {
        Ok(tally) => {
            StatsResult::success(tally.holders, stats_total.or(tally.total_by_sum), floor)
        }
        Err(e) => StatsResult::failure(e.to_string()),
    }
}
