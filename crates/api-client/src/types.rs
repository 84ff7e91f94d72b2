// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Common data types produced by stats providers

use serde::{Deserialize, Serialize};

/// Result of paging through a collection's holder accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HolderTally {
    /// Number of holder records seen across all pages
    pub holders: u64,
    /// Sum of per-holder asset counts, `None` when the sum was zero
    pub total_by_sum: Option<u64>,
    /// Number of non-empty pages consumed
    pub pages_fetched: u32,
    /// Pagination stopped at the page cap while pages were still full
    pub truncated: bool,
}

impl HolderTally {
    /// Build a tally from running totals, mapping a zero sum to `None`
    pub fn new(holders: u64, asset_sum: u64, pages_fetched: u32, truncated: bool) -> Self {
        Self {
            holders,
            total_by_sum: (asset_sum > 0).then_some(asset_sum),
            pages_fetched,
            truncated,
        }
    }
}
