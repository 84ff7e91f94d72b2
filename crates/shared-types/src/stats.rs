// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Collection stats response types

use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::ToSchema;

/// Aggregated statistics for the tracked collection
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CollectionStats {
    /// Always `true` for this variant
    #[schema(example = true)]
    ok: bool,
    /// Number of accounts holding at least one asset
    #[schema(example = 2400)]
    pub holders: u64,
    /// Total minted assets, `null` when no source produced a value
    #[schema(example = 185_000)]
    pub total_assets: Option<u64>,
    /// Lowest active listing in the base token, `null` when unavailable
    #[schema(example = 123.4567)]
    pub floor_wax: Option<f64>,
}

/// Failure payload returned when no reliable stats could be produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatsFailure {
    /// Always `false` for this variant
    #[schema(example = false)]
    ok: bool,
    /// Human-readable failure cause
    pub error: String,
}

/// Response body of the stats endpoint
///
/// Serializes flat: `{ "ok": true, "holders", "total_assets", "floor_wax" }` on
/// success and `{ "ok": false, "error" }` on failure. Optional fields are written
/// as `null` rather than omitted. Deserialization checks the `ok` flag against
/// the fields present.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum StatsResult {
    /// Stats were produced
    Success(CollectionStats),
    /// The mandatory holder count could not be produced
    Failure(StatsFailure),
}

/// Flat shape of either variant as it appears on the wire
#[derive(Deserialize)]
struct WireStatsResult {
    ok: bool,
    holders: Option<u64>,
    total_assets: Option<u64>,
    floor_wax: Option<f64>,
    error: Option<String>,
}

impl WireStatsResult {
    fn into_result(self) -> Result<StatsResult, &'static str> {
        match self {
            WireStatsResult {
                ok: true,
                holders: Some(holders),
                total_assets,
                floor_wax,
                error: None,
            } => Ok(StatsResult::success(holders, total_assets, floor_wax)),
            WireStatsResult { ok: true, error: Some(_), .. } => {
                Err("successful stats must not carry an error")
            }
            WireStatsResult { ok: true, .. } => Err("successful stats require a holder count"),
            WireStatsResult {
                ok: false,
                holders: None,
                total_assets: None,
                floor_wax: None,
                error: Some(error),
            } if !error.trim().is_empty() => {
                Ok(StatsResult::Failure(StatsFailure { ok: false, error }))
            }
            WireStatsResult { ok: false, .. } => {
                Err("failed stats require a non-empty error and no stats fields")
            }
        }
    }
}

impl<'de> Deserialize<'de> for StatsResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        WireStatsResult::deserialize(deserializer)?
            .into_result()
            .map_err(de::Error::custom)
    }
}

impl StatsResult {
    /// Build a successful result
    pub fn success(holders: u64, total_assets: Option<u64>, floor_wax: Option<f64>) -> Self {
        Self::Success(CollectionStats {
            ok: true,
            holders,
            total_assets,
            floor_wax,
        })
    }

    /// Build a failure result
    ///
    /// An empty message is replaced so callers always get a non-empty `error`.
    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        let error = if error.trim().is_empty() {
            "unknown error".to_string()
        } else {
            error
        };
        Self::Failure(StatsFailure { ok: false, error })
    }

    /// Whether stats were produced
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The stats, if produced
    pub fn stats(&self) -> Option<&CollectionStats> {
        match self {
            Self::Success(stats) => Some(stats),
            Self::Failure(_) => None,
        }
    }
}
