// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the collection stats
//! server, including configuration, the stats aggregator, and coordinated
//! cancellation.

use std::{collections::BTreeMap, sync::Arc};

use external_apis::{IndexerClient, StatsAggregator};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::config::{Environment, ServerConfig};

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    /// Aggregator answering stats requests
    aggregator: Arc<StatsAggregator<IndexerClient>>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `aggregator` - Aggregator answering stats requests
    /// * `cancellation_token` - Token for coordinated cancellation
    pub fn new(
        config: ServerConfig,
        aggregator: Arc<StatsAggregator<IndexerClient>>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            aggregator,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The stats aggregator
    pub fn aggregator(&self) -> &Arc<StatsAggregator<IndexerClient>> {
        &self.aggregator
    }

    /// Probe every indexer mirror and summarize service health
    pub async fn health_check(&self) -> HealthCheck {
        let probes = self.aggregator.provider().fetcher().probe_mirrors().await;

        let status = Self::overall_status(probes.iter().map(|(_, result)| &result.status));

        let mirrors = probes
            .into_iter()
            .map(|(name, result)| (name, Self::convert_health_status(result.status)))
            .collect();

        HealthCheck {
            status,
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            collection: Box::from(self.config.indexer.collection.as_str()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            mirrors,
        }
    }

    /// Summarize mirror statuses: up when every mirror is up, down when every
    /// mirror is down, degraded otherwise
    fn overall_status<'a>(
        statuses: impl ExactSizeIterator<Item = &'a api_client::HealthStatus>,
    ) -> HealthStatus {
        let total = statuses.len();
        let (up, down) = statuses.fold((0, 0), |(up, down), status| {
            if status.is_down() {
                (up, down + 1)
            } else if *status == api_client::HealthStatus::Up {
                (up + 1, down)
            } else {
                (up, down)
            }
        });

        if up == total {
            HealthStatus::Up
        } else if down == total {
            HealthStatus::Down {
                reason: Box::from("no indexer mirror is reachable"),
            }
        } else {
            HealthStatus::Degraded {
                reason: format!("{up} of {total} indexer mirrors fully available").into_boxed_str(),
            }
        }
    }

    /// Convert provider health status to the service's health status
    fn convert_health_status(external_status: api_client::HealthStatus) -> HealthStatus {
        match external_status {
            api_client::HealthStatus::Up => HealthStatus::Up,
            api_client::HealthStatus::Degraded { reason } => HealthStatus::Degraded {
                reason: reason.into_boxed_str(),
            },
            api_client::HealthStatus::Down { reason } => HealthStatus::Down {
                reason: reason.into_boxed_str(),
            },
        }
    }
}

/// Health status of a service or dependency
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum HealthStatus {
    /// Service is fully operational and responding normally
    Up,

    /// Service is not operational or has critical failures
    Down {
        /// Human-readable explanation of why the service is down
        reason: Box<str>,
    },

    /// Service is operational but experiencing performance issues or partial failures
    Degraded {
        /// Human-readable explanation of the degradation condition
        reason: Box<str>,
    },
}

/// Health check status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Service status, derived from how many mirrors are available
    pub status: HealthStatus,
    /// Service version
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Collection the service reports on
    pub collection: Box<str>,
    /// Timestamp
    pub timestamp: String,
    /// Status of each indexer mirror, keyed by base URL
    #[schema(value_type = Object)]
    pub mirrors: BTreeMap<String, HealthStatus>,
}

#[cfg(test)]
mod tests {
    use external_apis::ResilientFetcher;

    use super::*;

    fn aggregator(config: &ServerConfig) -> Arc<StatsAggregator<IndexerClient>> {
        let fetcher = ResilientFetcher::new(config.indexer.fetcher_config()).unwrap();
        Arc::new(StatsAggregator::new(IndexerClient::new(
            fetcher,
            config.indexer.indexer_config(),
        )))
    }

    #[test]
    fn server_state_creation() {
        let config = ServerConfig::default();
        let state = ServerState::new(config.clone(), aggregator(&config), CancellationToken::new());

        assert!(!state.cancellation_token.is_cancelled());
        assert_eq!(
            state.aggregator().provider().config().collection,
            config.indexer.collection
        );
    }

    #[test]
    fn server_state_with_cancellation_token() {
        let config = ServerConfig::default();
        let token = CancellationToken::new();
        let state = ServerState::new(config.clone(), aggregator(&config), token.clone());

        assert!(!state.cancellation_token.is_cancelled());

        token.cancel();
        assert!(state.cancellation_token.is_cancelled());
    }

    #[test]
    fn overall_status_summary() {
        let up = api_client::HealthStatus::Up;
        let down = api_client::HealthStatus::Down {
            reason: "timeout".to_string(),
        };
        let limited = api_client::HealthStatus::Degraded {
            reason: "Rate limited".to_string(),
        };

        assert_eq!(ServerState::overall_status([&up, &up].into_iter()), HealthStatus::Up);
        assert!(matches!(
            ServerState::overall_status([&down, &down].into_iter()),
            HealthStatus::Down { .. }
        ));
        assert_eq!(
            ServerState::overall_status([&up, &limited, &down].into_iter()),
            HealthStatus::Degraded {
                reason: Box::from("1 of 3 indexer mirrors fully available")
            }
        );
    }

    #[test]
    fn health_status_conversion() {
        assert_eq!(
            ServerState::convert_health_status(api_client::HealthStatus::Up),
            HealthStatus::Up
        );
        assert_eq!(
            ServerState::convert_health_status(api_client::HealthStatus::Down {
                reason: "connection refused".to_string()
            }),
            HealthStatus::Down {
                reason: Box::from("connection refused")
            }
        );
    }
}
