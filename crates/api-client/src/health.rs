// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Health check types for provider hosts

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health status of a provider host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum HealthStatus {
    /// Host is healthy and operational
    Up,
    /// Host answers but is rate limiting or erroring
    Degraded { reason: String },
    /// Host is unreachable
    Down { reason: String },
}

/// Health check result for a single host with timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// The health status
    pub status: HealthStatus,
    /// Response time for the health check
    pub response_time: Duration,
    /// When the health check was performed
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    /// Check if this health status indicates the host is completely down
    pub fn is_down(&self) -> bool {
        matches!(self, HealthStatus::Down { .. })
    }
}

impl HealthCheckResult {
    /// Create a new result stamped with the current time
    pub fn new(status: HealthStatus, response_time: Duration) -> Self {
        Self {
            status,
            response_time,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_down_check() {
        assert!(!HealthStatus::Up.is_down());
        assert!(
            !HealthStatus::Degraded {
                reason: "rate limited".to_string()
            }
            .is_down()
        );
        assert!(
            HealthStatus::Down {
                reason: "offline".to_string()
            }
            .is_down()
        );
    }

    #[test]
    fn health_check_result_creation() {
        let duration = Duration::from_millis(100);
        let result = HealthCheckResult::new(HealthStatus::Up, duration);
        assert_eq!(result.status, HealthStatus::Up);
        assert_eq!(result.response_time, duration);
    }
}
