// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Resilient JSON fetching across mirrored provider hosts
//!
//! The indexer API is served by several community mirrors. [`ResilientFetcher`]
//! expands a request into one candidate URL per mirror and walks them in
//! priority order through [`first_success`]: the first host answering with a
//! 2xx status and parseable JSON wins, every other failure is logged and the
//! next host is tried.

use std::{
    future::Future,
    time::{Duration, Instant},
};

use api_client::{ApiError, HealthCheckResult, HealthStatus};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tokio::{task::JoinSet, time::timeout};
use tracing::{debug, info, warn};
use url::Url;

/// Per-request timeout applied to every outbound call
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 12;

/// Timeout applied to mirror health probes
pub const DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;

/// Public AtomicAssets mirrors, in preference order
pub const DEFAULT_MIRRORS: &[&str] = &[
    "https://wax.api.atomicassets.io",
    "https://aa.wax.blacklusion.io",
    "https://wax-aa.eu.eosamsterdam.net",
];

const HEALTH_PATH: &str = "/health";

/// Configuration for the resilient fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Mirror base URLs in preference order
    pub mirrors: Vec<Url>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Health check timeout in seconds
    pub health_check_timeout_seconds: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            mirrors: DEFAULT_MIRRORS
                .iter()
                .filter_map(|mirror| Url::parse(mirror).ok())
                .collect(),
            timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            health_check_timeout_seconds: DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS,
        }
    }
}

/// Errors produced while fetching from provider hosts
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Host answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Host answered with a body that is not JSON
    #[error("malformed JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Request did not complete in time
    #[error("request to {url} timed out after {seconds} seconds")]
    Timeout { url: String, seconds: u64 },

    /// Target could not be turned into a URL
    #[error("invalid request target: {0}")]
    InvalidTarget(String),

    /// No provider hosts configured
    #[error("no provider hosts configured")]
    NoMirrors,

    /// Every candidate host failed
    #[error("all {attempts} provider hosts failed, last error: {last}")]
    AllProvidersFailed {
        attempts: usize,
        last: Box<FetchError>,
    },
}

impl From<FetchError> for ApiError {
    fn from(value: FetchError) -> Self {
        match value {
            FetchError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            error @ (FetchError::Status { .. } | FetchError::Json { .. }) => {
                ApiError::InvalidResponse {
                    message: error.to_string(),
                }
            }
            FetchError::Timeout { seconds, .. } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
            error @ (FetchError::InvalidTarget(_) | FetchError::NoMirrors) => {
                ApiError::Configuration {
                    message: error.to_string(),
                }
            }
            FetchError::AllProvidersFailed { attempts, last } => ApiError::AllProvidersFailed {
                attempts,
                last_error: last.to_string(),
            },
        }
    }
}

/// What to fetch: a path relative to every mirror, or one absolute URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// API path joined onto each mirror base URL
    Relative {
        /// Path beginning with `/`
        path: String,
        /// Query pairs appended in order
        query: Vec<(String, String)>,
    },
    /// A single fully qualified URL, bypassing the mirror list
    Absolute(Url),
}

impl FetchTarget {
    /// Target an API path on every mirror
    pub fn path(path: impl Into<String>) -> Self {
        Self::Relative {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Target one absolute URL
    pub fn absolute(url: Url) -> Self {
        Self::Absolute(url)
    }

    /// Append a query pair
    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        match &mut self {
            Self::Relative { query, .. } => query.push((key.to_string(), value.to_string())),
            Self::Absolute(url) => {
                url.query_pairs_mut()
                    .append_pair(key, &value.to_string());
            }
        }
        self
    }

    /// Expand this target into candidate URLs, one per mirror in order
    ///
    /// An absolute target yields only itself.
    pub fn candidates(&self, mirrors: &[Url]) -> Result<Vec<Url>, FetchError> {
        match self {
            Self::Absolute(url) => Ok(vec![url.clone()]),
            Self::Relative { path, query } => mirrors
                .iter()
                .map(|mirror| {
                    let base = mirror.as_str().trim_end_matches('/');
                    let separator = if path.starts_with('/') { "" } else { "/" };
                    let mut url = Url::parse(&format!("{base}{separator}{path}"))
                        .map_err(|e| FetchError::InvalidTarget(format!("{path}: {e}")))?;
                    if !query.is_empty() {
                        url.query_pairs_mut().extend_pairs(query);
                    }
                    Ok(url)
                })
                .collect(),
        }
    }
}

/// Try each candidate in order and return the first success
///
/// Failures are logged and the next candidate is attempted. When every
/// candidate fails the last cause is returned inside
/// [`FetchError::AllProvidersFailed`]; an empty candidate list yields
/// [`FetchError::NoMirrors`].
pub async fn first_success<T, F, Fut>(
    candidates: impl IntoIterator<Item = Url>,
    mut attempt: F,
) -> Result<T, FetchError>
where
    F: FnMut(Url) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempts = 0;
    let mut last_error = None;

    for url in candidates {
        attempts += 1;
        let host = url.host_str().unwrap_or_default().to_string();

        match attempt(url).await {
            Ok(value) => {
                if attempts > 1 {
                    info!(host, attempts, "provider host succeeded after fallback");
                }
                return Ok(value);
            }
            Err(error) => {
                warn!(host, attempt = attempts, %error, "provider host failed, trying next");
                last_error = Some(error);
            }
        }
    }

    match last_error {
        Some(last) => Err(FetchError::AllProvidersFailed {
            attempts,
            last: Box::new(last),
        }),
        None => Err(FetchError::NoMirrors),
    }
}

/// Return the top-level `data` member when present, otherwise the value itself
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// JSON fetcher with ordered mirror fallback
#[derive(Debug, Clone)]
pub struct ResilientFetcher {
    client: Client,
    config: FetcherConfig,
}

impl ResilientFetcher {
    /// Create a new fetcher
    ///
    /// # Errors
    ///
    /// Returns an error if no mirrors are configured or the HTTP client cannot be built
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        if config.mirrors.is_empty() {
            return Err(FetchError::NoMirrors);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("collection-stats/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    /// Configured mirrors in preference order
    pub fn mirrors(&self) -> &[Url] {
        &self.config.mirrors
    }

    /// Fetch JSON for `target`, falling back across mirrors
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::AllProvidersFailed`] when no candidate host produced JSON
    pub async fn get_json(&self, target: &FetchTarget) -> Result<Value, FetchError> {
        let candidates = target.candidates(&self.config.mirrors)?;
        first_success(candidates, |url| self.get_once(url)).await
    }

    /// One bounded GET against a single host
    async fn get_once(&self, url: Url) -> Result<Value, FetchError> {
        let seconds = self.config.timeout_seconds;
        let url_text = url.to_string();

        debug!(url = %url_text, "fetching JSON");

        let request = async {
            let response = self
                .client
                .get(url)
                .header("accept", "application/json")
                .send()
                .await
                .map_err(|e| classify_reqwest_error(e, &url_text, seconds))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url_text.clone(),
                    status: status.as_u16(),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| classify_reqwest_error(e, &url_text, seconds))?;

            serde_json::from_slice::<Value>(&body).map_err(|source| FetchError::Json {
                url: url_text.clone(),
                source,
            })
        };

        // dropping the request future on expiry cancels the connection
        let value = timeout(Duration::from_secs(seconds), request)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url_text.clone(),
                seconds,
            })??;

        Ok(unwrap_data(value))
    }

    /// Probe every mirror's health endpoint concurrently
    ///
    /// Results keep the mirror preference order.
    pub async fn probe_mirrors(&self) -> Vec<(String, HealthCheckResult)> {
        let limit = Duration::from_secs(self.config.health_check_timeout_seconds);
        let mut probes = JoinSet::new();

        for (index, mirror) in self.config.mirrors.iter().enumerate() {
            let client = self.client.clone();
            let name = mirror.as_str().trim_end_matches('/').to_string();
            let url = format!("{name}{HEALTH_PATH}");
            probes.spawn(async move { (index, name, probe_host(client, url, limit).await) });
        }

        let mut results = Vec::with_capacity(self.config.mirrors.len());
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(error) => warn!(%error, "mirror health probe task failed"),
            }
        }

        results.sort_by_key(|(index, ..)| *index);
        results
            .into_iter()
            .map(|(_, name, result)| (name, result))
            .collect()
    }
}

fn classify_reqwest_error(error: reqwest::Error, url: &str, seconds: u64) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            seconds,
        }
    } else {
        FetchError::Http(error)
    }
}

async fn probe_host(client: Client, url: String, limit: Duration) -> HealthCheckResult {
    let start_time = Instant::now();
    let outcome = timeout(limit, client.get(&url).send()).await;
    let response_time = start_time.elapsed();

    let status = match outcome {
        Err(_) => HealthStatus::Down {
            reason: format!("health check timed out after {} seconds", limit.as_secs()),
        },
        Ok(Err(error)) => HealthStatus::Down {
            reason: error.to_string(),
        },
        Ok(Ok(response)) => match response.status() {
            status if status.is_success() => HealthStatus::Up,
            StatusCode::TOO_MANY_REQUESTS => HealthStatus::Degraded {
                reason: "Rate limited".to_string(),
            },
            status => HealthStatus::Degraded {
                reason: format!("host returned status {}", status.as_u16()),
            },
        },
    };

    debug!(url, ?status, ?response_time, "mirror health probe finished");
    HealthCheckResult::new(status, response_time)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn mirrors(urls: &[&str]) -> Vec<Url> {
        urls.iter().map(|u| Url::parse(u).unwrap()).collect()
    }

    #[test]
    fn relative_target_expands_per_mirror_in_order() {
        let target = FetchTarget::path("/atomicassets/v1/accounts")
            .query("collection_name", "alien.worlds")
            .query("page", 2);
        let candidates = target
            .candidates(&mirrors(&["https://a.example/", "https://b.example/api"]))
            .unwrap();

        assert_eq!(
            candidates
                .iter()
                .map(Url::as_str)
                .collect::<Vec<_>>(),
            vec![
                "https://a.example/atomicassets/v1/accounts?collection_name=alien.worlds&page=2",
                "https://b.example/api/atomicassets/v1/accounts?collection_name=alien.worlds&page=2",
            ]
        );
    }

    #[test]
    fn absolute_target_ignores_mirrors() {
        let url = Url::parse("https://other.example/stats").unwrap();
        let target = FetchTarget::absolute(url).query("limit", 1);
        let candidates = target
            .candidates(&mirrors(&["https://a.example", "https://b.example"]))
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].as_str(), "https://other.example/stats?limit=1");
    }

    #[test]
    fn unwrap_data_member() {
        assert_eq!(unwrap_data(json!({ "data": [1, 2] })), json!([1, 2]));
        assert_eq!(unwrap_data(json!({ "data": null })), Value::Null);
        assert_eq!(unwrap_data(json!({ "assets": 3 })), json!({ "assets": 3 }));
        assert_eq!(unwrap_data(json!([1])), json!([1]));
    }

    #[tokio::test]
    async fn first_success_respects_order() {
        let candidates = mirrors(&["https://a.example", "https://b.example", "https://c.example"]);
        let mut tried = Vec::new();

        let result = first_success(candidates, |url| {
            tried.push(url.host_str().unwrap().to_string());
            async move {
                if url.host_str() == Some("a.example") {
                    Err(FetchError::Status {
                        url: url.to_string(),
                        status: 500,
                    })
                } else {
                    Ok(url.host_str().unwrap().to_string())
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, "b.example");
        assert_eq!(tried, vec!["a.example", "b.example"]);
    }

    #[tokio::test]
    async fn first_success_reports_last_error() {
        let candidates = mirrors(&["https://a.example", "https://b.example"]);

        let result: Result<(), _> = first_success(candidates, |url| async move {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 502,
            })
        })
        .await;

        match result.unwrap_err() {
            FetchError::AllProvidersFailed { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(last.to_string().contains("b.example"));
            }
            other => panic!("Expected AllProvidersFailed, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_success_without_candidates() {
        let result: Result<(), _> =
            first_success(Vec::new(), |_| async { Ok::<(), FetchError>(()) }).await;
        assert!(matches!(result, Err(FetchError::NoMirrors)));
    }

    #[test]
    fn fetcher_requires_mirrors() {
        let config = FetcherConfig {
            mirrors: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            ResilientFetcher::new(config),
            Err(FetchError::NoMirrors)
        ));
    }

    #[test]
    fn default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.mirrors.len(), DEFAULT_MIRRORS.len());
        assert_eq!(config.timeout_seconds, 12);
    }

    #[test]
    fn fetch_error_conversion() {
        let error = FetchError::AllProvidersFailed {
            attempts: 2,
            last: Box::new(FetchError::Timeout {
                url: "https://a.example".to_string(),
                seconds: 12,
            }),
        };
        match ApiError::from(error) {
            ApiError::AllProvidersFailed {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("timed out"));
            }
            other => panic!("Expected AllProvidersFailed, got: {other:?}"),
        }
    }
}
