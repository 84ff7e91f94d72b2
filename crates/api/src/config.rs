// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration module
//!
//! This module provides configuration structures and logic for the collection
//! stats server, supporting different environments and validation of
//! configuration parameters.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    time::Duration,
};

use anyhow::{Result, anyhow, ensure};
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use external_apis::{
    DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS, DEFAULT_MIRRORS, DEFAULT_PAGE_CAP, DEFAULT_PAGE_SIZE,
    DEFAULT_REQUEST_TIMEOUT_SECONDS, FetcherConfig, IndexerConfig,
};
use serde::{Deserialize, Deserializer, Serialize, de};
use shared_types::{
    BaseToken, CollectionName, DEFAULT_COLLECTION_NAME, DEFAULT_TOKEN_PRECISION,
    DEFAULT_TOKEN_SYMBOL,
};
use url::Url;
use utoipa::ToSchema;

use crate::error::{ServerError, ServerResult};

/// Largest page size the accounts listing accepts
const MAX_PAGE_SIZE: u32 = 1000;

/// A validated server port that ensures the value is appropriate for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Create a new `ServerPort`, ensuring it's valid for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 in non-testing environments
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port cannot be 0 in non-testing environments"));
        }
        Ok(Self { port, environment })
    }

    /// Create a safe default port for development
    pub const fn default_development() -> Self {
        Self {
            port: 3000,
            environment: Environment::Development,
        }
    }

    /// Create a safe testing port (port 0)
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Get the port value
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // environment is fixed up once the whole configuration is loaded
        Ok(Self {
            port,
            environment: Environment::Development,
        })
    }
}

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Create a safe default timeout (30 seconds)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(30))
    }

    /// Create a safe testing timeout (5 seconds)
    pub const fn testing() -> Self {
        Self(Duration::from_secs(5))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Accounts requested per page, between 1 and 1000
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSize(u32);

impl PageSize {
    /// Create a new `PageSize`
    ///
    /// # Errors
    ///
    /// Returns an error if the size is 0 or larger than the indexer allows
    pub fn new(size: u32) -> Result<Self> {
        ensure!(size != 0, "page size must be greater than 0");
        ensure!(
            size <= MAX_PAGE_SIZE,
            "page size cannot exceed {MAX_PAGE_SIZE}"
        );
        Ok(Self(size))
    }

    /// Get the page size value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

impl<'de> Deserialize<'de> for PageSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let size = u32::deserialize(deserializer)?;
        Self::new(size).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// Indexer mirror base URLs in preference order, never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorList(Vec<Url>);

impl MirrorList {
    /// Create a new `MirrorList`
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or a mirror cannot act as a base URL
    pub fn new(mirrors: Vec<Url>) -> Result<Self> {
        ensure!(!mirrors.is_empty(), "at least one indexer mirror is required");
        if let Some(mirror) = mirrors.iter().find(|mirror| mirror.cannot_be_a_base()) {
            return Err(anyhow!("mirror {mirror} is not a valid base URL"));
        }
        Ok(Self(mirrors))
    }

    /// Mirrors in preference order
    pub fn urls(&self) -> &[Url] {
        &self.0
    }
}

impl Default for MirrorList {
    fn default() -> Self {
        Self(
            DEFAULT_MIRRORS
                .iter()
                .filter_map(|mirror| Url::parse(mirror).ok())
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for MirrorList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mirrors = Vec::<Url>::deserialize(deserializer)?;
        Self::new(mirrors).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

/// Indexer settings: which collection to report on and where to ask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerSettings {
    /// Collection to report on
    pub collection: CollectionName,
    /// Mirror base URLs in preference order
    pub mirrors: MirrorList,
    /// Per-request timeout for indexer calls
    pub request_timeout_seconds: TimeoutSeconds,
    /// Timeout for mirror health probes
    pub health_check_timeout_seconds: TimeoutSeconds,
    /// Accounts requested per page
    pub page_size: PageSize,
    /// Maximum accounts pages fetched per request
    pub page_cap: NonZeroU32,
    /// Symbol of the token prices are denominated in
    pub token_symbol: String,
    /// Decimal places of the token's integer amounts
    pub token_precision: u32,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            collection: CollectionName::default(),
            mirrors: MirrorList::default(),
            request_timeout_seconds: TimeoutSeconds(Duration::from_secs(
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            )),
            health_check_timeout_seconds: TimeoutSeconds(Duration::from_secs(
                DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS,
            )),
            page_size: PageSize::default(),
            page_cap: NonZeroU32::new(DEFAULT_PAGE_CAP).unwrap_or(NonZeroU32::MIN),
            token_symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            token_precision: DEFAULT_TOKEN_PRECISION,
        }
    }
}

impl IndexerSettings {
    /// Settings for the resilient fetcher
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            mirrors: self.mirrors.urls().to_vec(),
            timeout_seconds: self.request_timeout_seconds.value().as_secs(),
            health_check_timeout_seconds: self.health_check_timeout_seconds.value().as_secs(),
        }
    }

    /// Query settings for the indexer client
    pub fn indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            collection: self.collection.clone(),
            token: BaseToken {
                symbol: self.token_symbol.clone(),
                precision: self.token_precision,
            },
            page_size: self.page_size.value(),
            page_cap: self.page_cap.get(),
        }
    }
}

/// Server configuration for different environments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: IpAddr,
    /// Server port (validated for environment compatibility)
    pub port: ServerPort,
    /// Request timeout in seconds (validated range: 1-300), also the bound on
    /// one stats aggregation
    pub timeout_seconds: TimeoutSeconds,
    /// Environment type
    pub environment: Environment,
    /// Indexer settings
    pub indexer: IndexerSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::default_development(),
            timeout_seconds: TimeoutSeconds::default(),
            environment: Environment::Development,
            indexer: IndexerSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (config.json)
    /// 3. Environment-specific files (config.{env}.json)
    /// 4. Environment variables with `SERVER__` prefix, `__` between nested keys
    ///    and comma separated mirror lists
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config_builder = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 3000)?
            .set_default("timeout_seconds", 30)?
            .set_default("environment", "development")?
            .set_default("indexer.collection", DEFAULT_COLLECTION_NAME)?
            .set_default(
                "indexer.mirrors",
                DEFAULT_MIRRORS
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
            )?
            .set_default(
                "indexer.request_timeout_seconds",
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            )?
            .set_default(
                "indexer.health_check_timeout_seconds",
                DEFAULT_HEALTH_CHECK_TIMEOUT_SECONDS,
            )?
            .set_default("indexer.page_size", DEFAULT_PAGE_SIZE)?
            .set_default("indexer.page_cap", DEFAULT_PAGE_CAP)?
            .set_default("indexer.token_symbol", DEFAULT_TOKEN_SYMBOL)?
            .set_default("indexer.token_precision", DEFAULT_TOKEN_PRECISION)?
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(
                ConfigEnv::with_prefix("SERVER")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("indexer.mirrors")
                    .try_parsing(true),
            );

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        let config = config_builder.build()?;
        let mut server_config: Self = config.try_deserialize()?;

        server_config.port = ServerPort::new(server_config.port.value(), server_config.environment)
            .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;

        Ok(server_config)
    }

    /// Create configuration optimized for testing
    pub fn for_testing() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(),
            timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            indexer: IndexerSettings {
                request_timeout_seconds: TimeoutSeconds(Duration::from_secs(1)),
                health_check_timeout_seconds: TimeoutSeconds(Duration::from_secs(1)),
                ..IndexerSettings::default()
            },
        }
    }

    /// Replace the indexer mirrors, keeping every other setting
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty
    pub fn with_mirrors(mut self, mirrors: Vec<Url>) -> Result<Self> {
        self.indexer.mirrors = MirrorList::new(mirrors)?;
        Ok(self)
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}
