// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Collection identifiers and base token settings
//!
//! Collections on the indexer are keyed by an Antelope account name. This module
//! provides [`CollectionName`], a validated wrapper that makes invalid names
//! unrepresentable, and [`BaseToken`], the token that floor prices are
//! denominated in.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use utoipa::ToSchema;

/// Collection tracked when configuration does not name another one
pub const DEFAULT_COLLECTION_NAME: &str = "alien.worlds";

/// Symbol of the chain's base token
pub const DEFAULT_TOKEN_SYMBOL: &str = "WAX";

/// Implied decimal places of base token amounts
pub const DEFAULT_TOKEN_PRECISION: u32 = 8;

const MAX_NAME_LENGTH: usize = 12;

/// Errors produced when validating a collection name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionNameError {
    /// The name was empty
    #[error("collection name cannot be empty")]
    Empty,

    /// The name exceeded the account-name length limit
    #[error("collection name `{0}` is longer than 12 characters")]
    TooLong(String),

    /// The name contained a character outside `a-z`, `1-5` and `.`
    #[error("collection name `{name}` contains invalid character `{character}`")]
    InvalidCharacter {
        /// The rejected name
        name: String,
        /// The first offending character
        character: char,
    },

    /// The name ended with a dot
    #[error("collection name `{0}` cannot end with `.`")]
    TrailingDot(String),
}

/// Validated collection identifier
///
/// Follows the Antelope account-name rules the indexer uses for
/// `collection_name`: one to twelve characters drawn from `a-z`, `1-5` and `.`,
/// never ending in a dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, ToSchema)]
#[schema(value_type = String, example = "alien.worlds")]
pub struct CollectionName(Box<str>);

impl CollectionName {
    /// Create a new `CollectionName`, validating the account-name rules
    pub fn new(name: impl Into<String>) -> Result<Self, CollectionNameError> {
        let name = name.into();

        if name.is_empty() {
            return Err(CollectionNameError::Empty);
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(CollectionNameError::TooLong(name));
        }
        if let Some(character) = name
            .chars()
            .find(|c| !matches!(c, 'a'..='z' | '1'..='5' | '.'))
        {
            return Err(CollectionNameError::InvalidCharacter { name, character });
        }
        if name.ends_with('.') {
            return Err(CollectionNameError::TrailingDot(name));
        }

        Ok(Self(name.into_boxed_str()))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CollectionName {
    fn default() -> Self {
        Self(Box::from(DEFAULT_COLLECTION_NAME))
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CollectionName {
    type Err = CollectionNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for CollectionName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CollectionName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Self::new(name).map_err(serde::de::Error::custom)
    }
}

/// Token that marketplace prices are denominated in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseToken {
    /// Ticker used for the marketplace `symbol` filter
    pub symbol: String,
    /// Decimal places implied by integer amounts
    pub precision: u32,
}

impl Default for BaseToken {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            precision: DEFAULT_TOKEN_PRECISION,
        }
    }
}
