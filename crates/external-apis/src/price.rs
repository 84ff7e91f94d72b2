// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Marketplace price decoding
//!
//! Sale records carry their price in one of several shapes depending on the
//! API revision. A raw value is first classified into a [`PriceShape`] and then
//! decoded by the shape-specific rule; values matching no shape are rejected.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::fields::numeric_value;

static LEADING_DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d*\.?\d+)").expect("leading decimal pattern is valid")
});

/// Recognized representations of a listing price
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceShape<'a> {
    /// Decimal text, optionally followed by a currency symbol (`"1.50000000 WAX"`)
    Text(&'a str),
    /// Fixed-point integer in the base token's precision (`150000000`)
    Integer(u64),
    /// Asset object with an `amount` and optional `token_precision`
    Structured {
        /// Raw integer amount, number or numeric string
        amount: &'a Value,
        /// Decimal places of `amount`, when stated
        precision: Option<&'a Value>,
    },
}

impl<'a> PriceShape<'a> {
    /// Classify a raw JSON price, `None` when it matches no known shape
    pub fn classify(value: &'a Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self::Text(text)),
            Value::Number(number) => number.as_u64().map(Self::Integer),
            Value::Object(object) => object
                .get("amount")
                .filter(|amount| !amount.is_null())
                .map(|amount| Self::Structured {
                    amount,
                    precision: object
                        .get("token_precision")
                        .filter(|precision| !precision.is_null()),
                }),
            _ => None,
        }
    }

    /// Decode into a base token amount
    ///
    /// `default_precision` applies to bare integers and to objects that do not
    /// state their own precision. Non-finite or negative results are rejected.
    #[allow(clippy::cast_precision_loss)]
    pub fn decode(&self, default_precision: u32) -> Option<f64> {
        let price = match self {
            Self::Text(text) => parse_leading_decimal(text)?,
            Self::Integer(raw) => scale(*raw as f64, default_precision)?,
            Self::Structured { amount, precision } => {
                let precision = match precision {
                    Some(precision) => parse_precision(precision)?,
                    None => default_precision,
                };
                scale(numeric_value(amount)?, precision)?
            }
        };

        (price.is_finite() && price >= 0.0).then_some(price)
    }
}

/// Classify and decode a raw price value
pub fn decode_price(value: &Value, default_precision: u32) -> Option<f64> {
    PriceShape::classify(value)?.decode(default_precision)
}

fn parse_leading_decimal(text: &str) -> Option<f64> {
    let captures = LEADING_DECIMAL.captures(text)?;
    captures.get(1)?.as_str().parse().ok()
}

fn parse_precision(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number.as_u64().and_then(|p| u32::try_from(p).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn scale(amount: f64, precision: u32) -> Option<f64> {
    let divisor = 10_u64.checked_pow(precision)?;
    Some(amount / divisor as f64)
}
