// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Lenient field probing for inconsistent provider payloads
//!
//! Mirrors and API revisions disagree on key names and on whether counts are
//! numbers or numeric strings. Lookups here are table driven: callers pass an
//! ordered list of candidate keys and the first populated one wins.

use serde_json::Value;

/// Return the first key of `keys` that is present and not `null`
pub fn first_populated<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let object = value.as_object()?;
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|candidate| !candidate.is_null())
}

/// Interpret a JSON number or numeric string as `f64`
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Interpret a count leniently: missing, negative or non-numeric values are zero
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn count_value(value: Option<&Value>) -> u64 {
    let Some(value) = value else {
        return 0;
    };

    if let Some(count) = value.as_u64() {
        return count;
    }

    match numeric_value(value) {
        Some(count) if count.is_finite() && count > 0.0 => count.trunc() as u64,
        _ => 0,
    }
}
