//! Common validation result shape and the price-precision check
//!
//! Validators never panic or return `Err`: they report `is_valid` plus an
//! optional human-readable message so the order form can show them inline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::numeric::parse_decimal;

use crate::precision::decimal_places;

/// Outcome of a single validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(message.into()),
        }
    }
}

/// Check that a price field fits within the asset's price decimals.
///
/// Empty fields pass: presence is enforced by the order-type rules, not here.
pub fn validate_price_precision(field: &str, value: &str, max_decimals: u32) -> ValidationResult {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return ValidationResult::ok();
    }
    if parse_decimal(trimmed).is_err() {
        return ValidationResult::fail(format!("{field} must be a valid number"));
    }
    if decimal_places(trimmed) > max_decimals {
        return ValidationResult::fail(format!(
            "{field} exceeds maximum precision of {max_decimals} decimal places"
        ));
    }
    ValidationResult::ok()
}

/// Parse an optional positive decimal out of a form field
pub(crate) fn positive_decimal(value: &str) -> Option<Decimal> {
    parse_decimal(value).ok().filter(|v| *v > Decimal::ZERO)
}
