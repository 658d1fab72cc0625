//! Order size validation: positivity, minimum size and size precision

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::asset::{default_min_size, DEFAULT_SIZE_DECIMALS};
use types::numeric::parse_decimal;

use crate::precision::decimal_places;

/// Result of a size check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeValidation {
    pub is_valid: bool,
    pub error: Option<String>,
    pub min_size: Decimal,
    pub size_decimals: u32,
}

/// Validate a raw size string.
///
/// Defaults when asset info is missing: minimum 0.001, 4 decimals.
/// Rejects iff the size is not positive, below the minimum, or carries
/// more decimal places than allowed (counted on the string, not the number).
pub fn validate_size(
    size: &str,
    min_size: Option<Decimal>,
    size_decimals: Option<u32>,
) -> SizeValidation {
    let min_size = min_size.unwrap_or_else(default_min_size);
    let size_decimals = size_decimals.unwrap_or(DEFAULT_SIZE_DECIMALS);

    let error = match parse_decimal(size) {
        Err(_) => Some("Size must be a valid number".to_string()),
        Ok(value) if value <= Decimal::ZERO => Some("Size must be greater than 0".to_string()),
        Ok(value) if value < min_size => {
            Some(format!("Size must be at least {}", min_size.normalize()))
        }
        Ok(_) if decimal_places(size) > size_decimals => Some(format!(
            "Size exceeds maximum precision of {size_decimals} decimal places"
        )),
        Ok(_) => None,
    };

    SizeValidation {
        is_valid: error.is_none(),
        error,
        min_size,
        size_decimals,
    }
}
