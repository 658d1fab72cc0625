//! Decimal parsing and formatting helpers
//!
//! Amounts are `rust_decimal::Decimal` throughout; these helpers cover the
//! edges where text or loosely typed JSON turns into decimals and back.

use crate::errors::ParseError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::str::FromStr;

/// Parse user or wire input into a `Decimal`, tolerating surrounding whitespace
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    Decimal::from_str(trimmed).map_err(|_| ParseError::InvalidDecimal(s.to_string()))
}

/// Deserialize a whole number that may arrive as `10` or `10.0`
pub fn deserialize_whole_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use rust_decimal::prelude::ToPrimitive;
    use serde::de::Error;

    let value = <Decimal as Deserialize>::deserialize(deserializer)?;
    if !value.fract().is_zero() {
        return Err(D::Error::custom(format!("expected a whole number, got {value}")));
    }
    value
        .to_u32()
        .ok_or_else(|| D::Error::custom(format!("out of range: {value}")))
}

/// Format a money amount with exactly two fractional digits, HALF_UP
///
/// `500` → `"500.00"`, `1234.565` → `"1234.57"`.
pub fn format_usd(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}
