//! Identifier types for dashboard entities
//!
//! Coins are keyed by their bare uppercase symbol. Market-data feeds may
//! publish perpetuals as `BTC-PERP`; every entry point normalises that
//! suffix away so positions, prices and asset info share one key space.

use crate::errors::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const PERP_SUFFIX: &str = "-PERP";

/// Coin symbol (e.g. `BTC`, `ETH`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Coin(String);

impl Coin {
    /// Create a coin, normalising case and stripping a `-PERP` suffix
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Self(normalize_symbol(symbol.as_ref()))
    }

    /// Create a coin and enforce the API symbol shape (2-10 uppercase letters)
    pub fn parse(symbol: impl AsRef<str>) -> Result<Self, ParseError> {
        let coin = Self::new(symbol.as_ref());
        let len = coin.0.len();
        if (2..=10).contains(&len) && coin.0.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(coin)
        } else {
            Err(ParseError::InvalidCoin(symbol.as_ref().to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Uppercase, trim and drop any `-PERP` suffix
pub fn normalize_symbol(symbol: &str) -> String {
    let upper = symbol.trim().to_ascii_uppercase();
    match upper.strip_suffix(PERP_SUFFIX) {
        Some(base) => base.to_string(),
        None => upper,
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Coin {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Coin {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Coin> for String {
    fn from(coin: Coin) -> Self {
        coin.0
    }
}

/// Wallet address (`0x` + 40 hex digits), stored lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ParseError::InvalidAddress(s.to_string()))?;
        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseError::InvalidAddress(s.to_string()));
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exchange-assigned order identifier (`oid`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-side order identifier attached to outgoing orders
///
/// Uses UUID v7 so ids sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOrderId(Uuid);

impl ClientOrderId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
