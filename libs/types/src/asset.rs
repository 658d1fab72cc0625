//! Per-instrument trading constraints
//!
//! Fetched once from the info endpoint and immutable for the session.

use crate::ids::Coin;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Leverage cap assumed when asset info has not been fetched
pub const DEFAULT_MAX_LEVERAGE: u32 = 50;

/// Size decimals assumed when asset info has not been fetched
pub const DEFAULT_SIZE_DECIMALS: u32 = 4;

/// Price decimals assumed when asset info has not been fetched
pub const DEFAULT_PRICE_DECIMALS: u32 = 2;

/// Minimum order size assumed when asset info has not been fetched (0.001)
pub fn default_min_size() -> Decimal {
    Decimal::new(1, 3)
}

/// Information about a tradable asset per `/api/info/asset/{coin}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub coin: Coin,
    #[serde(rename = "sz_decimals")]
    pub size_decimals: u32,
    #[serde(rename = "px_decimals")]
    pub price_decimals: u32,
    #[serde(rename = "min_sz")]
    pub min_size: Decimal,
    #[serde(deserialize_with = "crate::numeric::deserialize_whole_u32")]
    pub max_leverage: u32,
    #[serde(default)]
    pub funding_rate: Decimal,
    #[serde(default)]
    pub open_interest: Decimal,
    #[serde(default)]
    pub volume_24h: Decimal,
    #[serde(default)]
    pub price_change_24h: Decimal,
}

impl AssetInfo {
    /// Constraint set used before the real one has been fetched
    pub fn with_defaults(coin: Coin) -> Self {
        Self {
            coin,
            size_decimals: DEFAULT_SIZE_DECIMALS,
            price_decimals: DEFAULT_PRICE_DECIMALS,
            min_size: default_min_size(),
            max_leverage: DEFAULT_MAX_LEVERAGE,
            funding_rate: Decimal::ZERO,
            open_interest: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            price_change_24h: Decimal::ZERO,
        }
    }
}

/// Exchange metadata per `/api/info/meta`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeMeta {
    pub exchange: String,
    pub assets: Vec<AssetInfo>,
}

impl ExchangeMeta {
    /// Look up an asset by coin, accepting `-PERP` suffixed symbols
    pub fn asset(&self, coin: &str) -> Option<&AssetInfo> {
        let coin = Coin::new(coin);
        self.assets.iter().find(|a| a.coin == coin)
    }
}
