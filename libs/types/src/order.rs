//! Order types
//!
//! Enumerations shared by the order form, the trading requests and the
//! open-orders / order-history tables.

use crate::ids::{Coin, OrderId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side
///
/// On the wire buys are `"B"` (bid) and sells are `"A"` (ask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "B", alias = "buy")]
    Buy,
    #[serde(rename = "A", alias = "sell")]
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }
}

/// Order type offered by the order-entry form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Limit,
    Market,
    StopLimit,
    StopMarket,
}

impl OrderType {
    /// Stop orders carry a trigger price
    pub fn is_stop(&self) -> bool {
        matches!(self, OrderType::StopLimit | OrderType::StopMarket)
    }

    /// Order types that rest on the book at a limit price
    pub fn has_limit_price(&self) -> bool {
        matches!(self, OrderType::Limit | OrderType::StopLimit)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderType::Limit => "limit",
            OrderType::Market => "market",
            OrderType::StopLimit => "stop_limit",
            OrderType::StopMarket => "stop_market",
        };
        f.write_str(label)
    }
}

/// Time-in-force policy for orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-Till-Cancel: remains until filled or explicitly canceled
    #[default]
    GTC,
    /// Immediate-Or-Cancel: match immediately, cancel remainder
    IOC,
    /// Fill-Or-Kill: full match or reject entirely
    FOK,
}

impl TimeInForce {
    /// IOC and FOK never rest on the book
    pub fn is_immediate(&self) -> bool {
        matches!(self, TimeInForce::IOC | TimeInForce::FOK)
    }
}

/// Order status as reported by the account endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Filled,
    Canceled,
    Triggered,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Canceled)
    }
}

/// An open or historical order row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub oid: OrderId,
    pub coin: Coin,
    pub side: Side,
    pub limit_px: Decimal,
    /// Remaining size
    pub sz: Decimal,
    pub orig_sz: Decimal,
    pub status: OrderStatus,
    /// Unix millis
    pub timestamp: i64,
    pub order_type: OrderType,
    pub reduce_only: bool,
    pub post_only: bool,
    pub tif: TimeInForce,
}

impl OpenOrder {
    /// Size already executed
    pub fn filled_sz(&self) -> Decimal {
        (self.orig_sz - self.sz).max(Decimal::ZERO)
    }

    /// Fill ratio in `[0, 1]`
    pub fn fill_ratio(&self) -> Decimal {
        if self.orig_sz.is_zero() {
            Decimal::ZERO
        } else {
            self.filled_sz() / self.orig_sz
        }
    }

    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}
