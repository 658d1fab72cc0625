//! Executed trade (fill) records for the trade-history table

use crate::ids::Coin;
use crate::order::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub coin: Coin,
    pub side: Side,
    pub px: Decimal,
    pub sz: Decimal,
    /// Unix millis
    pub time: i64,
    pub fee: Decimal,
    pub hash: String,
}

impl Trade {
    /// Traded value in quote currency
    pub fn notional(&self) -> Decimal {
        self.px * self.sz
    }

    /// Net cash flow: negative for buys, positive for sells, fee always deducted
    pub fn cash_flow(&self) -> Decimal {
        let gross = match self.side {
            Side::Buy => -self.notional(),
            Side::Sell => self.notional(),
        };
        gross - self.fee
    }

    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.time)
    }
}
