//! Account state types
//!
//! Snapshot refreshed on every poll; the client has no write path.

use crate::order::OpenOrder;
use crate::trade::Trade;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Account balances and margins per `/api/account/state/{address}`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountState {
    pub equity: Decimal,
    pub margin_used: Decimal,
    pub available_balance: Decimal,
    pub withdrawable: Decimal,
    #[serde(default)]
    pub cross_margin_summary: BTreeMap<String, Decimal>,
}

impl AccountState {
    /// Share of equity committed as margin, `margin_used / equity`
    ///
    /// Returns zero for an account without equity.
    pub fn margin_utilization(&self) -> Decimal {
        if self.equity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.margin_used / self.equity
    }
}

/// Order and trade history per `/api/account/history/{address}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountHistory {
    pub orders: Vec<OpenOrder>,
    pub trades: Vec<Trade>,
}
