//! Position tracking types
//!
//! A position is created externally on order fill, refreshed by polling,
//! and destroyed when its size reaches zero. Mark-price PnL is recomputed
//! on demand and never written back.

use crate::ids::Coin;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Position side enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    /// Long position - profit when price increases
    Long,
    /// Short position - profit when price decreases
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short
    pub fn sign(&self) -> Decimal {
        match self {
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Margin mode of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginType {
    /// Shared collateral pool across all positions
    #[default]
    Cross,
    /// Per-position isolated margin
    Isolated,
}

/// An open position as reported by `/api/account/positions/{address}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub coin: Coin,
    pub side: PositionSide,
    #[serde(rename = "entry_px")]
    pub entry_price: Decimal,
    #[serde(rename = "sz")]
    pub size: Decimal,
    #[serde(deserialize_with = "crate::numeric::deserialize_whole_u32")]
    pub leverage: u32,
    pub margin_used: Decimal,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
    /// Zero when the exchange reports no liquidation price
    #[serde(rename = "liquidation_px")]
    pub liquidation_price: Decimal,
    pub margin_type: MarginType,
}

impl Position {
    /// Unrealized PnL at the given mark price
    ///
    /// LONG: `(mark - entry) × size`, SHORT: `(entry - mark) × size`
    pub fn unrealized_pnl_at(&self, mark_price: Decimal) -> Decimal {
        (mark_price - self.entry_price) * self.size * self.side.sign()
    }

    /// Position value at the given mark price
    pub fn notional_at(&self, mark_price: Decimal) -> Decimal {
        mark_price * self.size
    }

    /// Copy of this position with PnL recomputed at `mark_price`
    pub fn with_mark_price(&self, mark_price: Decimal) -> Self {
        Self {
            unrealized_pnl: self.unrealized_pnl_at(mark_price),
            ..self.clone()
        }
    }

    /// Return on margin in percent at the given mark price
    pub fn roe_percent_at(&self, mark_price: Decimal) -> Decimal {
        if self.margin_used.is_zero() {
            return Decimal::ZERO;
        }
        self.unrealized_pnl_at(mark_price) / self.margin_used * Decimal::ONE_HUNDRED
    }

    /// Apply a signed size change (positive adds, negative reduces).
    ///
    /// Size never goes below zero; margin used scales with size.
    pub fn apply_size_change(&mut self, delta: Decimal) {
        let new_size = (self.size + delta).max(Decimal::ZERO);
        if !self.size.is_zero() {
            self.margin_used = self.margin_used * new_size / self.size;
        }
        self.size = new_size;
    }

    /// A position with zero size no longer exists
    pub fn is_closed(&self) -> bool {
        self.size.is_zero()
    }
}
