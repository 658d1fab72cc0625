//! Portfolio view: mark-price PnL and account aggregates
//!
//! Positions arrive from the account endpoint with PnL computed at the
//! exchange's last mark. Between polls the dashboard recomputes PnL and
//! liquidation risk from live mid prices; the recomputed figures live in
//! a [`PositionView`] and are never written back into the position.
//! `BTreeMap` keeps iteration order stable.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::account::AccountState;
use types::ids::Coin;
use types::position::Position;
use types::risk::{LiquidationRisk, UtilizationLevel};

use crate::liquidation::{position_liquidation_risk, RiskThresholds};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Display precision for aggregates
const DISPLAY_DP: u32 = 8;

/// Utilisation below 70% is low
const UTILIZATION_MEDIUM: Decimal = Decimal::from_parts(7, 0, 0, false, 1);

/// Utilisation below 90% is medium, at or above is high
const UTILIZATION_HIGH: Decimal = Decimal::from_parts(9, 0, 0, false, 1);

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A position together with figures recomputed at the current mark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub position: Position,
    /// `None` until a mark price has been seen for the coin
    pub mark_price: Option<Decimal>,
    pub unrealized_pnl: Decimal,
    pub roe_percent: Decimal,
    pub notional: Decimal,
    pub liquidation_risk: Option<LiquidationRisk>,
}

impl PositionView {
    /// Build a view; without a mark the exchange-reported PnL is shown
    pub fn new(position: &Position, mark_price: Option<Decimal>, thresholds: &RiskThresholds) -> Self {
        match mark_price.filter(|px| *px > Decimal::ZERO) {
            Some(mark) => Self {
                position: position.clone(),
                mark_price: Some(mark),
                unrealized_pnl: round_display(position.unrealized_pnl_at(mark)),
                roe_percent: round_display(position.roe_percent_at(mark)),
                notional: round_display(position.notional_at(mark)),
                liquidation_risk: position_liquidation_risk(position, mark, thresholds),
            },
            None => Self {
                position: position.clone(),
                mark_price: None,
                unrealized_pnl: position.unrealized_pnl,
                roe_percent: if position.margin_used.is_zero() {
                    Decimal::ZERO
                } else {
                    round_display(position.unrealized_pnl / position.margin_used * Decimal::ONE_HUNDRED)
                },
                notional: round_display(position.notional_at(position.entry_price)),
                liquidation_risk: None,
            },
        }
    }
}

/// Account-wide totals across all open positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub position_count: usize,
    pub total_notional: Decimal,
    pub total_margin_used: Decimal,
    pub total_unrealized_pnl: Decimal,
    pub total_realized_pnl: Decimal,
    pub equity: Decimal,
    pub available_balance: Decimal,
    pub margin_utilization: Decimal,
    pub utilization_level: UtilizationLevel,
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

/// Positions, marks and the latest account snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub account: Option<AccountState>,
    pub positions: BTreeMap<Coin, Position>,
    pub marks: BTreeMap<Coin, Decimal>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    // -- mutators ----------------------------------------------------------

    pub fn set_account(&mut self, account: AccountState) {
        self.account = Some(account);
    }

    /// Replace the position set; closed positions are dropped
    pub fn set_positions(&mut self, positions: impl IntoIterator<Item = Position>) {
        self.positions = positions
            .into_iter()
            .filter(|p| !p.is_closed())
            .map(|p| (p.coin.clone(), p))
            .collect();
    }

    /// Record a mark price; non-positive prices are ignored
    pub fn set_mark(&mut self, coin: Coin, price: Decimal) {
        if price > Decimal::ZERO {
            self.marks.insert(coin, price);
        }
    }

    // -- queries -----------------------------------------------------------

    pub fn mark(&self, coin: &Coin) -> Option<Decimal> {
        self.marks.get(coin).copied()
    }

    /// Views of every open position, sorted by coin
    pub fn position_views(&self, thresholds: &RiskThresholds) -> Vec<PositionView> {
        self.positions
            .values()
            .map(|p| PositionView::new(p, self.mark(&p.coin), thresholds))
            .collect()
    }

    pub fn summary(&self, thresholds: &RiskThresholds) -> PortfolioSummary {
        let views = self.position_views(thresholds);

        let mut total_notional = Decimal::ZERO;
        let mut total_margin_used = Decimal::ZERO;
        let mut total_unrealized_pnl = Decimal::ZERO;
        let mut total_realized_pnl = Decimal::ZERO;
        for view in &views {
            total_notional += view.notional;
            total_margin_used += view.position.margin_used;
            total_unrealized_pnl += view.unrealized_pnl;
            total_realized_pnl += view.position.realized_pnl;
        }

        let account = self.account.clone().unwrap_or_default();
        let margin_utilization = round_display(account.margin_utilization());

        PortfolioSummary {
            position_count: views.len(),
            total_notional: round_display(total_notional),
            total_margin_used: round_display(total_margin_used),
            total_unrealized_pnl: round_display(total_unrealized_pnl),
            total_realized_pnl: round_display(total_realized_pnl),
            equity: account.equity,
            available_balance: account.available_balance,
            margin_utilization,
            utilization_level: utilization_level(margin_utilization),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Band a `margin_used / equity` ratio
pub fn utilization_level(ratio: Decimal) -> UtilizationLevel {
    if ratio < UTILIZATION_MEDIUM {
        UtilizationLevel::Low
    } else if ratio < UTILIZATION_HIGH {
        UtilizationLevel::Medium
    } else {
        UtilizationLevel::High
    }
}

fn round_display(v: Decimal) -> Decimal {
    v.round_dp_with_strategy(DISPLAY_DP, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
