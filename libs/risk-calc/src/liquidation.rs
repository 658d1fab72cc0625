//! Liquidation risk classification
//!
//! Distance from mark to liquidation price, as a percentage of mark, is
//! bucketed into four ordered severity levels. The cutoffs are UI
//! thresholds rather than exchange rules, so they are carried in a
//! configurable [`RiskThresholds`] value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::position::{Position, PositionSide};
use types::risk::{LiquidationRisk, RiskLevel};

// ── Thresholds ──────────────────────────────────────────────────────────

/// Distance cutoffs in percent. A distance below `medium` is at least
/// Medium, below `high` at least High, below `critical` Critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub medium: Decimal,
    pub high: Decimal,
    pub critical: Decimal,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: Decimal::from(10),
            high: Decimal::from(5),
            critical: Decimal::from(2),
        }
    }
}

impl RiskThresholds {
    /// Cutoffs must be positive and strictly decreasing
    pub fn is_well_ordered(&self) -> bool {
        self.critical > Decimal::ZERO && self.high > self.critical && self.medium > self.high
    }

    /// Bucket a distance percentage into a severity level
    pub fn level_for(&self, distance_percent: Decimal) -> RiskLevel {
        if distance_percent >= self.medium {
            RiskLevel::Low
        } else if distance_percent >= self.high {
            RiskLevel::Medium
        } else if distance_percent >= self.critical {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }
}

// ── Classification ──────────────────────────────────────────────────────

/// `|mark − liquidation| / mark × 100`
///
/// A zero liquidation price means the exchange reported none; the
/// position is then treated as fully distant (100 %). Returns `None` for
/// a non-positive mark.
pub fn liquidation_distance_percent(mark_price: Decimal, liquidation_price: Decimal) -> Option<Decimal> {
    if mark_price <= Decimal::ZERO {
        return None;
    }
    if liquidation_price <= Decimal::ZERO {
        return Some(Decimal::ONE_HUNDRED);
    }
    ((mark_price - liquidation_price).abs() * Decimal::ONE_HUNDRED).checked_div(mark_price)
}

/// True when the mark has already moved through the liquidation price
pub fn is_past_liquidation(side: PositionSide, mark_price: Decimal, liquidation_price: Decimal) -> bool {
    if liquidation_price <= Decimal::ZERO {
        return false;
    }
    match side {
        PositionSide::Long => mark_price <= liquidation_price,
        PositionSide::Short => mark_price >= liquidation_price,
    }
}

/// Classify the liquidation risk of a position side at `mark_price`
pub fn classify_liquidation_risk(
    side: PositionSide,
    mark_price: Decimal,
    liquidation_price: Decimal,
    thresholds: &RiskThresholds,
) -> Option<LiquidationRisk> {
    let distance_percent = liquidation_distance_percent(mark_price, liquidation_price)?;
    let risk_level = if is_past_liquidation(side, mark_price, liquidation_price) {
        RiskLevel::Critical
    } else {
        thresholds.level_for(distance_percent)
    };
    Some(LiquidationRisk {
        risk_level,
        distance_percent,
    })
}

/// Classify an open position; closed positions carry no risk
pub fn position_liquidation_risk(
    position: &Position,
    mark_price: Decimal,
    thresholds: &RiskThresholds,
) -> Option<LiquidationRisk> {
    if position.is_closed() {
        return None;
    }
    classify_liquidation_risk(position.side, mark_price, position.liquidation_price, thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Coin;
    use types::position::MarginType;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn btc_long() -> Position {
        Position {
            coin: Coin::new("BTC"),
            side: PositionSide::Long,
            entry_price: Decimal::from(94_500),
            size: dec("0.5"),
            leverage: 10,
            margin_used: Decimal::from(4_725),
            unrealized_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            liquidation_price: Decimal::from(85_050),
            margin_type: MarginType::Cross,
        }
    }

    #[test]
    fn test_ten_percent_is_low() {
        let risk = classify_liquidation_risk(
            PositionSide::Long,
            Decimal::from(50_000),
            Decimal::from(45_000),
            &RiskThresholds::default(),
        )
        .unwrap();
        assert_eq!(risk.distance_percent, Decimal::from(10));
        assert_eq!(risk.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_threshold_bands() {
        let thresholds = RiskThresholds::default();
        assert_eq!(thresholds.level_for(dec("9.99")), RiskLevel::Medium);
        assert_eq!(thresholds.level_for(Decimal::from(5)), RiskLevel::Medium);
        assert_eq!(thresholds.level_for(dec("4.5")), RiskLevel::High);
        assert_eq!(thresholds.level_for(Decimal::from(2)), RiskLevel::High);
        assert_eq!(thresholds.level_for(dec("1.99")), RiskLevel::Critical);
    }

    #[test]
    fn test_short_mirrors_long() {
        let thresholds = RiskThresholds::default();
        let long = classify_liquidation_risk(PositionSide::Long, Decimal::from(100), Decimal::from(97), &thresholds);
        let short = classify_liquidation_risk(PositionSide::Short, Decimal::from(100), Decimal::from(103), &thresholds);
        assert_eq!(long, short);
        assert_eq!(long.unwrap().risk_level, RiskLevel::High);
    }

    #[test]
    fn test_crossed_liquidation_is_critical() {
        let thresholds = RiskThresholds::default();
        // long whose mark fell 20% below its liquidation price
        let long = classify_liquidation_risk(PositionSide::Long, Decimal::from(80), Decimal::from(100), &thresholds)
            .unwrap();
        assert_eq!(long.risk_level, RiskLevel::Critical);
        let short = classify_liquidation_risk(PositionSide::Short, Decimal::from(120), Decimal::from(100), &thresholds)
            .unwrap();
        assert_eq!(short.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_no_liquidation_price_is_low() {
        let risk = classify_liquidation_risk(
            PositionSide::Short,
            Decimal::from(3_500),
            Decimal::ZERO,
            &RiskThresholds::default(),
        )
        .unwrap();
        assert_eq!(risk.distance_percent, Decimal::ONE_HUNDRED);
        assert_eq!(risk.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_non_positive_mark_is_unclassified() {
        let thresholds = RiskThresholds::default();
        assert!(classify_liquidation_risk(PositionSide::Long, Decimal::ZERO, Decimal::from(10), &thresholds).is_none());
        assert!(classify_liquidation_risk(PositionSide::Long, Decimal::from(-5), Decimal::from(10), &thresholds).is_none());
    }

    #[test]
    fn test_position_risk() {
        let position = btc_long();
        let thresholds = RiskThresholds::default();

        // (95 000 − 85 050) / 95 000 ≈ 10.47% → low
        let risk = position_liquidation_risk(&position, Decimal::from(95_000), &thresholds).unwrap();
        assert_eq!(risk.risk_level, RiskLevel::Low);

        // (87 000 − 85 050) / 87 000 ≈ 2.24% → high
        let risk = position_liquidation_risk(&position, Decimal::from(87_000), &thresholds).unwrap();
        assert_eq!(risk.risk_level, RiskLevel::High);

        let mut closed = position;
        closed.size = Decimal::ZERO;
        assert!(position_liquidation_risk(&closed, Decimal::from(87_000), &thresholds).is_none());
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = RiskThresholds {
            medium: Decimal::from(20),
            high: Decimal::from(15),
            critical: Decimal::from(5),
        };
        assert!(thresholds.is_well_ordered());
        assert_eq!(thresholds.level_for(Decimal::from(12)), RiskLevel::High);
        assert!(RiskThresholds::default().is_well_ordered());

        let inverted = RiskThresholds {
            medium: Decimal::from(2),
            high: Decimal::from(5),
            critical: Decimal::from(10),
        };
        assert!(!inverted.is_well_ordered());
    }
}
