//! Margin validation and order preview
//!
//! Required margin for a new order is `price × size ÷ leverage`; the order is
//! valid only when that fits in the account's available balance. The preview
//! adds the estimated liquidation price of the resulting position using a
//! tiered maintenance-margin table.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::numeric::format_usd;
use types::order::Side;
use types::position::PositionSide;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Display precision for preview figures
const DISPLAY_DP: u32 = 8;

// ---------------------------------------------------------------------------
// Maintenance margin rate table
// ---------------------------------------------------------------------------

/// Maintenance margin rate for a leverage tier
pub fn maintenance_margin_rate(leverage: u32) -> Decimal {
    match leverage {
        0..=10 => Decimal::new(5, 3),    // 0.5%
        11..=20 => Decimal::new(1, 2),   // 1.0%
        21..=50 => Decimal::new(2, 2),   // 2.0%
        51..=100 => Decimal::new(5, 2),  // 5.0%
        _ => Decimal::new(10, 2),        // 10.0%
    }
}

// ---------------------------------------------------------------------------
// Margin validator
// ---------------------------------------------------------------------------

/// Result of a margin check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginValidation {
    pub is_valid: bool,
    pub error: Option<String>,
    pub required_margin: Decimal,
    pub available_balance: Decimal,
}

/// Initial margin for an order: `price × size ÷ leverage`.
///
/// Returns `None` for non-positive inputs.
pub fn required_margin(price: Decimal, size: Decimal, leverage: u32) -> Option<Decimal> {
    if price <= Decimal::ZERO || size <= Decimal::ZERO || leverage == 0 {
        return None;
    }
    price
        .checked_mul(size)
        .and_then(|notional| notional.checked_div(Decimal::from(leverage)))
}

/// Validate that an order's required margin fits in `available_balance`.
///
/// `price` is the effective price: the order's limit price when set, else
/// the last known market price.
pub fn validate_margin(
    price: Decimal,
    size: Decimal,
    leverage: u32,
    available_balance: Decimal,
) -> MarginValidation {
    let Some(required) = required_margin(price, size, leverage) else {
        return MarginValidation {
            is_valid: false,
            error: Some("Invalid price, size, or leverage".to_string()),
            required_margin: Decimal::ZERO,
            available_balance,
        };
    };

    let error = (required > available_balance).then(|| {
        format!(
            "Insufficient margin. Required: ${}, Available: ${}",
            format_usd(required),
            format_usd(available_balance)
        )
    });

    MarginValidation {
        is_valid: error.is_none(),
        error,
        required_margin: required,
        available_balance,
    }
}

// ---------------------------------------------------------------------------
// Order preview
// ---------------------------------------------------------------------------

/// What an order would look like once filled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPreview {
    pub notional: Decimal,
    pub required_margin: Decimal,
    pub maintenance_margin: Decimal,
    /// Estimated liquidation price of the resulting position
    pub liquidation_price: Decimal,
    /// Balance left after posting the margin; negative means the order
    /// would be rejected
    pub remaining_balance: Decimal,
}

/// Preview an order; `None` when any of price, size or leverage is non-positive.
pub fn preview_order(
    side: Side,
    price: Decimal,
    size: Decimal,
    leverage: u32,
    available_balance: Decimal,
) -> Option<OrderPreview> {
    let required = required_margin(price, size, leverage)?;
    let notional = price * size;
    let mm_rate = maintenance_margin_rate(leverage);
    let liquidation_price =
        estimate_liquidation_price(side_to_position_side(side), price, leverage, mm_rate);

    Some(OrderPreview {
        notional: round_display(notional),
        required_margin: round_up(required, DISPLAY_DP),
        maintenance_margin: round_up(notional * mm_rate, DISPLAY_DP),
        liquidation_price: round_display(liquidation_price),
        remaining_balance: round_down(available_balance - required, DISPLAY_DP),
    })
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Estimated liquidation price of an isolated position.
///
/// LONG:  `entry × (1 − 1/leverage + mm_rate)`
/// SHORT: `entry × (1 + 1/leverage − mm_rate)`
pub fn estimate_liquidation_price(
    side: PositionSide,
    entry_price: Decimal,
    leverage: u32,
    mm_rate: Decimal,
) -> Decimal {
    let one = Decimal::ONE;
    let lev_inv = one / Decimal::from(leverage.max(1));
    match side {
        PositionSide::Long => (entry_price * (one - lev_inv + mm_rate)).max(Decimal::ZERO),
        PositionSide::Short => entry_price * (one + lev_inv - mm_rate),
    }
}

fn side_to_position_side(side: Side) -> PositionSide {
    match side {
        Side::Buy => PositionSide::Long,
        Side::Sell => PositionSide::Short,
    }
}

fn round_display(v: Decimal) -> Decimal {
    v.round_dp_with_strategy(DISPLAY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Margin requirements round away from zero
fn round_up(v: Decimal, dp: u32) -> Decimal {
    v.round_dp_with_strategy(dp, RoundingStrategy::AwayFromZero)
}

/// Balances round toward zero
fn round_down(v: Decimal, dp: u32) -> Decimal {
    v.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    #[test]
    fn test_required_margin_formula() {
        // 50 000 × 0.1 / 10 = 500
        assert_eq!(
            required_margin(Decimal::from(50_000), dec("0.1"), 10),
            Some(Decimal::from(500))
        );
    }

    #[test]
    fn test_insufficient_margin_message() {
        let result = validate_margin(Decimal::from(50_000), dec("0.1"), 10, Decimal::from(400));
        assert!(!result.is_valid);
        assert_eq!(result.required_margin, Decimal::from(500));
        let message = result.error.unwrap();
        assert!(message.contains("500.00"));
        assert!(message.contains("400.00"));
        assert_eq!(
            message,
            "Insufficient margin. Required: $500.00, Available: $400.00"
        );
    }

    #[test]
    fn test_margin_exactly_available_is_valid() {
        let result = validate_margin(Decimal::from(50_000), dec("0.1"), 10, Decimal::from(500));
        assert!(result.is_valid);
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_margin_non_positive_inputs() {
        for (price, size, leverage) in [
            (Decimal::ZERO, dec("0.1"), 10),
            (Decimal::from(50_000), Decimal::ZERO, 10),
            (Decimal::from(50_000), dec("0.1"), 0),
            (Decimal::from(-1), dec("0.1"), 10),
        ] {
            let result = validate_margin(price, size, leverage, Decimal::from(1_000_000));
            assert!(!result.is_valid);
            assert_eq!(result.error.as_deref(), Some("Invalid price, size, or leverage"));
        }
    }

    #[test]
    fn test_higher_leverage_needs_less_margin() {
        let at_5 = validate_margin(Decimal::from(3_000), Decimal::from(2), 5, Decimal::from(1_000));
        let at_10 = validate_margin(Decimal::from(3_000), Decimal::from(2), 10, Decimal::from(1_000));
        assert!(!at_5.is_valid);
        assert!(at_10.is_valid);
        assert!(at_10.required_margin < at_5.required_margin);
    }

    #[test]
    fn test_maintenance_margin_rate_tiers() {
        assert_eq!(maintenance_margin_rate(5), dec("0.005"));
        assert_eq!(maintenance_margin_rate(15), dec("0.01"));
        assert_eq!(maintenance_margin_rate(30), dec("0.02"));
        assert_eq!(maintenance_margin_rate(75), dec("0.05"));
        assert_eq!(maintenance_margin_rate(110), dec("0.10"));
    }

    #[test]
    fn test_liquidation_price_long() {
        let liq = estimate_liquidation_price(PositionSide::Long, Decimal::from(50_000), 10, dec("0.005"));
        // 50 000 × (1 − 0.1 + 0.005) = 45 250
        assert_eq!(round_display(liq), Decimal::from(45_250));
    }

    #[test]
    fn test_liquidation_price_short() {
        let liq = estimate_liquidation_price(PositionSide::Short, Decimal::from(50_000), 10, dec("0.005"));
        // 50 000 × (1 + 0.1 − 0.005) = 54 750
        assert_eq!(round_display(liq), Decimal::from(54_750));
    }

    #[test]
    fn test_preview_order() {
        let preview = preview_order(Side::Buy, Decimal::from(3_000), Decimal::from(10), 20, Decimal::from(2_000))
            .unwrap();
        assert_eq!(preview.notional, Decimal::from(30_000));
        assert_eq!(preview.required_margin, Decimal::from(1_500));
        // 30 000 × 1% = 300
        assert_eq!(preview.maintenance_margin, Decimal::from(300));
        // 3 000 × (1 − 0.05 + 0.01) = 2 880
        assert_eq!(preview.liquidation_price, Decimal::from(2_880));
        assert_eq!(preview.remaining_balance, Decimal::from(500));
    }

    #[test]
    fn test_preview_negative_balance() {
        let preview = preview_order(Side::Sell, Decimal::from(50_000), Decimal::ONE, 10, Decimal::from(100))
            .unwrap();
        assert!(preview.remaining_balance < Decimal::ZERO);
    }

    #[test]
    fn test_preview_rejects_bad_inputs() {
        assert!(preview_order(Side::Buy, Decimal::ZERO, Decimal::ONE, 10, Decimal::from(100)).is_none());
        assert!(preview_order(Side::Buy, Decimal::ONE, Decimal::ONE, 0, Decimal::from(100)).is_none());
    }
}
