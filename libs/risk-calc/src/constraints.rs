//! Reduce-only and post-only order flag checks
//!
//! Neither check looks at live book depth: reduce-only only requires that
//! some position exists, and post-only does not test whether the price
//! would cross the spread.

use rust_decimal::Decimal;
use types::order::{OrderType, TimeInForce};
use types::position::Position;

use crate::validation::ValidationResult;

/// Reduce-only orders need an open position to reduce.
///
/// Any open position satisfies the check; coin and direction are not
/// compared.
pub fn validate_reduce_only(reduce_only: bool, positions: &[Position]) -> ValidationResult {
    if !reduce_only {
        return ValidationResult::ok();
    }
    if positions.iter().all(Position::is_closed) {
        return ValidationResult::fail("Reduce-only orders require an open position");
    }
    ValidationResult::ok()
}

/// Post-only orders must be limit orders with a positive limit price and a
/// resting time in force.
pub fn validate_post_only(
    post_only: bool,
    order_type: OrderType,
    limit_price: Option<Decimal>,
    tif: TimeInForce,
) -> ValidationResult {
    if !post_only {
        return ValidationResult::ok();
    }
    if order_type != OrderType::Limit {
        return ValidationResult::fail("Post-only is only available for limit orders");
    }
    if !limit_price.is_some_and(|px| px > Decimal::ZERO) {
        return ValidationResult::fail("Post-only orders require a valid limit price");
    }
    if tif.is_immediate() {
        return ValidationResult::fail("Post-only orders cannot use IOC or FOK");
    }
    ValidationResult::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Coin;
    use types::position::{MarginType, PositionSide};

    fn position(size: &str) -> Position {
        Position {
            coin: Coin::new("BTC"),
            side: PositionSide::Long,
            entry_price: Decimal::from(94_500),
            size: Decimal::from_str_exact(size).unwrap(),
            leverage: 10,
            margin_used: Decimal::from(4_725),
            unrealized_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            liquidation_price: Decimal::from(85_050),
            margin_type: MarginType::Cross,
        }
    }

    #[test]
    fn test_reduce_only_off_always_passes() {
        assert!(validate_reduce_only(false, &[]).is_valid);
    }

    #[test]
    fn test_reduce_only_without_positions() {
        let result = validate_reduce_only(true, &[]);
        assert!(!result.is_valid);
        assert_eq!(
            result.error.as_deref(),
            Some("Reduce-only orders require an open position")
        );
        assert!(!validate_reduce_only(true, &[position("0")]).is_valid);
    }

    #[test]
    fn test_reduce_only_with_any_position() {
        assert!(validate_reduce_only(true, &[position("0.5")]).is_valid);
    }

    #[test]
    fn test_post_only_limit_with_price() {
        let result = validate_post_only(true, OrderType::Limit, Some(Decimal::from(3_400)), TimeInForce::GTC);
        assert!(result.is_valid);
    }

    #[test]
    fn test_post_only_rejects_non_limit() {
        for order_type in [OrderType::Market, OrderType::StopLimit, OrderType::StopMarket] {
            let result = validate_post_only(true, order_type, Some(Decimal::from(3_400)), TimeInForce::GTC);
            assert_eq!(
                result.error.as_deref(),
                Some("Post-only is only available for limit orders")
            );
        }
    }

    #[test]
    fn test_post_only_requires_price() {
        assert!(!validate_post_only(true, OrderType::Limit, None, TimeInForce::GTC).is_valid);
        assert!(!validate_post_only(true, OrderType::Limit, Some(Decimal::ZERO), TimeInForce::GTC).is_valid);
    }

    #[test]
    fn test_post_only_rejects_immediate_tif() {
        let result = validate_post_only(true, OrderType::Limit, Some(Decimal::ONE), TimeInForce::IOC);
        assert_eq!(result.error.as_deref(), Some("Post-only orders cannot use IOC or FOK"));
        assert!(!validate_post_only(true, OrderType::Limit, Some(Decimal::ONE), TimeInForce::FOK).is_valid);
    }

    #[test]
    fn test_post_only_off_ignores_everything() {
        assert!(validate_post_only(false, OrderType::Market, None, TimeInForce::IOC).is_valid);
    }
}
