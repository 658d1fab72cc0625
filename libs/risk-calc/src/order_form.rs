//! Order-entry form state and the validation aggregator
//!
//! The form holds raw strings exactly as typed (after precision
//! truncation). Every validator is re-run against the current form and a
//! [`ValidationContext`] snapshot; nothing is cached between runs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::account::AccountState;
use types::asset::{AssetInfo, DEFAULT_PRICE_DECIMALS, DEFAULT_SIZE_DECIMALS};
use types::errors::RequestError;
use types::ids::{ClientOrderId, Coin};
use types::numeric::parse_decimal;
use types::order::{OrderType, Side, TimeInForce};
use types::position::Position;
use types::request::{PlaceOrderRequest, RequestAuth};

use crate::constraints::{validate_post_only, validate_reduce_only};
use crate::leverage::validate_leverage;
use crate::margin::{preview_order, validate_margin, OrderPreview};
use crate::precision::truncate_decimals;
use crate::size::validate_size;
use crate::validation::{positive_decimal, validate_price_precision, ValidationResult};

/// Leverage preselected on a fresh form
pub const DEFAULT_FORM_LEVERAGE: u32 = 10;

/// Reasons a form cannot be turned into a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("order form has {} validation error(s): {}", .0.len(), .0.join("; "))]
    Invalid(Vec<String>),

    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Transient state of the order-entry form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFormState {
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub price: String,
    pub stop_price: String,
    pub size: String,
    pub leverage: u32,
    pub reduce_only: bool,
    pub post_only: bool,
    pub time_in_force: TimeInForce,
}

impl Default for OrderFormState {
    fn default() -> Self {
        Self {
            side: Side::Buy,
            order_type: OrderType::Limit,
            price: String::new(),
            stop_price: String::new(),
            size: String::new(),
            leverage: DEFAULT_FORM_LEVERAGE,
            reduce_only: false,
            post_only: false,
            time_in_force: TimeInForce::GTC,
        }
    }
}

/// Everything outside the form that validation depends on
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    pub asset: Option<&'a AssetInfo>,
    pub account: Option<&'a AccountState>,
    pub positions: &'a [Position],
    /// Last known market price for the form's coin
    pub mark_price: Option<Decimal>,
}

impl ValidationContext<'_> {
    fn price_decimals(&self) -> u32 {
        self.asset.map_or(DEFAULT_PRICE_DECIMALS, |a| a.price_decimals)
    }

    fn size_decimals(&self) -> u32 {
        self.asset.map_or(DEFAULT_SIZE_DECIMALS, |a| a.size_decimals)
    }

    fn available_balance(&self) -> Decimal {
        self.account.map_or(Decimal::ZERO, |a| a.available_balance)
    }
}

impl OrderFormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limit price, truncated to the asset's price decimals
    pub fn set_price(&mut self, raw: &str, ctx: &ValidationContext<'_>) {
        self.price = truncate_decimals(raw.trim(), ctx.price_decimals());
    }

    /// Set the stop trigger price, truncated to the asset's price decimals
    pub fn set_stop_price(&mut self, raw: &str, ctx: &ValidationContext<'_>) {
        self.stop_price = truncate_decimals(raw.trim(), ctx.price_decimals());
    }

    /// Set the size, truncated to the asset's size decimals
    pub fn set_size(&mut self, raw: &str, ctx: &ValidationContext<'_>) {
        self.size = truncate_decimals(raw.trim(), ctx.size_decimals());
    }

    pub fn set_leverage(&mut self, leverage: u32) {
        self.leverage = leverage;
    }

    /// Clear per-order inputs after submission; side, type and leverage stay
    pub fn reset(&mut self) {
        *self = Self {
            side: self.side,
            order_type: self.order_type,
            leverage: self.leverage,
            ..Self::default()
        };
    }

    /// Limit price when one applies to this order type and is positive
    pub fn limit_price(&self) -> Option<Decimal> {
        if self.order_type.has_limit_price() {
            positive_decimal(&self.price)
        } else {
            None
        }
    }

    /// Price used for margin: the order's own price, else the market price
    pub fn effective_price(&self, mark_price: Option<Decimal>) -> Option<Decimal> {
        self.limit_price().or(mark_price.filter(|px| *px > Decimal::ZERO))
    }

    /// Margin preview of the order as currently entered
    pub fn preview(&self, ctx: &ValidationContext<'_>) -> Option<OrderPreview> {
        let price = self.effective_price(ctx.mark_price)?;
        let size = positive_decimal(&self.size)?;
        preview_order(self.side, price, size, self.leverage, ctx.available_balance())
    }

    /// Build the request body; fails if any validator reports an error
    pub fn to_place_request(
        &self,
        coin: &Coin,
        ctx: &ValidationContext<'_>,
        auth: RequestAuth,
    ) -> Result<PlaceOrderRequest, FormError> {
        let errors = all_validation_errors(self, ctx);
        if !errors.is_empty() {
            return Err(FormError::Invalid(errors));
        }

        let stop_px = if self.order_type.is_stop() {
            positive_decimal(&self.stop_price)
        } else {
            None
        };

        let request = PlaceOrderRequest {
            coin: coin.clone(),
            is_buy: self.side.is_buy(),
            limit_px: self.limit_price().unwrap_or(Decimal::ZERO),
            sz: parse_decimal(&self.size).unwrap_or(Decimal::ZERO),
            order_type: self.order_type,
            stop_px,
            reduce_only: self.reduce_only,
            post_only: self.post_only,
            tif: self.time_in_force,
            cloid: Some(ClientOrderId::new()),
            auth,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Collect the first error from each validator, in fixed order:
/// margin, reduce-only, post-only, leverage, size, decimal precision.
pub fn all_validation_errors(form: &OrderFormState, ctx: &ValidationContext<'_>) -> Vec<String> {
    let margin = match (form.effective_price(ctx.mark_price), positive_decimal(&form.size)) {
        (Some(price), Some(size)) => {
            validate_margin(price, size, form.leverage, ctx.available_balance()).error
        }
        // no size yet: the size validator reports it
        (_, None) => None,
        (None, Some(_)) => Some("Price unavailable for margin calculation".to_string()),
    };

    let reduce_only = validate_reduce_only(form.reduce_only, ctx.positions).error;
    let post_only = validate_post_only(
        form.post_only,
        form.order_type,
        positive_decimal(&form.price),
        form.time_in_force,
    )
    .error;
    let leverage = validate_leverage(form.leverage, ctx.asset.map(|a| a.max_leverage)).error;
    let size = validate_size(
        &form.size,
        ctx.asset.map(|a| a.min_size),
        ctx.asset.map(|a| a.size_decimals),
    )
    .error;
    let precision = price_precision(form, ctx.price_decimals()).error;

    [margin, reduce_only, post_only, leverage, size, precision]
        .into_iter()
        .flatten()
        .collect()
}

fn price_precision(form: &OrderFormState, price_decimals: u32) -> ValidationResult {
    // market and stop-market orders never send the price field
    if form.order_type.has_limit_price() {
        let price = validate_price_precision("Price", &form.price, price_decimals);
        if !price.is_valid {
            return price;
        }
    }
    if form.order_type.is_stop() {
        return validate_price_precision("Stop price", &form.stop_price, price_decimals);
    }
    ValidationResult::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use types::position::{MarginType, PositionSide};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn btc_asset() -> AssetInfo {
        AssetInfo {
            size_decimals: 4,
            price_decimals: 1,
            min_size: dec("0.001"),
            max_leverage: 50,
            ..AssetInfo::with_defaults(Coin::new("BTC"))
        }
    }

    fn account(available: u64) -> AccountState {
        AccountState {
            equity: Decimal::from(available),
            margin_used: Decimal::ZERO,
            available_balance: Decimal::from(available),
            withdrawable: Decimal::from(available),
            cross_margin_summary: BTreeMap::new(),
        }
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

    fn auth() -> RequestAuth {
        RequestAuth {
            signature: "0x".to_string() + &"ab".repeat(65),
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn test_form_defaults() {
        let form = OrderFormState::new();
        assert_eq!(form.order_type, OrderType::Limit);
        assert_eq!(form.time_in_force, TimeInForce::GTC);
        assert_eq!(form.leverage, 10);
        assert!(form.size.is_empty());
    }

    #[test]
    fn test_form_json_shape() {
        let json = serde_json::to_value(OrderFormState::new()).unwrap();
        assert_eq!(json["side"], "B");
        assert_eq!(json["type"], "limit");
        assert_eq!(json["timeInForce"], "GTC");
        assert_eq!(json["reduceOnly"], false);
    }

    #[test]
    fn test_setters_truncate_to_asset_precision() {
        let asset = btc_asset();
        let ctx = ValidationContext {
            asset: Some(&asset),
            ..Default::default()
        };
        let mut form = OrderFormState::new();
        form.set_price("95000.567", &ctx);
        form.set_size("0.12345", &ctx);
        assert_eq!(form.price, "95000.5");
        assert_eq!(form.size, "0.1234");
    }

    #[test]
    fn test_reset_keeps_side_type_and_leverage() {
        let mut form = OrderFormState {
            side: Side::Sell,
            order_type: OrderType::StopLimit,
            price: "100".into(),
            stop_price: "99".into(),
            size: "1".into(),
            leverage: 25,
            reduce_only: true,
            post_only: false,
            time_in_force: TimeInForce::IOC,
        };
        form.reset();
        assert_eq!(form.side, Side::Sell);
        assert_eq!(form.order_type, OrderType::StopLimit);
        assert_eq!(form.leverage, 25);
        assert!(form.price.is_empty() && form.stop_price.is_empty() && form.size.is_empty());
        assert!(!form.reduce_only);
        assert_eq!(form.time_in_force, TimeInForce::GTC);
    }

    #[test]
    fn test_valid_form_has_no_errors() {
        let asset = btc_asset();
        let acct = account(10_000);
        let ctx = ValidationContext {
            asset: Some(&asset),
            account: Some(&acct),
            positions: &[],
            mark_price: Some(Decimal::from(95_000)),
        };
        let form = OrderFormState {
            price: "95000".into(),
            size: "0.1".into(),
            ..OrderFormState::new()
        };
        assert!(all_validation_errors(&form, &ctx).is_empty());
    }

    #[test]
    fn test_errors_follow_fixed_order() {
        let asset = btc_asset();
        let acct = account(400);
        let ctx = ValidationContext {
            asset: Some(&asset),
            account: Some(&acct),
            positions: &[],
            mark_price: None,
        };
        let form = OrderFormState {
            order_type: OrderType::Market,
            price: "50000.55".into(),
            size: "0.1".into(),
            leverage: 60,
            reduce_only: true,
            post_only: true,
            ..OrderFormState::new()
        };
        let errors = all_validation_errors(&form, &ctx);
        assert_eq!(errors.len(), 4);
        // market order has no own price and no mark yet
        assert_eq!(errors[0], "Price unavailable for margin calculation");
        assert_eq!(errors[1], "Reduce-only orders require an open position");
        assert_eq!(errors[2], "Post-only is only available for limit orders");
        assert_eq!(errors[3], "Leverage exceeds maximum allowed (50x)");

        let limit = OrderFormState {
            order_type: OrderType::Limit,
            post_only: false,
            ..form
        };
        assert_eq!(
            all_validation_errors(&limit, &ctx).last().map(String::as_str),
            Some("Price exceeds maximum precision of 1 decimal places")
        );
    }

    #[test]
    fn test_market_orders_skip_price_precision() {
        let asset = btc_asset();
        let acct = account(100_000);
        let ctx = ValidationContext {
            asset: Some(&asset),
            account: Some(&acct),
            positions: &[],
            mark_price: Some(Decimal::from(95_000)),
        };
        for (order_type, price) in [(OrderType::Market, "abc"), (OrderType::StopMarket, "95000.123")] {
            let form = OrderFormState {
                order_type,
                price: price.into(),
                stop_price: "94000.5".into(),
                size: "0.1".into(),
                time_in_force: TimeInForce::IOC,
                ..OrderFormState::new()
            };
            assert!(all_validation_errors(&form, &ctx).is_empty(), "{order_type:?}");
        }
    }

    #[test]
    fn test_margin_uses_mark_price_for_market_orders() {
        let acct = account(400);
        let ctx = ValidationContext {
            account: Some(&acct),
            mark_price: Some(Decimal::from(50_000)),
            ..Default::default()
        };
        let form = OrderFormState {
            order_type: OrderType::Market,
            size: "0.1".into(),
            ..OrderFormState::new()
        };
        let errors = all_validation_errors(&form, &ctx);
        assert_eq!(
            errors,
            vec!["Insufficient margin. Required: $500.00, Available: $400.00".to_string()]
        );
    }

    #[test]
    fn test_missing_account_means_zero_balance() {
        let ctx = ValidationContext {
            mark_price: Some(Decimal::from(100)),
            ..Default::default()
        };
        let form = OrderFormState {
            price: "100".into(),
            size: "1".into(),
            ..OrderFormState::new()
        };
        let errors = all_validation_errors(&form, &ctx);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Insufficient margin"));
    }

    #[test]
    fn test_empty_size_reported_once() {
        let ctx = ValidationContext::default();
        let form = OrderFormState {
            price: "100".into(),
            ..OrderFormState::new()
        };
        assert_eq!(all_validation_errors(&form, &ctx), vec!["Size must be a valid number".to_string()]);
    }

    #[test]
    fn test_stop_price_precision() {
        let acct = account(100_000);
        let ctx = ValidationContext {
            account: Some(&acct),
            ..Default::default()
        };
        let form = OrderFormState {
            order_type: OrderType::StopLimit,
            price: "100.5".into(),
            stop_price: "99.123".into(),
            size: "1".into(),
            ..OrderFormState::new()
        };
        assert_eq!(
            all_validation_errors(&form, &ctx),
            vec!["Stop price exceeds maximum precision of 2 decimal places".to_string()]
        );
    }

    #[test]
    fn test_reduce_only_with_position_passes() {
        let acct = account(100_000);
        let positions = [btc_long()];
        let ctx = ValidationContext {
            account: Some(&acct),
            positions: &positions,
            ..Default::default()
        };
        let form = OrderFormState {
            side: Side::Sell,
            price: "95000".into(),
            size: "0.5".into(),
            reduce_only: true,
            ..OrderFormState::new()
        };
        assert!(all_validation_errors(&form, &ctx).is_empty());
    }

    #[test]
    fn test_to_place_request_limit() {
        let asset = btc_asset();
        let acct = account(10_000);
        let ctx = ValidationContext {
            asset: Some(&asset),
            account: Some(&acct),
            ..Default::default()
        };
        let form = OrderFormState {
            side: Side::Sell,
            price: "95000.5".into(),
            size: "0.1".into(),
            post_only: true,
            ..OrderFormState::new()
        };
        let request = form.to_place_request(&Coin::new("BTC"), &ctx, auth()).unwrap();
        assert!(!request.is_buy);
        assert_eq!(request.limit_px, dec("95000.5"));
        assert_eq!(request.sz, dec("0.1"));
        assert!(request.post_only);
        assert!(request.cloid.is_some());
        assert_eq!(request.stop_px, None);
    }

    #[test]
    fn test_to_place_request_market_has_zero_price() {
        let acct = account(10_000);
        let ctx = ValidationContext {
            account: Some(&acct),
            mark_price: Some(Decimal::from(3_500)),
            ..Default::default()
        };
        let form = OrderFormState {
            order_type: OrderType::Market,
            price: "3400".into(),
            size: "1".into(),
            time_in_force: TimeInForce::IOC,
            ..OrderFormState::new()
        };
        let request = form.to_place_request(&Coin::new("ETH"), &ctx, auth()).unwrap();
        assert_eq!(request.limit_px, Decimal::ZERO);
        assert_eq!(request.order_type, OrderType::Market);
    }

    #[test]
    fn test_to_place_request_refuses_invalid_form() {
        let ctx = ValidationContext::default();
        let form = OrderFormState::new();
        match form.to_place_request(&Coin::new("BTC"), &ctx, auth()) {
            Err(FormError::Invalid(errors)) => assert!(!errors.is_empty()),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_to_place_request_structural_error() {
        let acct = account(100_000);
        let ctx = ValidationContext {
            account: Some(&acct),
            mark_price: Some(Decimal::from(100)),
            ..Default::default()
        };
        // stop order with no trigger passes the form validators but not the body rules
        let form = OrderFormState {
            order_type: OrderType::StopMarket,
            size: "1".into(),
            ..OrderFormState::new()
        };
        assert_eq!(
            form.to_place_request(&Coin::new("BTC"), &ctx, auth()),
            Err(FormError::Request(RequestError::StopOrderWithoutTrigger))
        );
    }

    #[test]
    fn test_preview_from_form() {
        let acct = account(2_000);
        let ctx = ValidationContext {
            account: Some(&acct),
            ..Default::default()
        };
        let form = OrderFormState {
            price: "3000".into(),
            size: "10".into(),
            leverage: 20,
            ..OrderFormState::new()
        };
        let preview = form.preview(&ctx).unwrap();
        assert_eq!(preview.required_margin, Decimal::from(1_500));
        assert!(OrderFormState::new().preview(&ctx).is_none());
    }
}
