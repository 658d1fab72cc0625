//! Trading request bodies for the `/api/trade` endpoints
//!
//! Every body carries the wallet signature and a timestamp for replay
//! protection. `validate()` applies the structural rules the backend
//! enforces before anything reaches the exchange.

use crate::errors::RequestError;
use crate::ids::{ClientOrderId, Coin, OrderId};
use crate::order::{OrderType, TimeInForce};
use crate::position::MarginType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upper bound on any order or position size change
pub const MAX_ORDER_SIZE: u64 = 1_000_000;

/// Signature envelope shared by every trading request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAuth {
    /// Hex signature from the wallet
    pub signature: String,
    /// Unix seconds
    pub timestamp: i64,
}

/// Body of `POST /api/trade/place`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub coin: Coin,
    pub is_buy: bool,
    /// Zero for market orders
    #[serde(default)]
    pub limit_px: Decimal,
    pub sz: Decimal,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_px: Option<Decimal>,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub post_only: bool,
    #[serde(default)]
    pub tif: TimeInForce,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloid: Option<ClientOrderId>,
    #[serde(flatten)]
    pub auth: RequestAuth,
}

impl PlaceOrderRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        validate_size(self.sz)?;

        match self.order_type {
            OrderType::Market if !self.limit_px.is_zero() => {
                return Err(RequestError::MarketOrderWithPrice)
            }
            OrderType::Limit if self.limit_px <= Decimal::ZERO => {
                return Err(RequestError::LimitOrderWithoutPrice)
            }
            _ => {}
        }

        if self.order_type.is_stop() && self.stop_px.is_none() {
            return Err(RequestError::StopOrderWithoutTrigger);
        }

        if self.post_only {
            if self.order_type != OrderType::Limit {
                return Err(RequestError::PostOnlyRequiresLimit);
            }
            if self.tif.is_immediate() {
                return Err(RequestError::PostOnlyWithImmediateTif);
            }
        }

        Ok(())
    }
}

/// Body of `POST /api/trade/cancel`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub coin: Coin,
    pub oid: OrderId,
    #[serde(flatten)]
    pub auth: RequestAuth,
}

impl CancelRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        validate_oid(self.oid)
    }
}

/// Body of `POST /api/trade/modify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRequest {
    pub coin: Coin,
    pub oid: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_px: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_sz: Option<Decimal>,
    #[serde(flatten)]
    pub auth: RequestAuth,
}

impl ModifyRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        validate_oid(self.oid)?;
        if self.new_px.is_none() && self.new_sz.is_none() {
            return Err(RequestError::EmptyModification);
        }
        if let Some(sz) = self.new_sz {
            validate_size(sz)?;
        }
        Ok(())
    }
}

/// Body of `POST /api/trade/cancel-all`; `coin: None` cancels every market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelAllRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin: Option<Coin>,
    #[serde(flatten)]
    pub auth: RequestAuth,
}

/// Body of `POST /api/trade/close-position`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosePositionRequest {
    pub coin: Coin,
    #[serde(flatten)]
    pub auth: RequestAuth,
}

/// Add to or reduce an open position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyPositionRequest {
    pub coin: Coin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_size: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce_size: Option<Decimal>,
    #[serde(flatten)]
    pub auth: RequestAuth,
}

impl ModifyPositionRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        match (self.add_size, self.reduce_size) {
            (None, None) => Err(RequestError::MissingSizeChange),
            (Some(_), Some(_)) => Err(RequestError::ConflictingSizeChange),
            (Some(sz), None) | (None, Some(sz)) => validate_size(sz),
        }
    }

    /// Signed size delta: positive adds, negative reduces
    pub fn size_delta(&self) -> Decimal {
        self.add_size.unwrap_or(Decimal::ZERO) - self.reduce_size.unwrap_or(Decimal::ZERO)
    }
}

/// Switch a coin between cross and isolated margin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMarginModeRequest {
    pub coin: Coin,
    pub margin_type: MarginType,
    #[serde(flatten)]
    pub auth: RequestAuth,
}

/// Response envelope for every trading endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeResponse {
    pub success: bool,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub message: Option<String>,
}

fn validate_size(sz: Decimal) -> Result<(), RequestError> {
    if sz <= Decimal::ZERO || sz > Decimal::from(MAX_ORDER_SIZE) {
        return Err(RequestError::SizeOutOfRange {
            max: MAX_ORDER_SIZE.to_string(),
        });
    }
    Ok(())
}

fn validate_oid(oid: OrderId) -> Result<(), RequestError> {
    if oid.0 == 0 {
        return Err(RequestError::InvalidOrderId);
    }
    Ok(())
}
