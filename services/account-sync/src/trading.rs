//! Order entry and position management
//!
//! The desk validates against the latest dashboard snapshot, signs the
//! body and posts it. A response with `success: false` is an error; the
//! next poll picks up the resulting account changes.

use std::sync::Arc;

use risk_calc::{all_validation_errors, FormError, OrderFormState, ValidationContext};
use rust_decimal::Decimal;
use tracing::{info, warn};
use types::asset::AssetInfo;
use types::ids::{Coin, OrderId};
use types::position::MarginType;
use types::request::{
    CancelAllRequest, CancelRequest, ClosePositionRequest, ModifyPositionRequest, ModifyRequest,
    RequestAuth, SetMarginModeRequest, TradeResponse,
};

use crate::api::ExchangeApi;
use crate::error::{SyncError, SyncResult};
use crate::signer::{is_valid_signature, MockSigner};
use crate::state::{DashboardSnapshot, DashboardState};

pub struct OrderDesk {
    api: Arc<dyn ExchangeApi>,
    state: DashboardState,
    signer: MockSigner,
}

impl OrderDesk {
    pub fn new(api: Arc<dyn ExchangeApi>, state: DashboardState) -> Self {
        Self {
            api,
            state,
            signer: MockSigner::new(),
        }
    }

    fn auth(&self) -> SyncResult<RequestAuth> {
        let auth = self.signer.sign();
        if !is_valid_signature(&auth.signature) {
            return Err(SyncError::InvalidSignature);
        }
        Ok(auth)
    }

    /// Every validation error for `form` against current state
    pub async fn validate(&self, coin: &Coin, form: &OrderFormState) -> Vec<String> {
        let snapshot = self.state.snapshot().await;
        let asset = snapshot.asset_or_default(coin);
        all_validation_errors(form, &context(&snapshot, &asset, coin))
    }

    /// Validate and place an order; the form is reset on success
    pub async fn submit(&self, coin: &Coin, form: &mut OrderFormState) -> SyncResult<TradeResponse> {
        let snapshot = self.state.snapshot().await;
        let asset = snapshot.asset_or_default(coin);
        let ctx = context(&snapshot, &asset, coin);

        let request = form.to_place_request(coin, &ctx, self.auth()?).inspect_err(|err| {
            if let FormError::Invalid(errors) = err {
                warn!(%coin, errors = errors.len(), "order refused by validation");
            }
        })?;

        let response = accepted(self.api.place_order(&request).await?)?;
        info!(
            %coin,
            side = ?form.side,
            order_type = %request.order_type,
            px = %request.limit_px,
            sz = %request.sz,
            oid = ?response.order_id,
            "order placed"
        );
        form.reset();
        Ok(response)
    }

    pub async fn cancel(&self, coin: &Coin, oid: OrderId) -> SyncResult<TradeResponse> {
        let request = CancelRequest {
            coin: coin.clone(),
            oid,
            auth: self.auth()?,
        };
        request.validate()?;
        let response = accepted(self.api.cancel_order(&request).await?)?;
        info!(%coin, %oid, "order canceled");
        Ok(response)
    }

    pub async fn modify(
        &self,
        coin: &Coin,
        oid: OrderId,
        new_px: Option<Decimal>,
        new_sz: Option<Decimal>,
    ) -> SyncResult<TradeResponse> {
        let request = ModifyRequest {
            coin: coin.clone(),
            oid,
            new_px,
            new_sz,
            auth: self.auth()?,
        };
        request.validate()?;
        let response = accepted(self.api.modify_order(&request).await?)?;
        info!(%coin, %oid, ?new_px, ?new_sz, "order modified");
        Ok(response)
    }

    /// Cancel every open order, or only those for `coin`
    pub async fn cancel_all(&self, coin: Option<&Coin>) -> SyncResult<TradeResponse> {
        let request = CancelAllRequest {
            coin: coin.cloned(),
            auth: self.auth()?,
        };
        let response = accepted(self.api.cancel_all(&request).await?)?;
        info!(coin = ?coin, "orders canceled");
        Ok(response)
    }

    pub async fn close_position(&self, coin: &Coin) -> SyncResult<TradeResponse> {
        let request = ClosePositionRequest {
            coin: coin.clone(),
            auth: self.auth()?,
        };
        let response = accepted(self.api.close_position(&request).await?)?;
        info!(%coin, "position closed");
        Ok(response)
    }

    /// Grow (positive `delta`) or shrink (negative) an open position
    pub async fn modify_position(&self, coin: &Coin, delta: Decimal) -> SyncResult<TradeResponse> {
        let (add_size, reduce_size) = if delta.is_sign_negative() {
            (None, Some(-delta))
        } else {
            (Some(delta), None)
        };
        let request = ModifyPositionRequest {
            coin: coin.clone(),
            add_size,
            reduce_size,
            auth: self.auth()?,
        };
        request.validate()?;
        let response = accepted(self.api.modify_position(&request).await?)?;
        info!(%coin, %delta, "position modified");
        Ok(response)
    }

    pub async fn set_margin_mode(&self, coin: &Coin, margin_type: MarginType) -> SyncResult<TradeResponse> {
        let request = SetMarginModeRequest {
            coin: coin.clone(),
            margin_type,
            auth: self.auth()?,
        };
        let response = accepted(self.api.set_margin_mode(&request).await?)?;
        info!(%coin, ?margin_type, "margin mode updated");
        Ok(response)
    }
}

fn context<'a>(snapshot: &'a DashboardSnapshot, asset: &'a AssetInfo, coin: &Coin) -> ValidationContext<'a> {
    ValidationContext {
        asset: Some(asset),
        account: snapshot.account.as_ref(),
        positions: &snapshot.positions,
        mark_price: snapshot.mark(coin),
    }
}

fn accepted(response: TradeResponse) -> SyncResult<TradeResponse> {
    if response.success {
        Ok(response)
    } else {
        let message = response
            .message
            .unwrap_or_else(|| "no reason given".to_string());
        Err(SyncError::Rejected(message))
    }
}
