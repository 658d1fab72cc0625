//! Client for the info / account / trade HTTP API
//!
//! Every call is a single attempt: non-2xx responses and transport errors
//! are returned to the caller, there is no retry or backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use types::account::{AccountHistory, AccountState};
use types::asset::{AssetInfo, ExchangeMeta};
use types::book::OrderBook;
use types::ids::{Address, Coin};
use types::order::OpenOrder;
use types::position::Position;
use types::request::{
    CancelAllRequest, CancelRequest, ClosePositionRequest, ModifyPositionRequest, ModifyRequest,
    PlaceOrderRequest, SetMarginModeRequest, TradeResponse,
};

use crate::error::{SyncError, SyncResult};

/// Backend operations the dashboard depends on
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    async fn exchange_meta(&self) -> SyncResult<ExchangeMeta>;
    async fn asset_info(&self, coin: &Coin) -> SyncResult<AssetInfo>;
    async fn order_book(&self, coin: &Coin) -> SyncResult<OrderBook>;

    async fn account_state(&self, address: &Address) -> SyncResult<AccountState>;
    async fn positions(&self, address: &Address) -> SyncResult<Vec<Position>>;
    async fn open_orders(&self, address: &Address) -> SyncResult<Vec<OpenOrder>>;
    async fn history(&self, address: &Address) -> SyncResult<AccountHistory>;

    async fn place_order(&self, request: &PlaceOrderRequest) -> SyncResult<TradeResponse>;
    async fn cancel_order(&self, request: &CancelRequest) -> SyncResult<TradeResponse>;
    async fn modify_order(&self, request: &ModifyRequest) -> SyncResult<TradeResponse>;
    async fn cancel_all(&self, request: &CancelAllRequest) -> SyncResult<TradeResponse>;
    async fn close_position(&self, request: &ClosePositionRequest) -> SyncResult<TradeResponse>;
    async fn modify_position(&self, request: &ModifyPositionRequest) -> SyncResult<TradeResponse>;
    async fn set_margin_mode(&self, request: &SetMarginModeRequest) -> SyncResult<TradeResponse>;
}

/// `reqwest` implementation of [`ExchangeApi`]
#[derive(Clone)]
pub struct HttpExchangeApi {
    client: Client,
    base_url: String,
}

impl HttpExchangeApi {
    pub fn new(base_url: &str, timeout: Duration) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| SyncError::Transport {
                endpoint: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> SyncResult<T> {
        debug!(path, "GET");
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(|source| SyncError::Transport {
                endpoint: path.to_string(),
                source,
            })?;
        decode(path, response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> SyncResult<T> {
        debug!(path, "POST");
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|source| SyncError::Transport {
                endpoint: path.to_string(),
                source,
            })?;
        decode(path, response).await
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> SyncResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SyncError::Status {
            endpoint: path.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response.bytes().await.map_err(|source| SyncError::Transport {
        endpoint: path.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| SyncError::Decode {
        endpoint: path.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl ExchangeApi for HttpExchangeApi {
    async fn exchange_meta(&self) -> SyncResult<ExchangeMeta> {
        self.get("/api/info/meta").await
    }

    async fn asset_info(&self, coin: &Coin) -> SyncResult<AssetInfo> {
        self.get(&format!("/api/info/asset/{coin}")).await
    }

    async fn order_book(&self, coin: &Coin) -> SyncResult<OrderBook> {
        self.get(&format!("/api/info/orderbook/{coin}")).await
    }

    async fn account_state(&self, address: &Address) -> SyncResult<AccountState> {
        self.get(&format!("/api/account/state/{address}")).await
    }

    async fn positions(&self, address: &Address) -> SyncResult<Vec<Position>> {
        self.get(&format!("/api/account/positions/{address}")).await
    }

    async fn open_orders(&self, address: &Address) -> SyncResult<Vec<OpenOrder>> {
        self.get(&format!("/api/account/orders/{address}")).await
    }

    async fn history(&self, address: &Address) -> SyncResult<AccountHistory> {
        self.get(&format!("/api/account/history/{address}")).await
    }

    async fn place_order(&self, request: &PlaceOrderRequest) -> SyncResult<TradeResponse> {
        self.post("/api/trade/place", request).await
    }

    async fn cancel_order(&self, request: &CancelRequest) -> SyncResult<TradeResponse> {
        self.post("/api/trade/cancel", request).await
    }

    async fn modify_order(&self, request: &ModifyRequest) -> SyncResult<TradeResponse> {
        self.post("/api/trade/modify", request).await
    }

    async fn cancel_all(&self, request: &CancelAllRequest) -> SyncResult<TradeResponse> {
        self.post("/api/trade/cancel-all", request).await
    }

    async fn close_position(&self, request: &ClosePositionRequest) -> SyncResult<TradeResponse> {
        self.post("/api/trade/close-position", request).await
    }

    async fn modify_position(&self, request: &ModifyPositionRequest) -> SyncResult<TradeResponse> {
        self.post("/api/trade/modify-position", request).await
    }

    async fn set_margin_mode(&self, request: &SetMarginModeRequest) -> SyncResult<TradeResponse> {
        self.post("/api/trade/margin-mode", request).await
    }
}
