//! In-process mock backend
//!
//! Serves the fixture data the dashboard shows in test mode: two assets,
//! one BTC long and one resting ETH post-only order. Trading calls mutate
//! the fixtures so an order placed through the desk shows up on the next
//! poll. Tests can script failures and response delays per endpoint.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;
use types::account::{AccountHistory, AccountState};
use types::asset::{AssetInfo, ExchangeMeta};
use types::book::{BookLevel, OrderBook};
use types::ids::{Address, Coin, OrderId};
use types::order::{OpenOrder, OrderStatus, OrderType, Side, TimeInForce};
use types::position::{MarginType, Position, PositionSide};
use types::request::{
    CancelAllRequest, CancelRequest, ClosePositionRequest, ModifyPositionRequest, ModifyRequest,
    PlaceOrderRequest, SetMarginModeRequest, TradeResponse,
};
use types::trade::Trade;

use crate::api::ExchangeApi;
use crate::error::{SyncError, SyncResult};

/// Fixed clock for fixture timestamps (unix millis)
const FIXTURE_NOW_MS: i64 = 1_735_689_600_000;

/// Order-book depth served per side
const BOOK_DEPTH: u32 = 20;

/// Endpoint groups that can be scripted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MockEndpoint {
    Meta,
    Asset,
    OrderBook,
    Account,
    Positions,
    Orders,
    History,
    Trade,
}

#[derive(Debug)]
struct MockInner {
    meta: ExchangeMeta,
    account: AccountState,
    positions: Vec<Position>,
    orders: Vec<OpenOrder>,
    history: AccountHistory,
    mids: BTreeMap<Coin, Decimal>,
    next_oid: u64,
    failures: BTreeMap<MockEndpoint, u32>,
    delays: BTreeMap<MockEndpoint, Vec<Duration>>,
    calls: BTreeMap<MockEndpoint, u32>,
    placed: Vec<PlaceOrderRequest>,
}

/// Fixture-backed [`ExchangeApi`]
#[derive(Debug)]
pub struct MockExchangeApi {
    inner: Mutex<MockInner>,
}

impl Default for MockExchangeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExchangeApi {
    pub fn new() -> Self {
        let meta = ExchangeMeta {
            exchange: "Hyperliquid".to_string(),
            assets: vec![btc_asset(), eth_asset()],
        };
        let mids = BTreeMap::from([
            (Coin::new("BTC"), Decimal::from(95_000)),
            (Coin::new("ETH"), Decimal::from(3_500)),
        ]);

        Self {
            inner: Mutex::new(MockInner {
                meta,
                account: fixture_account(),
                positions: vec![fixture_btc_long()],
                orders: vec![fixture_eth_order()],
                history: fixture_history(),
                mids,
                next_oid: 12_346,
                failures: BTreeMap::new(),
                delays: BTreeMap::new(),
                calls: BTreeMap::new(),
                placed: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- scripting ---------------------------------------------------------

    /// Fail the next `times` calls to `endpoint`
    pub fn fail_next(&self, endpoint: MockEndpoint, times: u32) {
        *self.lock().failures.entry(endpoint).or_default() += times;
    }

    /// Delay upcoming calls to `endpoint`, one entry per call, in order
    pub fn delay_next(&self, endpoint: MockEndpoint, delays: impl IntoIterator<Item = Duration>) {
        self.lock().delays.entry(endpoint).or_default().extend(delays);
    }

    pub fn set_account(&self, account: AccountState) {
        self.lock().account = account;
    }

    pub fn set_positions(&self, positions: Vec<Position>) {
        self.lock().positions = positions;
    }

    pub fn set_orders(&self, orders: Vec<OpenOrder>) {
        self.lock().orders = orders;
    }

    /// Move the mid price the order book is built around
    pub fn set_mid(&self, coin: &Coin, mid: Decimal) {
        self.lock().mids.insert(coin.clone(), mid);
    }

    // -- inspection --------------------------------------------------------

    pub fn calls(&self, endpoint: MockEndpoint) -> u32 {
        self.lock().calls.get(&endpoint).copied().unwrap_or(0)
    }

    /// Place-order bodies received so far
    pub fn placed_orders(&self) -> Vec<PlaceOrderRequest> {
        self.lock().placed.clone()
    }

    pub fn positions_snapshot(&self) -> Vec<Position> {
        self.lock().positions.clone()
    }

    pub fn orders_snapshot(&self) -> Vec<OpenOrder> {
        self.lock().orders.clone()
    }

    /// Count the call, apply any scripted delay, then any scripted failure.
    /// Account reads capture their data before the delay, like a response
    /// that was produced promptly but delivered late.
    async fn enter(&self, endpoint: MockEndpoint) -> SyncResult<()> {
        let (delay, fail) = {
            let mut inner = self.lock();
            *inner.calls.entry(endpoint).or_default() += 1;
            let delay = inner
                .delays
                .get_mut(&endpoint)
                .filter(|queue| !queue.is_empty())
                .map(|queue| queue.remove(0));
            let fail = match inner.failures.get_mut(&endpoint) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            };
            (delay, fail)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            debug!(?endpoint, "scripted mock failure");
            return Err(SyncError::Mock(format!("{endpoint:?} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeApi for MockExchangeApi {
    async fn exchange_meta(&self) -> SyncResult<ExchangeMeta> {
        self.enter(MockEndpoint::Meta).await?;
        Ok(self.lock().meta.clone())
    }

    async fn asset_info(&self, coin: &Coin) -> SyncResult<AssetInfo> {
        self.enter(MockEndpoint::Asset).await?;
        self.lock()
            .meta
            .asset(coin.as_str())
            .cloned()
            .ok_or_else(|| SyncError::Status {
                endpoint: format!("/api/info/asset/{coin}"),
                status: 404,
                body: format!("Asset {coin} not found"),
            })
    }

    async fn order_book(&self, coin: &Coin) -> SyncResult<OrderBook> {
        self.enter(MockEndpoint::OrderBook).await?;
        let mid = self
            .lock()
            .mids
            .get(coin)
            .copied()
            .unwrap_or_else(|| Decimal::from(3_500));
        Ok(synthetic_book(mid))
    }

    async fn account_state(&self, _address: &Address) -> SyncResult<AccountState> {
        let account = self.lock().account.clone();
        self.enter(MockEndpoint::Account).await?;
        Ok(account)
    }

    async fn positions(&self, _address: &Address) -> SyncResult<Vec<Position>> {
        let positions = self.lock().positions.clone();
        self.enter(MockEndpoint::Positions).await?;
        Ok(positions)
    }

    async fn open_orders(&self, _address: &Address) -> SyncResult<Vec<OpenOrder>> {
        let orders = self.lock().orders.clone();
        self.enter(MockEndpoint::Orders).await?;
        Ok(orders)
    }

    async fn history(&self, _address: &Address) -> SyncResult<AccountHistory> {
        self.enter(MockEndpoint::History).await?;
        Ok(self.lock().history.clone())
    }

    async fn place_order(&self, request: &PlaceOrderRequest) -> SyncResult<TradeResponse> {
        self.enter(MockEndpoint::Trade).await?;
        let mut inner = self.lock();
        let oid = OrderId(inner.next_oid);
        inner.next_oid += 1;
        inner.placed.push(request.clone());

        if request.order_type == OrderType::Limit && !request.tif.is_immediate() {
            inner.orders.push(OpenOrder {
                oid,
                coin: request.coin.clone(),
                side: if request.is_buy { Side::Buy } else { Side::Sell },
                limit_px: request.limit_px,
                sz: request.sz,
                orig_sz: request.sz,
                status: OrderStatus::Open,
                timestamp: request.auth.timestamp * 1_000,
                order_type: request.order_type,
                reduce_only: request.reduce_only,
                post_only: request.post_only,
                tif: request.tif,
            });
        }

        Ok(TradeResponse {
            success: true,
            order_id: Some(oid),
            message: Some("Order placed successfully".to_string()),
        })
    }

    async fn cancel_order(&self, request: &CancelRequest) -> SyncResult<TradeResponse> {
        self.enter(MockEndpoint::Trade).await?;
        let mut inner = self.lock();
        let before = inner.orders.len();
        inner.orders.retain(|o| o.oid != request.oid);
        if inner.orders.len() == before {
            return Ok(rejected(format!("Order {} not found", request.oid)));
        }
        Ok(TradeResponse {
            success: true,
            order_id: None,
            message: Some(format!("Order {} canceled successfully", request.oid)),
        })
    }

    async fn modify_order(&self, request: &ModifyRequest) -> SyncResult<TradeResponse> {
        self.enter(MockEndpoint::Trade).await?;
        let mut inner = self.lock();
        let Some(order) = inner.orders.iter_mut().find(|o| o.oid == request.oid) else {
            return Ok(rejected(format!("Order {} not found", request.oid)));
        };
        if let Some(px) = request.new_px {
            order.limit_px = px;
        }
        if let Some(sz) = request.new_sz {
            order.sz = sz;
            order.orig_sz = sz;
        }
        Ok(TradeResponse {
            success: true,
            order_id: Some(request.oid),
            message: Some("Order modified successfully".to_string()),
        })
    }

    async fn cancel_all(&self, request: &CancelAllRequest) -> SyncResult<TradeResponse> {
        self.enter(MockEndpoint::Trade).await?;
        let mut inner = self.lock();
        match &request.coin {
            Some(coin) => inner.orders.retain(|o| &o.coin != coin),
            None => inner.orders.clear(),
        }
        let scope = request
            .coin
            .as_ref()
            .map(|c| format!(" for {c}"))
            .unwrap_or_default();
        Ok(TradeResponse {
            success: true,
            order_id: None,
            message: Some(format!("All orders{scope} canceled successfully")),
        })
    }

    async fn close_position(&self, request: &ClosePositionRequest) -> SyncResult<TradeResponse> {
        self.enter(MockEndpoint::Trade).await?;
        let mut inner = self.lock();
        let before = inner.positions.len();
        inner.positions.retain(|p| p.coin != request.coin);
        if inner.positions.len() == before {
            return Ok(rejected(format!("No open position for {}", request.coin)));
        }
        Ok(TradeResponse {
            success: true,
            order_id: None,
            message: Some(format!("Position for {} closed successfully", request.coin)),
        })
    }

    async fn modify_position(&self, request: &ModifyPositionRequest) -> SyncResult<TradeResponse> {
        self.enter(MockEndpoint::Trade).await?;
        let mut inner = self.lock();
        let Some(position) = inner.positions.iter_mut().find(|p| p.coin == request.coin) else {
            return Ok(rejected(format!("No open position for {}", request.coin)));
        };
        position.apply_size_change(request.size_delta());
        inner.positions.retain(|p| !p.is_closed());
        Ok(TradeResponse {
            success: true,
            order_id: None,
            message: Some(format!("Position for {} modified successfully", request.coin)),
        })
    }

    async fn set_margin_mode(&self, request: &SetMarginModeRequest) -> SyncResult<TradeResponse> {
        self.enter(MockEndpoint::Trade).await?;
        let mut inner = self.lock();
        for position in inner.positions.iter_mut().filter(|p| p.coin == request.coin) {
            position.margin_type = request.margin_type;
        }
        Ok(TradeResponse {
            success: true,
            order_id: None,
            message: Some(format!("Margin mode for {} updated", request.coin)),
        })
    }
}

fn rejected(message: String) -> TradeResponse {
    TradeResponse {
        success: false,
        order_id: None,
        message: Some(message),
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn btc_asset() -> AssetInfo {
    AssetInfo {
        size_decimals: 4,
        price_decimals: 1,
        min_size: Decimal::new(1, 3),
        max_leverage: 50,
        funding_rate: Decimal::new(1, 4),
        open_interest: Decimal::from(1_500_000_000u64),
        volume_24h: Decimal::from(500_000_000u64),
        price_change_24h: Decimal::new(234, 2),
        ..AssetInfo::with_defaults(Coin::new("BTC"))
    }
}

fn eth_asset() -> AssetInfo {
    AssetInfo {
        size_decimals: 3,
        price_decimals: 2,
        min_size: Decimal::new(1, 2),
        max_leverage: 50,
        funding_rate: Decimal::new(15, 5),
        open_interest: Decimal::from(800_000_000u64),
        volume_24h: Decimal::from(300_000_000u64),
        price_change_24h: Decimal::new(-125, 2),
        ..AssetInfo::with_defaults(Coin::new("ETH"))
    }
}

fn fixture_account() -> AccountState {
    AccountState {
        equity: Decimal::from(10_000),
        margin_used: Decimal::from(2_500),
        available_balance: Decimal::from(7_500),
        withdrawable: Decimal::from(5_000),
        cross_margin_summary: BTreeMap::from([
            ("account_value".to_string(), Decimal::from(10_000)),
            ("total_margin_used".to_string(), Decimal::from(2_500)),
        ]),
    }
}

fn fixture_btc_long() -> Position {
    Position {
        coin: Coin::new("BTC"),
        side: PositionSide::Long,
        entry_price: Decimal::from(94_500),
        size: Decimal::new(5, 1),
        leverage: 10,
        margin_used: Decimal::from(4_725),
        unrealized_pnl: Decimal::new(46_025, 2),
        realized_pnl: Decimal::ZERO,
        liquidation_price: Decimal::from(85_050),
        margin_type: MarginType::Cross,
    }
}

fn fixture_eth_order() -> OpenOrder {
    OpenOrder {
        oid: OrderId(12_345),
        coin: Coin::new("ETH"),
        side: Side::Buy,
        limit_px: Decimal::from(3_400),
        sz: Decimal::from(2),
        orig_sz: Decimal::from(2),
        status: OrderStatus::Open,
        timestamp: FIXTURE_NOW_MS - 300_000,
        order_type: OrderType::Limit,
        reduce_only: false,
        post_only: true,
        tif: TimeInForce::GTC,
    }
}

fn fixture_history() -> AccountHistory {
    AccountHistory {
        orders: vec![OpenOrder {
            oid: OrderId(12_340),
            coin: Coin::new("BTC"),
            side: Side::Buy,
            limit_px: Decimal::from(93_000),
            sz: Decimal::new(5, 1),
            orig_sz: Decimal::new(5, 1),
            status: OrderStatus::Filled,
            timestamp: FIXTURE_NOW_MS - 86_400_000,
            order_type: OrderType::Limit,
            reduce_only: false,
            post_only: false,
            tif: TimeInForce::GTC,
        }],
        trades: vec![Trade {
            coin: Coin::new("BTC"),
            side: Side::Buy,
            px: Decimal::from(93_000),
            sz: Decimal::new(5, 1),
            time: FIXTURE_NOW_MS - 86_400_000,
            fee: Decimal::new(465, 2),
            hash: "0x123abc".to_string(),
        }],
    }
}

/// Levels 1bp apart on each side of `mid`, sizes cycling deterministically
fn synthetic_book(mid: Decimal) -> OrderBook {
    let step = mid * Decimal::new(1, 4);
    let level = |i: u32, px: Decimal| BookLevel {
        px,
        sz: Decimal::new(i64::from(1 + (i * 7) % 97), 1),
        n: 1 + (i * 3) % 20,
    };
    OrderBook {
        bids: (0..BOOK_DEPTH)
            .map(|i| level(i, mid - step * Decimal::from(i + 1)))
            .collect(),
        asks: (0..BOOK_DEPTH)
            .map(|i| level(i + BOOK_DEPTH, mid + step * Decimal::from(i + 1)))
            .collect(),
    }
}
