//! Shared dashboard state
//!
//! Polls may overlap when the backend is slow, so responses can arrive out
//! of order. Each polled slot keeps a generation counter: [`DashboardState::begin`]
//! hands out a ticket before the request is sent and a response is applied
//! only if its ticket is newer than the last one applied to that slot.

use std::collections::BTreeMap;
use std::sync::Arc;

use risk_calc::portfolio::Portfolio;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use types::account::AccountState;
use types::asset::{AssetInfo, ExchangeMeta};
use types::ids::Coin;
use types::order::OpenOrder;
use types::position::Position;

/// A polled piece of state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    Account,
    Positions,
    Orders,
}

/// Issued by [`DashboardState::begin`] before a request goes out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub slot: Slot,
    pub generation: u64,
}

/// A response ready to be committed
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    Account(AccountState),
    Positions(Vec<Position>),
    Orders(Vec<OpenOrder>),
}

impl SlotValue {
    pub fn slot(&self) -> Slot {
        match self {
            SlotValue::Account(_) => Slot::Account,
            SlotValue::Positions(_) => Slot::Positions,
            SlotValue::Orders(_) => Slot::Orders,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SlotClock {
    issued: u64,
    applied: u64,
}

/// Point-in-time copy of everything the dashboard renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub account: Option<AccountState>,
    pub positions: Vec<Position>,
    pub orders: Vec<OpenOrder>,
    pub meta: Option<ExchangeMeta>,
    pub marks: BTreeMap<Coin, Decimal>,
    /// The latest positions request failed; `positions` is empty until the
    /// next successful poll rather than confirmed empty
    pub positions_unavailable: bool,
}

impl DashboardSnapshot {
    /// Asset constraints for `coin`, falling back to defaults when unknown
    pub fn asset_or_default(&self, coin: &Coin) -> AssetInfo {
        self.meta
            .as_ref()
            .and_then(|meta| meta.asset(coin.as_str()))
            .cloned()
            .unwrap_or_else(|| AssetInfo::with_defaults(coin.clone()))
    }

    pub fn mark(&self, coin: &Coin) -> Option<Decimal> {
        self.marks.get(coin).copied()
    }

    pub fn portfolio(&self) -> Portfolio {
        let mut portfolio = Portfolio::new();
        if let Some(account) = &self.account {
            portfolio.set_account(account.clone());
        }
        portfolio.set_positions(self.positions.iter().cloned());
        for (coin, px) in &self.marks {
            portfolio.set_mark(coin.clone(), *px);
        }
        portfolio
    }
}

#[derive(Debug, Default)]
struct Inner {
    snapshot: DashboardSnapshot,
    clocks: BTreeMap<Slot, SlotClock>,
    stale_discarded: u64,
    last_error: Option<String>,
}

impl Inner {
    fn clock(&mut self, slot: Slot) -> &mut SlotClock {
        self.clocks.entry(slot).or_default()
    }

    /// Advance the applied generation if `ticket` is the newest seen
    fn accept(&mut self, ticket: Ticket) -> bool {
        let clock = self.clock(ticket.slot);
        if ticket.generation > clock.applied {
            clock.applied = ticket.generation;
            true
        } else {
            self.stale_discarded += 1;
            false
        }
    }
}

/// Cloneable handle to the dashboard state
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    inner: Arc<RwLock<Inner>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    // -- generations -------------------------------------------------------

    /// Issue a ticket for a request about to be sent for `slot`
    pub async fn begin(&self, slot: Slot) -> Ticket {
        let mut inner = self.inner.write().await;
        let clock = inner.clock(slot);
        clock.issued += 1;
        Ticket {
            slot,
            generation: clock.issued,
        }
    }

    /// Apply a response; returns `false` if it was discarded as stale
    pub async fn commit(&self, ticket: Ticket, value: SlotValue) -> bool {
        if value.slot() != ticket.slot {
            warn!(ticket = ?ticket.slot, value = ?value.slot(), "ticket does not match value slot");
            return false;
        }

        let mut inner = self.inner.write().await;
        if !inner.accept(ticket) {
            debug!(
                slot = ?ticket.slot,
                generation = ticket.generation,
                applied = inner.clocks[&ticket.slot].applied,
                "discarding stale response"
            );
            return false;
        }

        match value {
            SlotValue::Account(account) => inner.snapshot.account = Some(account),
            SlotValue::Positions(positions) => {
                inner.snapshot.positions = positions.into_iter().filter(|p| !p.is_closed()).collect();
                inner.snapshot.positions_unavailable = false;
            }
            SlotValue::Orders(orders) => inner.snapshot.orders = orders,
        }
        true
    }

    /// Record a failed request. A current failure clears the position or
    /// order list; the last account snapshot is kept.
    pub async fn fail(&self, ticket: Ticket, error: &str) -> bool {
        let mut inner = self.inner.write().await;
        if !inner.accept(ticket) {
            debug!(slot = ?ticket.slot, generation = ticket.generation, error, "ignoring stale failure");
            return false;
        }

        warn!(slot = ?ticket.slot, generation = ticket.generation, error, "poll failed");
        match ticket.slot {
            Slot::Positions => {
                inner.snapshot.positions.clear();
                inner.snapshot.positions_unavailable = true;
            }
            Slot::Orders => inner.snapshot.orders.clear(),
            Slot::Account => {}
        }
        inner.last_error = Some(error.to_string());
        true
    }

    // -- direct setters ----------------------------------------------------

    pub async fn set_meta(&self, meta: ExchangeMeta) {
        self.inner.write().await.snapshot.meta = Some(meta);
    }

    /// Record a mark price; non-positive prices are ignored
    pub async fn set_mark(&self, coin: Coin, price: Decimal) {
        if price > Decimal::ZERO {
            self.inner.write().await.snapshot.marks.insert(coin, price);
        }
    }

    /// Merge a batch of marks; returns how many were accepted
    pub async fn set_marks(&self, marks: impl IntoIterator<Item = (Coin, Decimal)>) -> usize {
        let mut inner = self.inner.write().await;
        let mut accepted = 0;
        for (coin, price) in marks.into_iter().filter(|(_, px)| *px > Decimal::ZERO) {
            inner.snapshot.marks.insert(coin, price);
            accepted += 1;
        }
        accepted
    }

    // -- queries -----------------------------------------------------------

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.inner.read().await.snapshot.clone()
    }

    pub async fn account(&self) -> Option<AccountState> {
        self.inner.read().await.snapshot.account.clone()
    }

    pub async fn positions(&self) -> Vec<Position> {
        self.inner.read().await.snapshot.positions.clone()
    }

    pub async fn orders(&self) -> Vec<OpenOrder> {
        self.inner.read().await.snapshot.orders.clone()
    }

    pub async fn mark(&self, coin: &Coin) -> Option<Decimal> {
        self.inner.read().await.snapshot.mark(coin)
    }

    /// Responses dropped because a newer one had already been applied
    pub async fn stale_discarded(&self) -> u64 {
        self.inner.read().await.stale_discarded
    }

    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.last_error.clone()
    }

    /// Last generation applied for `slot` (0 before the first response)
    pub async fn applied_generation(&self, slot: Slot) -> u64 {
        self.inner
            .read()
            .await
            .clocks
            .get(&slot)
            .map_or(0, |clock| clock.applied)
    }
}
