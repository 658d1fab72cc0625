//! Periodic account refresh
//!
//! Every tick starts a refresh without waiting for the previous one, so a
//! slow backend can have several in flight. Tickets taken before each
//! request let [`DashboardState`] drop whatever arrives late.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use types::ids::{Address, Coin};

use crate::api::ExchangeApi;
use crate::monitor::RiskMonitor;
use crate::error::SyncResult;
use crate::state::{DashboardState, Slot, SlotValue, Ticket};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct Poller {
    api: Arc<dyn ExchangeApi>,
    state: DashboardState,
    address: Address,
    interval: Duration,
    monitor: Option<Arc<RiskMonitor>>,
}

/// Running poll loop; dropping it also stops the loop
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Poller {
    pub fn new(api: Arc<dyn ExchangeApi>, state: DashboardState, address: Address) -> Self {
        Self {
            api,
            state,
            address,
            interval: DEFAULT_POLL_INTERVAL,
            monitor: None,
        }
    }

    /// Set the poll period; a zero period keeps the default
    pub fn with_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            warn!(default_ms = DEFAULT_POLL_INTERVAL.as_millis() as u64, "zero poll interval ignored");
            self.interval = DEFAULT_POLL_INTERVAL;
        } else {
            self.interval = interval;
        }
        self
    }

    /// Also refresh mark prices and evaluate risk after each refresh
    pub fn with_monitor(mut self, monitor: Arc<RiskMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn spawn(self) -> PollerHandle {
        let (shutdown, mut stop) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut in_flight = JoinSet::new();

            info!(address = %self.address, interval_ms = self.interval.as_millis() as u64, "poller started");
            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = ticker.tick() => {
                        let api = Arc::clone(&self.api);
                        let state = self.state.clone();
                        let address = self.address.clone();
                        let monitor = self.monitor.clone();
                        in_flight.spawn(async move {
                            refresh(api.as_ref(), &state, &address).await;
                            if let Some(monitor) = monitor {
                                refresh_marks(api.as_ref(), &state, &monitor).await;
                                monitor.evaluate().await;
                            }
                        });
                        debug!(in_flight = in_flight.len(), "refresh started");
                    }
                    Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                        if let Err(err) = joined {
                            if err.is_panic() {
                                error!(error = %err, "refresh task panicked");
                            }
                        }
                    }
                }
            }

            let aborted = in_flight.len();
            in_flight.shutdown().await;
            info!(aborted, "poller stopped");
        });

        PollerHandle { shutdown, task }
    }
}

impl PollerHandle {
    /// Stop the loop and abort refreshes still in flight
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            if err.is_panic() {
                error!(error = %err, "poller task panicked");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Fetch account, positions and open orders concurrently. Each response
/// is committed as soon as it arrives, so a slow endpoint never holds back
/// the other two.
pub async fn refresh(api: &dyn ExchangeApi, state: &DashboardState, address: &Address) {
    let account_ticket = state.begin(Slot::Account).await;
    let positions_ticket = state.begin(Slot::Positions).await;
    let orders_ticket = state.begin(Slot::Orders).await;

    tokio::join!(
        async { settle(state, account_ticket, api.account_state(address).await, SlotValue::Account).await },
        async { settle(state, positions_ticket, api.positions(address).await, SlotValue::Positions).await },
        async { settle(state, orders_ticket, api.open_orders(address).await, SlotValue::Orders).await },
    );
}

async fn settle<T>(state: &DashboardState, ticket: Ticket, result: SyncResult<T>, wrap: fn(T) -> SlotValue) -> bool {
    match result {
        Ok(value) => state.commit(ticket, wrap(value)).await,
        Err(err) => state.fail(ticket, &err.to_string()).await,
    }
}

/// Pull order-book mids for every coin with an open position
pub async fn refresh_marks(api: &dyn ExchangeApi, state: &DashboardState, monitor: &RiskMonitor) -> usize {
    let coins: Vec<Coin> = state.positions().await.into_iter().map(|p| p.coin).collect();

    let mut mids = BTreeMap::new();
    for coin in coins {
        match api.order_book(&coin).await {
            Ok(book) => match book.mid_price() {
                Some(mid) => {
                    mids.insert(coin.to_string(), mid);
                }
                None => debug!(%coin, "order book has no mid"),
            },
            Err(err) => warn!(%coin, error = %err, "order book fetch failed"),
        }
    }
    monitor.ingest_mids(&mids).await
}
