//! Mark-price ingestion and liquidation alerts
//!
//! Mid prices arrive keyed by raw symbol (`"BTC"` or `"BTC-PERP"`). After
//! each batch the monitor re-classifies every open position and publishes
//! an alert on a broadcast channel the first time a position escalates
//! into a worse risk band.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use risk_calc::portfolio::{PortfolioSummary, PositionView};
use risk_calc::{RiskAlert, RiskAlertTracker, RiskThresholds};
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use types::ids::Coin;

use crate::state::DashboardState;

/// Alerts buffered per subscriber before the oldest are dropped
const ALERT_CHANNEL_CAPACITY: usize = 64;

pub struct RiskMonitor {
    state: DashboardState,
    thresholds: RiskThresholds,
    tracker: Mutex<RiskAlertTracker>,
    alerts: broadcast::Sender<RiskAlert>,
}

impl RiskMonitor {
    pub fn new(state: DashboardState, thresholds: RiskThresholds) -> Self {
        let (alerts, _) = broadcast::channel(ALERT_CHANNEL_CAPACITY);
        Self {
            state,
            thresholds,
            tracker: Mutex::new(RiskAlertTracker::new()),
            alerts,
        }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RiskAlert> {
        self.alerts.subscribe()
    }

    fn tracker(&self) -> MutexGuard<'_, RiskAlertTracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a batch of mid prices; returns how many were accepted
    pub async fn ingest_mids(&self, mids: &BTreeMap<String, Decimal>) -> usize {
        let marks: Vec<(Coin, Decimal)> = mids
            .iter()
            .map(|(symbol, px)| (Coin::new(symbol), *px))
            .collect();
        let accepted = self.state.set_marks(marks).await;
        debug!(received = mids.len(), accepted, "ingested mid prices");
        accepted
    }

    /// Re-classify open positions and publish any new escalations.
    /// Alert memory for a coin is dropped only once a successful poll no
    /// longer lists its position.
    pub async fn evaluate(&self) -> Vec<RiskAlert> {
        let snapshot = self.state.snapshot().await;
        let views = snapshot.portfolio().position_views(&self.thresholds);

        let raised: Vec<RiskAlert> = {
            let mut tracker = self.tracker();
            if snapshot.positions_unavailable {
                debug!("positions unavailable, keeping alert memory");
            } else {
                let open: BTreeSet<Coin> = views.iter().map(|v| v.position.coin.clone()).collect();
                tracker.retain_open(&open);
            }
            views
                .iter()
                .filter_map(|view| {
                    let risk = view.liquidation_risk.as_ref()?;
                    let mark = view.mark_price?;
                    tracker.observe(&view.position.coin, risk, mark)
                })
                .collect()
        };

        for alert in &raised {
            warn!(
                coin = %alert.coin,
                level = %alert.risk_level,
                previous = %alert.previous_level,
                distance_percent = %alert.distance_percent,
                mark_price = %alert.mark_price,
                "liquidation risk escalated"
            );
            // no subscribers is fine
            let _ = self.alerts.send(alert.clone());
        }
        raised
    }

    pub async fn position_views(&self) -> Vec<PositionView> {
        self.state
            .snapshot()
            .await
            .portfolio()
            .position_views(&self.thresholds)
    }

    pub async fn summary(&self) -> PortfolioSummary {
        self.state.snapshot().await.portfolio().summary(&self.thresholds)
    }
}
