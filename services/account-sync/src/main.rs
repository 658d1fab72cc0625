use std::path::PathBuf;
use std::sync::Arc;

use account_sync::api::{ExchangeApi, HttpExchangeApi};
use account_sync::config::SyncConfig;
use account_sync::mock::MockExchangeApi;
use account_sync::monitor::RiskMonitor;
use account_sync::poller::Poller;
use account_sync::state::DashboardState;
use anyhow::{bail, Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use types::ids::Address;

/// Wallet followed in test mode when none is configured
const MOCK_ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = SyncConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    init_logging(&config.log_level);

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            error!(issue = %issue, "invalid configuration");
        }
        bail!("configuration has {} issue(s)", issues.len());
    }

    info!(
        api_url = %config.api_url,
        test_mode = config.test_mode,
        poll_interval_ms = config.poll_interval_ms,
        "account sync starting"
    );

    let api: Arc<dyn ExchangeApi> = if config.test_mode {
        Arc::new(MockExchangeApi::new())
    } else {
        Arc::new(HttpExchangeApi::new(&config.api_url, config.request_timeout())?)
    };

    let address = match config.wallet_address()? {
        Some(address) => address,
        None => Address::parse(MOCK_ADDRESS)?,
    };

    let state = DashboardState::new();
    let meta = api
        .exchange_meta()
        .await
        .context("Failed to load exchange metadata")?;
    info!(exchange = %meta.exchange, assets = meta.assets.len(), "exchange metadata loaded");
    state.set_meta(meta).await;

    match api.history(&address).await {
        Ok(history) => info!(
            orders = history.orders.len(),
            trades = history.trades.len(),
            "account history loaded"
        ),
        Err(err) => warn!(error = %err, "account history unavailable"),
    }

    let monitor = Arc::new(RiskMonitor::new(state.clone(), config.risk.thresholds()));
    let mut alerts = monitor.subscribe();
    let poller = Poller::new(api, state, address)
        .with_interval(config.poll_interval())
        .with_monitor(Arc::clone(&monitor))
        .spawn();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
            alert = alerts.recv() => match alert {
                Ok(alert) => info!(
                    coin = %alert.coin,
                    level = %alert.risk_level,
                    distance_percent = %alert.distance_percent,
                    "risk alert"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "risk alerts dropped"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    poller.shutdown().await;

    let summary = monitor.summary().await;
    info!(
        positions = summary.position_count,
        equity = %summary.equity,
        unrealized_pnl = %summary.total_unrealized_pnl,
        utilization = %summary.margin_utilization,
        "final portfolio"
    );
    Ok(())
}
