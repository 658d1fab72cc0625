//! Poll loop behaviour under paused time

use std::sync::Arc;
use std::time::Duration;

use account_sync::mock::{MockEndpoint, MockExchangeApi};
use account_sync::monitor::RiskMonitor;
use account_sync::poller::Poller;
use account_sync::state::{DashboardState, Slot};
use risk_calc::RiskThresholds;
use rust_decimal::Decimal;
use types::ids::{Address, Coin};
use types::position::{MarginType, Position, PositionSide};
use types::risk::RiskLevel;

const INTERVAL: Duration = Duration::from_secs(5);

fn address() -> Address {
    Address::parse("0x1234567890abcdef1234567890abcdef12345678").unwrap()
}

fn eth_short() -> Position {
    Position {
        coin: Coin::new("ETH"),
        side: PositionSide::Short,
        entry_price: Decimal::from(3_500),
        size: Decimal::from(2),
        leverage: 20,
        margin_used: Decimal::from(350),
        unrealized_pnl: Decimal::ZERO,
        realized_pnl: Decimal::ZERO,
        liquidation_price: Decimal::from(3_640),
        margin_type: MarginType::Isolated,
    }
}

async fn sleep_secs(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

#[tokio::test(start_paused = true)]
async fn polls_on_every_tick() {
    let mock = Arc::new(MockExchangeApi::new());
    let state = DashboardState::new();
    let handle = Poller::new(mock.clone(), state.clone(), address())
        .with_interval(INTERVAL)
        .spawn();

    // ticks at 0, 5, 10
    sleep_secs(11).await;
    assert_eq!(mock.calls(MockEndpoint::Account), 3);
    assert_eq!(mock.calls(MockEndpoint::Positions), 3);
    assert_eq!(mock.calls(MockEndpoint::Orders), 3);
    assert_eq!(state.positions().await.len(), 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn late_response_from_older_poll_is_discarded() {
    let mock = Arc::new(MockExchangeApi::new());
    let state = DashboardState::new();
    // first poll's positions arrive at t=8, the second poll's at t=6
    mock.delay_next(
        MockEndpoint::Positions,
        [Duration::from_secs(8), Duration::from_secs(1)],
    );

    let handle = Poller::new(mock.clone(), state.clone(), address())
        .with_interval(INTERVAL)
        .spawn();

    sleep_secs(1).await;
    mock.set_positions(vec![eth_short()]);

    sleep_secs(8).await;
    // account and orders from both polls landed on time
    assert_eq!(state.applied_generation(Slot::Account).await, 2);
    assert_eq!(state.applied_generation(Slot::Orders).await, 2);
    let positions = state.positions().await;
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].coin, Coin::new("ETH"));
    assert_eq!(state.stale_discarded().await, 1);
    assert_eq!(state.applied_generation(Slot::Positions).await, 2);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_poll_clears_positions_until_next_success() {
    let mock = Arc::new(MockExchangeApi::new());
    let state = DashboardState::new();
    let handle = Poller::new(mock.clone(), state.clone(), address())
        .with_interval(INTERVAL)
        .spawn();

    sleep_secs(1).await;
    assert_eq!(state.positions().await.len(), 1);

    mock.fail_next(MockEndpoint::Positions, 1);
    sleep_secs(5).await;
    assert!(state.positions().await.is_empty());
    assert_eq!(state.orders().await.len(), 1);
    assert!(state.last_error().await.is_some());

    sleep_secs(5).await;
    assert_eq!(state.positions().await.len(), 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_aborts_in_flight_refresh() {
    let mock = Arc::new(MockExchangeApi::new());
    let state = DashboardState::new();
    mock.delay_next(MockEndpoint::Account, [Duration::from_secs(60)]);

    let handle = Poller::new(mock.clone(), state.clone(), address())
        .with_interval(INTERVAL)
        .spawn();

    sleep_secs(1).await;
    handle.shutdown().await;

    sleep_secs(120).await;
    // the delayed account response never landed and no further ticks ran
    assert!(state.account().await.is_none());
    assert_eq!(mock.calls(MockEndpoint::Account), 1);
}

#[tokio::test(start_paused = true)]
async fn monitor_alerts_when_mark_nears_liquidation() {
    let mock = Arc::new(MockExchangeApi::new());
    let state = DashboardState::new();
    let monitor = Arc::new(RiskMonitor::new(state.clone(), RiskThresholds::default()));
    let mut alerts = monitor.subscribe();

    let handle = Poller::new(mock.clone(), state.clone(), address())
        .with_interval(INTERVAL)
        .with_monitor(monitor.clone())
        .spawn();

    sleep_secs(1).await;
    assert!(alerts.try_recv().is_err());

    // liquidation at 85050; 86500 is ~1.7% away
    mock.set_mid(&Coin::new("BTC"), Decimal::from(86_500));
    sleep_secs(5).await;

    let alert = alerts.try_recv().unwrap();
    assert_eq!(alert.coin, Coin::new("BTC"));
    assert_eq!(alert.risk_level, RiskLevel::Critical);

    // staying put does not repeat the alert
    sleep_secs(5).await;
    assert!(alerts.try_recv().is_err());

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn zero_interval_polls_at_default_cadence() {
    let mock = Arc::new(MockExchangeApi::new());
    let state = DashboardState::new();
    let handle = Poller::new(mock.clone(), state.clone(), address())
        .with_interval(Duration::ZERO)
        .spawn();

    sleep_secs(1).await;
    assert!(!handle.is_finished());
    assert_eq!(mock.calls(MockEndpoint::Account), 1);

    handle.shutdown().await;
}
