//! Account sync service for the perpetuals dashboard
//!
//! Polls the info / account API for one wallet, keeps a consistent
//! dashboard state despite overlapping polls, recomputes position risk
//! from live mid prices and submits validated trading requests.
//!
//! # Modules
//! - `config`: Startup configuration (TOML + `SYNC_*` environment)
//! - `api`: `ExchangeApi` trait and its `reqwest` client
//! - `mock`: Fixture-backed backend used in test mode
//! - `state`: Dashboard state with per-slot generation counters
//! - `poller`: Interval refresh loop with shutdown
//! - `monitor`: Mark-price ingestion and liquidation alerts
//! - `signer`: Request signature stamping
//! - `trading`: Order desk
//! - `error`: Error taxonomy

pub mod api;
pub mod config;
pub mod error;
pub mod mock;
pub mod monitor;
pub mod poller;
pub mod signer;
pub mod state;
pub mod trading;

pub use api::{ExchangeApi, HttpExchangeApi};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use mock::MockExchangeApi;
pub use monitor::RiskMonitor;
pub use poller::{Poller, PollerHandle};
pub use state::{DashboardSnapshot, DashboardState};
pub use trading::OrderDesk;
