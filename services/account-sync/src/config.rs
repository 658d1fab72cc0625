//! Service configuration
//!
//! Loaded once at startup: defaults, then an optional TOML file, then
//! `SYNC_*` environment variables (a `.env` file is honoured). The result
//! is passed by value to everything that needs it; nothing re-reads the
//! environment later.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use risk_calc::RiskThresholds;
use rust_decimal::Decimal;
use serde::Deserialize;
use types::ids::Address;
use types::numeric::parse_decimal;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the info / account / trade API
    pub api_url: String,
    /// Wallet address whose account is followed
    pub address: Option<String>,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    /// Serve fixtures from the in-process mock backend
    pub test_mode: bool,
    pub log_level: String,
    pub risk: RiskConfig,
}

/// Liquidation-distance cutoffs in percent
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub medium_percent: Decimal,
    pub high_percent: Decimal,
    pub critical_percent: Decimal,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8001".to_string(),
            address: None,
            poll_interval_ms: 5_000,
            request_timeout_ms: 10_000,
            test_mode: false,
            log_level: "info".to_string(),
            risk: RiskConfig::default(),
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        let thresholds = RiskThresholds::default();
        Self {
            medium_percent: thresholds.medium,
            high_percent: thresholds.high,
            critical_percent: thresholds.critical,
        }
    }
}

impl RiskConfig {
    pub fn thresholds(&self) -> RiskThresholds {
        RiskThresholds {
            medium: self.medium_percent,
            high: self.high_percent,
            critical: self.critical_percent,
        }
    }
}

impl SyncConfig {
    /// Load from an optional TOML file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                Self::from_toml_str(&contents)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `SYNC_*` overrides from `lookup` (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SYNC_API_URL") {
            self.api_url = url;
        }
        if let Some(address) = lookup("SYNC_ADDRESS") {
            self.address = Some(address);
        }
        if let Some(interval) = lookup("SYNC_POLL_INTERVAL_MS") {
            self.poll_interval_ms = interval
                .trim()
                .parse()
                .with_context(|| format!("SYNC_POLL_INTERVAL_MS is not a number: {interval}"))?;
        }
        if let Some(timeout) = lookup("SYNC_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = timeout
                .trim()
                .parse()
                .with_context(|| format!("SYNC_REQUEST_TIMEOUT_MS is not a number: {timeout}"))?;
        }
        if let Some(flag) = lookup("SYNC_TEST_MODE") {
            self.test_mode = parse_flag(&flag)
                .with_context(|| format!("SYNC_TEST_MODE is not a boolean: {flag}"))?;
        }
        if let Some(level) = lookup("SYNC_LOG_LEVEL") {
            self.log_level = level;
        }
        for (key, slot) in [
            ("SYNC_RISK_MEDIUM_PERCENT", &mut self.risk.medium_percent),
            ("SYNC_RISK_HIGH_PERCENT", &mut self.risk.high_percent),
            ("SYNC_RISK_CRITICAL_PERCENT", &mut self.risk.critical_percent),
        ] {
            if let Some(raw) = lookup(key) {
                *slot = parse_decimal(&raw).with_context(|| format!("{key} is not a number: {raw}"))?;
            }
        }
        Ok(())
    }

    /// Every problem with the configuration; empty when usable
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            issues.push(format!("Invalid API URL: {}", self.api_url));
        }
        if self.poll_interval_ms == 0 {
            issues.push("Poll interval must be positive".to_string());
        }
        if self.request_timeout_ms == 0 {
            issues.push("Request timeout must be positive".to_string());
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            issues.push(format!("Invalid log level: {}", self.log_level));
        }
        if let Some(address) = &self.address {
            if Address::parse(address).is_err() {
                issues.push(format!("Invalid wallet address: {address}"));
            }
        } else if !self.test_mode {
            issues.push("A wallet address is required outside test mode".to_string());
        }
        if !self.risk.thresholds().is_well_ordered() {
            issues.push("Risk thresholds must be positive and strictly decreasing".to_string());
        }

        issues
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Parsed wallet address, if one is configured
    pub fn wallet_address(&self) -> Result<Option<Address>> {
        self.address
            .as_deref()
            .map(|raw| Address::parse(raw).with_context(|| format!("Invalid wallet address: {raw}")))
            .transpose()
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
