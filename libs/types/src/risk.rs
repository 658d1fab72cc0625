//! Risk classification types
//!
//! Severity bands shown as badges next to positions and on the account
//! margin gauge.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Liquidation-risk severity, ordered from safest to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// Distance of a position's mark price from its liquidation price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidationRisk {
    pub risk_level: RiskLevel,
    /// `|mark - liquidation| / mark × 100`
    pub distance_percent: Decimal,
}

/// Account-wide margin utilisation band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilizationLevel {
    Low,
    Medium,
    High,
}
