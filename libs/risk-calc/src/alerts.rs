//! One-shot liquidation risk alerts
//!
//! A position raises an alert when its risk level escalates into a level
//! above `Low` that has not already been notified. Sitting at the same
//! level never repeats the alert. Easing off lowers the remembered level,
//! so a later climb back up notifies again.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use types::ids::Coin;
use types::risk::{LiquidationRisk, RiskLevel};

/// Notification raised on a risk escalation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAlert {
    pub coin: Coin,
    pub previous_level: RiskLevel,
    pub risk_level: RiskLevel,
    pub distance_percent: Decimal,
    pub mark_price: Decimal,
}

/// Per-coin memory of the last notified risk level
#[derive(Debug, Clone, Default)]
pub struct RiskAlertTracker {
    notified: BTreeMap<Coin, RiskLevel>,
}

impl RiskAlertTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a fresh classification; returns an alert on escalation
    pub fn observe(&mut self, coin: &Coin, risk: &LiquidationRisk, mark_price: Decimal) -> Option<RiskAlert> {
        let previous = self.last_notified(coin);

        if risk.risk_level > previous && risk.risk_level > RiskLevel::Low {
            self.notified.insert(coin.clone(), risk.risk_level);
            return Some(RiskAlert {
                coin: coin.clone(),
                previous_level: previous,
                risk_level: risk.risk_level,
                distance_percent: risk.distance_percent,
                mark_price,
            });
        }

        if risk.risk_level < previous {
            if risk.risk_level == RiskLevel::Low {
                self.notified.remove(coin);
            } else {
                self.notified.insert(coin.clone(), risk.risk_level);
            }
        }
        None
    }

    /// Level last notified for `coin` (`Low` when none)
    pub fn last_notified(&self, coin: &Coin) -> RiskLevel {
        self.notified.get(coin).copied().unwrap_or(RiskLevel::Low)
    }

    /// Drop memory for a closed position
    pub fn forget(&mut self, coin: &Coin) {
        self.notified.remove(coin);
    }

    /// Keep memory only for coins that still have an open position
    pub fn retain_open(&mut self, open: &BTreeSet<Coin>) {
        self.notified.retain(|coin, _| open.contains(coin));
    }

    pub fn tracked(&self) -> usize {
        self.notified.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(level: RiskLevel) -> LiquidationRisk {
        LiquidationRisk {
            risk_level: level,
            distance_percent: Decimal::ONE,
        }
    }

    #[test]
    fn test_low_never_alerts() {
        let mut tracker = RiskAlertTracker::new();
        let btc = Coin::new("BTC");
        assert!(tracker.observe(&btc, &risk(RiskLevel::Low), Decimal::ONE).is_none());
        assert_eq!(tracker.tracked(), 0);
    }

    #[test]
    fn test_alert_once_per_level() {
        let mut tracker = RiskAlertTracker::new();
        let btc = Coin::new("BTC");

        let alert = tracker.observe(&btc, &risk(RiskLevel::Medium), Decimal::ONE).unwrap();
        assert_eq!(alert.previous_level, RiskLevel::Low);
        assert_eq!(alert.risk_level, RiskLevel::Medium);

        assert!(tracker.observe(&btc, &risk(RiskLevel::Medium), Decimal::ONE).is_none());
        assert!(tracker.observe(&btc, &risk(RiskLevel::Medium), Decimal::ONE).is_none());
    }

    #[test]
    fn test_each_escalation_alerts() {
        let mut tracker = RiskAlertTracker::new();
        let eth = Coin::new("ETH");

        assert!(tracker.observe(&eth, &risk(RiskLevel::Medium), Decimal::ONE).is_some());
        let alert = tracker.observe(&eth, &risk(RiskLevel::Critical), Decimal::ONE).unwrap();
        assert_eq!(alert.previous_level, RiskLevel::Medium);
        assert_eq!(tracker.last_notified(&eth), RiskLevel::Critical);
    }

    #[test]
    fn test_de_escalation_rearms() {
        let mut tracker = RiskAlertTracker::new();
        let btc = Coin::new("BTC");

        assert!(tracker.observe(&btc, &risk(RiskLevel::High), Decimal::ONE).is_some());
        // easing to medium lowers memory without alerting
        assert!(tracker.observe(&btc, &risk(RiskLevel::Medium), Decimal::ONE).is_none());
        assert_eq!(tracker.last_notified(&btc), RiskLevel::Medium);
        // climbing back to high alerts again
        assert!(tracker.observe(&btc, &risk(RiskLevel::High), Decimal::ONE).is_some());

        // back to low clears memory entirely
        assert!(tracker.observe(&btc, &risk(RiskLevel::Low), Decimal::ONE).is_none());
        assert_eq!(tracker.tracked(), 0);
    }

    #[test]
    fn test_coins_are_independent() {
        let mut tracker = RiskAlertTracker::new();
        let btc = Coin::new("BTC");
        let eth = Coin::new("ETH-PERP");

        assert!(tracker.observe(&btc, &risk(RiskLevel::High), Decimal::ONE).is_some());
        assert!(tracker.observe(&eth, &risk(RiskLevel::High), Decimal::ONE).is_some());
        assert_eq!(tracker.tracked(), 2);
    }

    #[test]
    fn test_forget_closed_positions() {
        let mut tracker = RiskAlertTracker::new();
        let btc = Coin::new("BTC");
        let eth = Coin::new("ETH");
        tracker.observe(&btc, &risk(RiskLevel::High), Decimal::ONE);
        tracker.observe(&eth, &risk(RiskLevel::High), Decimal::ONE);

        tracker.retain_open(&BTreeSet::from([eth.clone()]));
        assert_eq!(tracker.last_notified(&btc), RiskLevel::Low);
        assert_eq!(tracker.last_notified(&eth), RiskLevel::High);

        tracker.forget(&eth);
        assert!(tracker.observe(&eth, &risk(RiskLevel::High), Decimal::ONE).is_some());
    }
}
