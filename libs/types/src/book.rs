//! Order book snapshot per `/api/info/orderbook/{coin}`

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single aggregated price level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub px: Decimal,
    pub sz: Decimal,
    /// Number of resting orders at this level
    pub n: u32,
}

/// Bids sorted best (highest) first, asks sorted best (lowest) first
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.iter().map(|l| l.px).max()
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.iter().map(|l| l.px).min()
    }

    /// Midpoint of the best bid and ask; None unless both sides are populated
    pub fn mid_price(&self) -> Option<Decimal> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Some((bid + ask) / Decimal::TWO)
    }

    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()? - self.best_bid()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(px: u32, sz: &str) -> BookLevel {
        BookLevel {
            px: Decimal::from(px),
            sz: Decimal::from_str_exact(sz).unwrap(),
            n: 1,
        }
    }

    #[test]
    fn test_best_prices_and_mid() {
        let book = OrderBook {
            bids: vec![level(94_990, "1.0"), level(94_995, "0.5")],
            asks: vec![level(95_010, "2.0"), level(95_005, "0.3")],
        };
        assert_eq!(book.best_bid(), Some(Decimal::from(94_995)));
        assert_eq!(book.best_ask(), Some(Decimal::from(95_005)));
        assert_eq!(book.mid_price(), Some(Decimal::from(95_000)));
        assert_eq!(book.spread(), Some(Decimal::from(10)));
    }

    #[test]
    fn test_one_sided_book_has_no_mid() {
        let book = OrderBook {
            bids: vec![level(100, "1")],
            asks: vec![],
        };
        assert_eq!(book.mid_price(), None);
        assert_eq!(OrderBook::default().best_bid(), None);
    }
}
