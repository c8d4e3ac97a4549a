//! Market data records supplied by the host

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::account::TradeId;

/// A single candle of variable length
///
/// The covered window is `[min_time, max_time]`: `min_time` is the start of the
/// candle and `max_time` the time of its latest trade (or its closing time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Price of the first trade in the candle
    pub in_value: f64,
    /// Highest traded price in the candle
    pub max: f64,
    /// Time of the latest trade in the candle or closing time of the candle
    pub max_time: DateTime<Utc>,
    /// Lowest traded price in the candle
    pub min: f64,
    /// Start time of the candle
    pub min_time: DateTime<Utc>,
    /// Price of the last trade in the candle
    pub out_value: f64,
    /// Number of trades included in the candle
    pub trade_number: u64,
    /// Volume traded within the candle
    pub volume: f64,
    /// Volume weighted average price of the candle
    pub vwap: f64,
}

impl Candle {
    /// Length of the window covered by the candle
    pub fn duration(&self) -> Duration {
        self.max_time - self.min_time
    }

    /// Distance between the highest and lowest traded price
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Ticker data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    /// Price of the currency pair one day ago
    pub last_day_price: f64,
    /// Last traded price of the currency pair
    pub last_price: f64,
    /// Timestamp of the ticker data
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    pub fn new(last_price: f64, last_day_price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            last_day_price,
            last_price,
            timestamp,
        }
    }

    /// Relative price change over the last day, `None` without a day price
    pub fn daily_change(&self) -> Option<f64> {
        if self.last_day_price == 0.0 {
            return None;
        }
        Some((self.last_price - self.last_day_price) / self.last_day_price)
    }
}

/// An entry of an order book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    /// Amount of the order book entry
    pub amount: f64,
    /// Price of the order book entry
    pub price: f64,
}

impl OrderBookEntry {
    pub fn new(price: f64, amount: f64) -> Self {
        Self { amount, price }
    }
}

/// Order book with asks ordered by ascending price and bids by descending price
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Asks ordered by price in ascending order
    pub asks: Vec<OrderBookEntry>,
    /// Bids ordered by price in descending order
    pub bids: Vec<OrderBookEntry>,
}

impl OrderBook {
    /// Build an order book, sorting both sides into book order
    pub fn new(mut asks: Vec<OrderBookEntry>, mut bids: Vec<OrderBookEntry>) -> Self {
        asks.sort_by(|a, b| a.price.total_cmp(&b.price));
        bids.sort_by(|a, b| b.price.total_cmp(&a.price));
        Self { asks, bids }
    }

    pub fn best_ask(&self) -> Option<&OrderBookEntry> {
        self.asks.first()
    }

    pub fn best_bid(&self) -> Option<&OrderBookEntry> {
        self.bids.first()
    }

    /// Difference between best ask and best bid
    pub fn spread(&self) -> Option<f64> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }

    /// Midpoint between best ask and best bid
    pub fn mid_price(&self) -> Option<f64> {
        Some((self.best_ask()?.price + self.best_bid()?.price) / 2.0)
    }

    /// Check that asks ascend and bids descend
    pub fn is_sorted(&self) -> bool {
        self.asks.windows(2).all(|w| w[0].price <= w[1].price)
            && self.bids.windows(2).all(|w| w[0].price >= w[1].price)
    }
}

/// Trade done on the currency pair by someone on the exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicTrade {
    /// Amount of the trade
    pub amount: f64,
    /// True if the trade was a buy
    pub buy: bool,
    /// Id of the trade
    pub id: TradeId,
    /// Price at which the trade was executed
    pub price: f64,
    /// Time when the trade was executed in the exchange
    pub timestamp: DateTime<Utc>,
}

impl PublicTrade {
    pub fn new(id: TradeId, buy: bool, price: f64, amount: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            amount,
            buy,
            id,
            price,
            timestamp,
        }
    }

    /// Quote value of the trade
    pub fn value(&self) -> f64 {
        self.amount * self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_order_book_new_sorts_sides() {
        let book = OrderBook::new(
            vec![OrderBookEntry::new(102.0, 1.0), OrderBookEntry::new(101.0, 2.0)],
            vec![OrderBookEntry::new(98.0, 1.0), OrderBookEntry::new(99.0, 3.0)],
        );

        assert!(book.is_sorted());
        assert_eq!(book.best_ask().map(|e| e.price), Some(101.0));
        assert_eq!(book.best_bid().map(|e| e.price), Some(99.0));
        assert_eq!(book.spread(), Some(2.0));
        assert_eq!(book.mid_price(), Some(100.0));
    }

    #[test]
    fn test_order_book_empty_side() {
        let book = OrderBook::new(vec![OrderBookEntry::new(101.0, 1.0)], vec![]);
        assert!(book.best_bid().is_none());
        assert!(book.spread().is_none());
        assert!(book.mid_price().is_none());
    }

    #[test]
    fn test_unsorted_book_detected() {
        let book = OrderBook {
            asks: vec![OrderBookEntry::new(102.0, 1.0), OrderBookEntry::new(101.0, 1.0)],
            bids: vec![],
        };
        assert!(!book.is_sorted());
    }

    #[test]
    fn test_ticker_daily_change() {
        let now = Utc::now();
        let ticker = Ticker::new(110.0, 100.0, now);
        assert!((ticker.daily_change().unwrap() - 0.1).abs() < 1e-12);

        let ticker = Ticker::new(110.0, 0.0, now);
        assert!(ticker.daily_change().is_none());
    }

    #[test]
    fn test_candle_helpers() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let candle = Candle {
            in_value: 100.0,
            max: 105.0,
            max_time: start + Duration::seconds(240),
            min: 99.0,
            min_time: start,
            out_value: 104.0,
            trade_number: 3,
            volume: 2.5,
            vwap: 102.0,
        };
        assert_eq!(candle.duration(), Duration::minutes(4));
        assert_eq!(candle.range(), 6.0);
    }

    #[test]
    fn test_public_trade_value() {
        let trade = PublicTrade::new(1, true, 50.0, 0.5, Utc::now());
        assert_eq!(trade.value(), 25.0);
    }
}
