//! Market events delivered to a running strategy

use serde::{Deserialize, Serialize};

use super::types::{OrderBook, PublicTrade, Ticker};

/// A piece of market data pushed by a feed
///
/// Serialised externally tagged, one event per line in replay files:
/// `{"Ticker": {...}}`, `{"OrderBook": {...}}`, `{"PublicTrades": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarketEvent {
    OrderBook(OrderBook),
    PublicTrades(Vec<PublicTrade>),
    Ticker(Ticker),
}

impl MarketEvent {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            MarketEvent::OrderBook(_) => "order_book",
            MarketEvent::PublicTrades(_) => "public_trades",
            MarketEvent::Ticker(_) => "ticker",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay_line() {
        let line = r#"{"Ticker":{"last_day_price":90.0,"last_price":100.0,"timestamp":"2024-03-01T10:00:00Z"}}"#;
        let event: MarketEvent = serde_json::from_str(line).unwrap();
        match event {
            MarketEvent::Ticker(ticker) => assert_eq!(ticker.last_price, 100.0),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_kind() {
        assert_eq!(MarketEvent::PublicTrades(vec![]).kind(), "public_trades");
        assert_eq!(MarketEvent::OrderBook(OrderBook::default()).kind(), "order_book");
    }
}
