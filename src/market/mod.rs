//! Market Data Module
//!
//! Records describing the public state of the traded currency pair, as the
//! host hands them to strategies:
//!
//! - [`Candle`] - OHLC, volume and vwap over a variable time window
//! - [`Ticker`] - last price and price one day ago
//! - [`OrderBook`] - asks ascending, bids descending
//! - [`PublicTrade`] - a trade done by anyone on the exchange
//!
//! # Example
//!
//! ```rust
//! use margin_strategy_sdk::market::{OrderBook, OrderBookEntry};
//!
//! let book = OrderBook::new(
//!     vec![OrderBookEntry::new(101.0, 1.0)],
//!     vec![OrderBookEntry::new(99.0, 2.0)],
//! );
//! assert_eq!(book.mid_price(), Some(100.0));
//! ```

mod candles;
mod event;
mod pair;
mod types;

pub use candles::{aggregate_candles, DEFAULT_NUMBER_OF_CANDLES};
pub use event::MarketEvent;
pub use pair::CurrencyPair;
pub use types::{Candle, OrderBook, OrderBookEntry, PublicTrade, Ticker};
