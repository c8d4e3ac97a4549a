//! Host side of the strategy contract
//!
//! A host owns the buffered market data, funds and orders a strategy works
//! with and implements [`crate::strategy::StrategyContext`]. The crate ships
//! [`PaperHost`], which simulates execution locally.

mod action;
mod paper;

pub use action::{HostAction, HostEvent};
pub(crate) use paper::default_max_recent_trades;
pub use paper::{PaperHost, PaperHostInput};
