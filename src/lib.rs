#![deny(unreachable_pub)]
//! Strategy SDK for the Margin trading platform
//!
//! Strategies implement [`strategy::Strategy`] and talk to their host through
//! [`strategy::StrategyContext`]. The crate ships a paper trading host, a
//! rule-based [`capability::TradingCapabilityManager`] and a runner that
//! drives a strategy from a market feed.

#[macro_use]
mod macros;

pub mod account;
pub mod capability;
pub mod config;
mod errors;
pub mod host;
pub mod logging;
pub mod market;
pub mod runner;
pub mod strategy;

pub use errors::{Error, Result};
