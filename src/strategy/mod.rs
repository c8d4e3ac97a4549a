//! Strategy Interface Module
//!
//! A strategy reacts to market data and order events delivered by a host.
//! Every callback receives a [`StrategyContext`] through which the strategy
//! reads buffered data and places or cancels orders. Order actions are
//! asynchronous: their results arrive through later callbacks.
//!
//! # Design Philosophy
//!
//! - **Host-agnostic**: Strategies only talk to the [`StrategyContext`] trait
//! - **Testable**: Any type implementing the context can drive a strategy
//! - **Declarative data needs**: [`StrategyConfig`] lists the subscribed data types
//! - **Stateful**: Strategies persist themselves through [`StrategyState`]
//!
//! # Example
//!
//! ```rust
//! use margin_strategy_sdk::market::Ticker;
//! use margin_strategy_sdk::strategy::{
//!     DataSubscriptionType, Strategy, StrategyConfig, StrategyContext,
//! };
//!
//! struct BuyTheDip {
//!     placed: bool,
//! }
//!
//! impl Strategy for BuyTheDip {
//!     fn get_strategy_config(&self) -> StrategyConfig {
//!         StrategyConfig::new().with_subscription(DataSubscriptionType::Ticker)
//!     }
//!
//!     fn on_new_ticker(&mut self, ctx: &mut dyn StrategyContext, ticker: &Ticker) {
//!         if !self.placed && ticker.daily_change().is_some_and(|c| c < -0.05) {
//!             ctx.place_limit_order(true, 0.1, ticker.last_price);
//!             self.placed = true;
//!         }
//!     }
//! }
//! ```

mod config;
mod registry;
mod threshold;
mod traits;

pub use config::{DataSubscriptionType, StrategyConfig};
pub use registry::{
    BoxedStrategy, NoOpStrategyFactory, StrategyFactory, StrategyRegistry,
    ThresholdStrategyFactory,
};
pub use threshold::{ThresholdConfig, ThresholdStrategy};
pub use traits::{ExitReason, NoOpStrategy, Strategy, StrategyContext, StrategyState};
