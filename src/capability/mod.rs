//! Trading Capability Module
//!
//! [`TradingCapabilityManager`] answers the questions a strategy has before
//! placing an order: how to round price and amount, which amounts are allowed
//! at a price, what a buy costs and what a sell returns.
//!
//! [`RuleBasedCapabilityManager`] implements it from static [`TradingRules`],
//! either with a fixed price tick or with significant-figure price precision.

mod rules;
mod traits;

pub use rules::{PriceIncrement, RuleBasedCapabilityManager, TradingRules};
pub use traits::{RoundingType, TradingCapabilityManager};
