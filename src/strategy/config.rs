//! Strategy requirements declared to the host

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

platform_enum! {
    /// Data updates a strategy can subscribe to
    pub enum DataSubscriptionType {
        /// Receive the latest order book updates
        OrderBook = 0 => "ORDER_BOOK",
        /// Receive the latest public trade history updates
        PublicTradeHistory = 1 => "PUBLIC_TRADE_HISTORY",
        /// Receive the latest ticker
        Ticker = 2 => "TICKER",
        /// Receive the latest changes to your relevant funds
        Funds = 3 => "FUNDS",
    }
}

/// Configuration of a strategy
///
/// Determines which `on_new_*` callbacks the host invokes: only the data types
/// listed in `required_data_updates` are delivered. Order updates and the
/// results of placing or canceling orders are always delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Data types required by the strategy
    pub required_data_updates: HashSet<DataSubscriptionType>,
}

impl StrategyConfig {
    /// Config without any data subscription
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a data subscription
    pub fn with_subscription(mut self, subscription: DataSubscriptionType) -> Self {
        self.required_data_updates.insert(subscription);
        self
    }

    pub fn is_subscribed(&self, subscription: DataSubscriptionType) -> bool {
        self.required_data_updates.contains(&subscription)
    }
}

impl FromIterator<DataSubscriptionType> for StrategyConfig {
    fn from_iter<I: IntoIterator<Item = DataSubscriptionType>>(iter: I) -> Self {
        Self {
            required_data_updates: iter.into_iter().collect(),
        }
    }
}
