//! Account records: funds, orders, own trades and order updates

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exchange id of an open order
pub type OrderId = u64;
/// Id returned by `place_limit_order`, used to match the placing result
pub type OrderPlacingId = u64;
/// Id of a public or private trade
pub type TradeId = u64;

/// Funds per currency code
pub type Funds = HashMap<String, FundsEntry>;

/// An entry in the funds map
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FundsEntry {
    /// The available amount for a currency
    pub available: f64,
    /// The reserved amount for a currency
    pub reserved: f64,
    /// Total amount of a currency in the account
    pub total_for_currency: f64,
}

impl FundsEntry {
    /// Entry with everything available and nothing reserved
    pub fn available(amount: f64) -> Self {
        Self {
            available: amount,
            reserved: 0.0,
            total_for_currency: amount,
        }
    }

    /// Move `amount` from available to reserved
    pub(crate) fn reserve(&mut self, amount: f64) {
        self.available -= amount;
        self.reserved += amount;
    }

    /// Move `amount` from reserved back to available
    pub(crate) fn release(&mut self, amount: f64) {
        self.reserved -= amount;
        self.available += amount;
    }

    /// Remove `amount` from the reserved part, leaving the account
    pub(crate) fn spend_reserved(&mut self, amount: f64) {
        self.reserved -= amount;
        self.total_for_currency -= amount;
    }

    /// Add `amount` to the available part
    pub(crate) fn credit(&mut self, amount: f64) {
        self.available += amount;
        self.total_for_currency += amount;
    }
}

/// An order owned by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Overall amount of the order
    pub amount: f64,
    /// True if the order is a buy order
    pub buy: bool,
    /// Id of the order
    pub id: OrderId,
    /// Price of the order
    pub price: f64,
    /// Amount that has been filled already
    pub received_amount: f64,
    /// Amount that has not been filled yet
    pub remaining_amount: f64,
    /// Timestamp of the order
    pub timestamp: DateTime<Utc>,
}

impl Order {
    /// A fresh, unfilled order
    pub fn new(id: OrderId, buy: bool, amount: f64, price: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            amount,
            buy,
            id,
            price,
            received_amount: 0.0,
            remaining_amount: amount,
            timestamp,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_amount <= 0.0
    }

    /// Filled share of the order in `[0, 1]`
    pub fn fill_ratio(&self) -> f64 {
        if self.amount <= 0.0 {
            return 0.0;
        }
        (self.received_amount / self.amount).clamp(0.0, 1.0)
    }
}

/// A trade owned by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateTrade {
    /// Amount of the trade
    pub amount: f64,
    /// True if the trade was a buy
    pub buy: bool,
    /// Id of the trade
    pub id: TradeId,
    /// Id of the order that the trade belongs to
    pub order_id: OrderId,
    /// Price at which the trade was executed
    pub price: f64,
    /// Timestamp of the trade
    pub timestamp: DateTime<Utc>,
}

impl PrivateTrade {
    /// Quote value of the trade
    pub fn value(&self) -> f64 {
        self.amount * self.price
    }
}

platform_enum! {
    /// What happened to an order since the last update
    pub enum OrderUpdateStatus {
        /// The order was filled
        Filled = 0 => "FILLED",
        /// The order was adapted by the user (the order id changes)
        Adapted = 1 => "ADAPTED",
        /// The order was canceled by the user
        Canceled = 2 => "CANCELED",
        /// The order did not change
        NoChange = 3 => "NO_CHANGE",
        /// The order reappeared after disappearing
        Reappeared = 4 => "REAPPEARED",
        /// The order could not be found anymore; it may get filled or reappear later
        Disappeared = 5 => "DISAPPEARED",
        /// Some other change to the order occurred
        OtherChange = 6 => "OTHER_CHANGE",
        /// The order got partially filled
        PartiallyFilled = 7 => "PARTIALLY_FILLED",
        /// The order was adapted by the user and got filled
        AdaptedAndFilled = 8 => "ADAPTED_AND_FILLED",
    }
}

impl OrderUpdateStatus {
    /// The update carries new fills
    pub fn is_fill(&self) -> bool {
        matches!(
            self,
            OrderUpdateStatus::Filled
                | OrderUpdateStatus::PartiallyFilled
                | OrderUpdateStatus::AdaptedAndFilled
        )
    }

    /// The order is no longer open after this update
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderUpdateStatus::Filled
                | OrderUpdateStatus::Canceled
                | OrderUpdateStatus::AdaptedAndFilled
        )
    }
}

/// Update for a strategy order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// Order as it was before this update
    pub original_order: Option<Order>,
    /// Trades that belong to the order, if any exist so far
    pub resulting_trades: Vec<PrivateTrade>,
    /// What happened to the order since the last update
    pub status: OrderUpdateStatus,
    /// Time of the change
    pub timestamp: DateTime<Utc>,
    /// Order as it is after this update
    pub updated_order: Option<Order>,
}

impl OrderUpdate {
    /// Id of the order this update refers to
    pub fn order_id(&self) -> Option<OrderId> {
        self.updated_order
            .as_ref()
            .or(self.original_order.as_ref())
            .map(|o| o.id)
    }

    /// Amount filled by this update alone
    pub fn filled_delta(&self) -> f64 {
        let before = self.original_order.as_ref().map_or(0.0, |o| o.received_amount);
        let after = self.updated_order.as_ref().map_or(before, |o| o.received_amount);
        after - before
    }
}
