//! Account Data Module
//!
//! Records describing the user's own state on the exchange: funds per
//! currency, open orders, own trades and order updates.

mod types;

pub use types::{
    Funds, FundsEntry, Order, OrderId, OrderPlacingId, OrderUpdate, OrderUpdateStatus,
    PrivateTrade, TradeId,
};
