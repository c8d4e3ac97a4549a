//! Requests queued by a strategy and the events the host answers with

use crate::account::{Order, OrderId, OrderPlacingId, OrderUpdate};

/// Order action requested through the strategy context
///
/// Actions are queued when the strategy calls `place_limit_order` or
/// `cancel_order` and executed after the current callback returns.
#[derive(Debug, Clone, PartialEq)]
pub enum HostAction {
    Place {
        order_placing_id: OrderPlacingId,
        buy: bool,
        amount: f64,
        price: f64,
    },
    Cancel {
        order_id: OrderId,
    },
}

/// Outcome reported by the host, dispatched to the strategy by the runner
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    PlaceSucceeded {
        order_placing_id: OrderPlacingId,
        order: Order,
    },
    PlaceFailed {
        order_placing_id: OrderPlacingId,
        error_message: String,
    },
    CancelSucceeded {
        order_id: OrderId,
        order: Order,
    },
    CancelFailed {
        order_id: OrderId,
        error_message: String,
    },
    OrderUpdated(OrderUpdate),
    FundsChanged,
}

impl HostEvent {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            HostEvent::PlaceSucceeded { .. } => "place_succeeded",
            HostEvent::PlaceFailed { .. } => "place_failed",
            HostEvent::CancelSucceeded { .. } => "cancel_succeeded",
            HostEvent::CancelFailed { .. } => "cancel_failed",
            HostEvent::OrderUpdated(_) => "order_updated",
            HostEvent::FundsChanged => "funds_changed",
        }
    }
}
