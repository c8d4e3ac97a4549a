//! Crate-wide error types

use thiserror::Error;

use crate::account::OrderId;

/// Errors raised by the SDK, the paper host and the runner
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid trading rules: {0}")]
    InvalidRules(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Insufficient {currency} funds: required {required}, available {available}")]
    InsufficientFunds {
        currency: String,
        required: f64,
        available: f64,
    },

    #[error("Order not found: id {0}")]
    OrderNotFound(OrderId),

    #[error("Cannot {operation} while strategy is {state}")]
    InvalidState { operation: String, state: String },

    #[error("Stored strategy state does not match: {0}")]
    StateMismatch(String),

    #[error("Unknown strategy type: {0}")]
    UnknownStrategy(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Market feed error: {0}")]
    Feed(String),
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, Error>;
