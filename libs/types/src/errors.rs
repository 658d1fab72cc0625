//! Error types shared across the dashboard crates
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Errors raised while parsing wire or user input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty value")]
    Empty,

    #[error("Invalid decimal: {0}")]
    InvalidDecimal(String),

    #[error("Invalid coin symbol: {0}. Must be uppercase letters, 2-10 characters")]
    InvalidCoin(String),

    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),
}

/// Structural errors in trading request bodies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Market orders must have limit_px = 0")]
    MarketOrderWithPrice,

    #[error("Limit orders must have limit_px > 0")]
    LimitOrderWithoutPrice,

    #[error("Stop orders must have stop_px specified")]
    StopOrderWithoutTrigger,

    #[error("Post-only is only valid for limit orders")]
    PostOnlyRequiresLimit,

    #[error("Post-only cannot be combined with IOC or FOK")]
    PostOnlyWithImmediateTif,

    #[error("Order size must be greater than 0 and at most {max}")]
    SizeOutOfRange { max: String },

    #[error("At least one of new_px or new_sz must be provided")]
    EmptyModification,

    #[error("Either addSize or reduceSize must be provided")]
    MissingSizeChange,

    #[error("Cannot provide both addSize and reduceSize")]
    ConflictingSizeChange,

    #[error("Order ID must be positive")]
    InvalidOrderId,
}
