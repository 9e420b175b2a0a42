//! Strategy error types.

use execution_core::ExchangeError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while building or running a strategy.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// Not enough balance to start the trade.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    /// A smart order was fed a price before being initialized.
    #[error("smart order not initialized")]
    NotInitialized,

    /// The trade description cannot be executed.
    #[error("invalid trade: {0}")]
    InvalidTrade(String),

    /// Order placement failed on the exchange.
    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),
}
