//! Trade runner error types.

use thiserror::Error;

/// Errors that can occur while running a trade.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Strategy error.
    #[error("strategy error: {0}")]
    Strategy(#[from] strategy_core::StrategyError),

    /// Channel closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,
}
