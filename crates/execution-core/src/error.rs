//! Exchange error types.

use thiserror::Error;

/// Binance code for a rejected new order (message carries the reason).
const NEW_ORDER_REJECTED: i32 = -2010;
/// Binance futures code for a stop order that would trigger immediately.
const ORDER_WOULD_IMMEDIATELY_TRIGGER: i32 = -2021;

/// Errors returned by an [`ExchangeConnector`](crate::ExchangeConnector).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// Exchange API error.
    #[error("exchange API error {code}: {message}")]
    Api {
        /// Exchange error code.
        code: i32,
        /// Error message.
        message: String,
    },

    /// The stop price has already been crossed by the market.
    #[error("order would trigger immediately")]
    WouldTriggerImmediately,

    /// Order not found (already filled, canceled, or never acknowledged).
    #[error("order not found")]
    OrderNotFound,

    /// Insufficient balance for the order.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Network or transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ExchangeError {
    /// Classify an exchange error code and message into a specific error.
    pub fn from_api(code: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            ORDER_WOULD_IMMEDIATELY_TRIGGER => Self::WouldTriggerImmediately,
            NEW_ORDER_REJECTED
                if message
                    .to_lowercase()
                    .contains("order would trigger immediately") =>
            {
                Self::WouldTriggerImmediately
            }
            NEW_ORDER_REJECTED
                if message.to_lowercase().contains("insufficient balance") =>
            {
                Self::InsufficientBalance
            }
            -2011 | -2013 => Self::OrderNotFound,
            _ => Self::Api { code, message },
        }
    }

    /// Check if this error is the immediate-execution rejection.
    pub fn is_would_trigger_immediately(&self) -> bool {
        matches!(self, Self::WouldTriggerImmediately)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_immediate_trigger() {
        let err = ExchangeError::from_api(-2010, "Order would trigger immediately.");
        assert!(err.is_would_trigger_immediately());

        let err = ExchangeError::from_api(-2021, "Order would immediately trigger.");
        assert!(err.is_would_trigger_immediately());
    }

    #[test]
    fn test_classify_other_rejections() {
        assert_eq!(
            ExchangeError::from_api(-2010, "Account has insufficient balance for requested action."),
            ExchangeError::InsufficientBalance
        );
        assert_eq!(
            ExchangeError::from_api(-2011, "Unknown order sent."),
            ExchangeError::OrderNotFound
        );

        let err = ExchangeError::from_api(-1013, "Filter failure: LOT_SIZE");
        assert!(!err.is_would_trigger_immediately());
        assert!(matches!(err, ExchangeError::Api { code: -1013, .. }));
    }
}
