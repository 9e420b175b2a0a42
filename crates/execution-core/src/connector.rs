//! Exchange connector capability consumed by the strategies.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ExchangeError;
use crate::execution::OrderStatusReport;
use crate::order::OrderSide;

/// A stop-limit order request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopLimitRequest {
    /// Trading pair symbol.
    pub symbol: String,
    /// Buy or sell.
    pub side: OrderSide,
    /// Price at which the order becomes a limit order.
    pub stop_price: Decimal,
    /// Limit price once triggered.
    pub limit_price: Decimal,
    /// Order quantity.
    pub quantity: Decimal,
}

/// Acknowledgement of an accepted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    /// Exchange-assigned order ID.
    pub order_id: u64,
}

/// Result of submitting a stop-limit order.
///
/// The immediate-trigger rejection gets its own variant so callers can fall
/// back to a market order with a plain `match`.
#[derive(Debug, Clone, PartialEq)]
pub enum StopOrderOutcome {
    /// Order accepted by the exchange.
    Placed(PlacedOrder),
    /// Stop price already crossed by the market; nothing was placed.
    WouldTriggerImmediately,
    /// Any other rejection or transport failure.
    Failed(ExchangeError),
}

impl From<Result<PlacedOrder, ExchangeError>> for StopOrderOutcome {
    fn from(result: Result<PlacedOrder, ExchangeError>) -> Self {
        match result {
            Ok(order) => Self::Placed(order),
            Err(e) if e.is_would_trigger_immediately() => Self::WouldTriggerImmediately,
            Err(e) => Self::Failed(e),
        }
    }
}

/// Order management operations against one exchange account.
///
/// Calls complete (or fail) before returning, so a `cancel_order` awaited
/// before a `create_*` call is observed by the exchange in that order.
#[async_trait]
pub trait ExchangeConnector: Send + Sync {
    /// Query the live status of an order.
    async fn order_status(
        &self,
        symbol: &str,
        order_id: u64,
    ) -> Result<OrderStatusReport, ExchangeError>;

    /// Cancel an order.
    ///
    /// Returns `Ok(false)` when the order was no longer cancelable (already
    /// filled or canceled); callers reconcile status rather than fail.
    async fn cancel_order(&self, symbol: &str, order_id: u64) -> Result<bool, ExchangeError>;

    /// Submit a stop-limit order.
    async fn create_stop_limit_order(&self, request: &StopLimitRequest) -> StopOrderOutcome;

    /// Submit a market order.
    async fn create_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<PlacedOrder, ExchangeError>;

    /// Submit a good-till-canceled limit order.
    async fn create_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<PlacedOrder, ExchangeError>;
}

/// Shared exchange connector handle.
pub type SharedExchange = Arc<dyn ExchangeConnector>;
