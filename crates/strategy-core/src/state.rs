//! Mutable state of one trade.

use model::{Balance, Trade};

/// The trade and its balance, owned by the orchestrator and lent to one
/// sub-strategy at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeState {
    pub trade: Trade,
    pub balance: Balance,
}

impl TradeState {
    pub fn new(trade: Trade, balance: Balance) -> Self {
        Self { trade, balance }
    }

    /// Whether the stop-loss leg has a working order on the exchange.
    pub fn is_stop_loss_order_active(&self) -> bool {
        self.trade.stop_loss.as_ref().is_some_and(|t| t.is_active())
    }
}
