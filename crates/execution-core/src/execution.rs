//! Order status reports from the exchange.

use crate::order::{OrderSide, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Execution report pushed (or polled) from the exchange when an order's
/// status changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Event timestamp in milliseconds.
    pub event_time_ms: i64,
    /// Trading pair symbol.
    pub symbol: String,
    /// Exchange-assigned order ID.
    pub order_id: u64,
    /// Order side (buy/sell).
    pub side: OrderSide,
    /// Current order status.
    pub order_status: OrderStatus,
    /// Original order quantity.
    pub quantity: Decimal,
    /// Cumulative filled quantity.
    pub cumulative_filled_qty: Decimal,
    /// Price of the last executed trade (zero if none).
    pub last_executed_price: Decimal,
}

impl ExecutionReport {
    /// Calculate remaining quantity to be filled.
    pub fn remaining_qty(&self) -> Decimal {
        self.quantity - self.cumulative_filled_qty
    }
}

/// Snapshot of a live order returned by a status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusReport {
    /// Exchange-assigned order ID.
    pub order_id: u64,
    /// Original order quantity.
    pub orig_qty: Decimal,
    /// Quantity executed so far.
    pub executed_qty: Decimal,
    /// Current order status.
    pub status: OrderStatus,
}

impl OrderStatusReport {
    /// Quantity that would be released by cancelling the order now.
    pub fn unfilled_qty(&self) -> Decimal {
        (self.orig_qty - self.executed_qty).max(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_report() -> ExecutionReport {
        ExecutionReport {
            event_time_ms: 1000,
            symbol: "BTCUSDT".into(),
            order_id: 12345,
            side: OrderSide::Buy,
            order_status: OrderStatus::New,
            quantity: dec!(1.0),
            cumulative_filled_qty: dec!(0),
            last_executed_price: dec!(0),
        }
    }

    #[test]
    fn test_remaining_qty() {
        let mut report = make_report();
        assert_eq!(report.remaining_qty(), dec!(1.0));

        report.cumulative_filled_qty = dec!(0.3);
        assert_eq!(report.remaining_qty(), dec!(0.7));
    }

    #[test]
    fn test_unfilled_qty_never_negative() {
        let status = OrderStatusReport {
            order_id: 1,
            orig_qty: dec!(2),
            executed_qty: dec!(0.5),
            status: OrderStatus::PartiallyFilled,
        };
        assert_eq!(status.unfilled_qty(), dec!(1.5));

        let overfilled = OrderStatusReport {
            executed_qty: dec!(3),
            ..status
        };
        assert_eq!(overfilled.unfilled_qty(), dec!(0));
    }
}
