//! A single leg of a trade.

use execution_core::{OrderSide, OrderStatus};
use serde::{Deserialize, Serialize};

use crate::params::{PriceSpec, Volume};

/// Which part of the trade a leg belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Entry,
    Exit,
    StopLoss,
    Profit,
}

/// Leg status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetStatus {
    /// No order placed yet.
    New,
    /// An order is working on the exchange.
    Active,
    /// The working order was canceled; usually replaced on the next trigger.
    Canceled,
    /// Fully filled. Terminal.
    Completed,
}

/// One order within a trade: entry, exit, stop-loss or a profit target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub kind: TargetKind,
    /// Explicit side; `None` means the side of the section or trade applies.
    pub side: Option<OrderSide>,
    pub price: PriceSpec,
    pub volume: Volume,
    /// Exchange order ID of the most recent order placed for this leg.
    pub order_id: Option<u64>,
    pub status: TargetStatus,
}

impl Target {
    pub fn new(kind: TargetKind, price: PriceSpec, volume: Volume) -> Self {
        Self {
            kind,
            side: None,
            price,
            volume,
            order_id: None,
            status: TargetStatus::New,
        }
    }

    /// Builder method to set an explicit side.
    pub fn with_side(mut self, side: OrderSide) -> Self {
        self.side = Some(side);
        self
    }

    pub fn is_entry_target(&self) -> bool {
        self.kind == TargetKind::Entry
    }

    pub fn is_active(&self) -> bool {
        self.status == TargetStatus::Active
    }

    pub fn is_completed(&self) -> bool {
        self.status == TargetStatus::Completed
    }

    /// Record a newly placed order.
    pub fn set_active(&mut self, order_id: u64) {
        self.order_id = Some(order_id);
        self.status = TargetStatus::Active;
    }

    pub fn set_canceled(&mut self) {
        if self.status == TargetStatus::Active {
            self.status = TargetStatus::Canceled;
        }
    }

    pub fn set_completed(&mut self) {
        self.status = TargetStatus::Completed;
    }

    /// Apply an exchange-reported order status.
    ///
    /// Returns `true` only if the leg's status changed, so re-delivered
    /// reports are no-ops.
    pub fn apply_order_status(&mut self, status: OrderStatus) -> bool {
        match status {
            OrderStatus::Filled if !self.is_completed() => {
                self.set_completed();
                true
            }
            OrderStatus::Canceled | OrderStatus::Expired | OrderStatus::Rejected
                if self.is_active() =>
            {
                self.set_canceled();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry() -> Target {
        Target::new(
            TargetKind::Entry,
            PriceSpec::Absolute(dec!(100)),
            Volume::Absolute(dec!(1)),
        )
    }

    #[test]
    fn test_lifecycle() {
        let mut target = entry();
        assert_eq!(target.status, TargetStatus::New);
        assert_eq!(target.order_id, None);

        target.set_active(10);
        assert!(target.is_active());
        assert_eq!(target.order_id, Some(10));

        target.set_canceled();
        assert_eq!(target.status, TargetStatus::Canceled);

        target.set_active(11);
        target.set_completed();
        assert!(target.is_completed());
    }

    #[test]
    fn test_cancel_only_from_active() {
        let mut target = entry();
        target.set_canceled();
        assert_eq!(target.status, TargetStatus::New);

        target.set_completed();
        target.set_canceled();
        assert!(target.is_completed());
    }

    #[test]
    fn test_apply_order_status_is_idempotent() {
        let mut target = entry();
        target.set_active(10);

        assert!(!target.apply_order_status(OrderStatus::PartiallyFilled));
        assert!(target.apply_order_status(OrderStatus::Filled));
        assert!(!target.apply_order_status(OrderStatus::Filled));
        assert!(!target.apply_order_status(OrderStatus::Canceled));
        assert!(target.is_completed());
    }

    #[test]
    fn test_tags() {
        assert!(entry().is_entry_target());

        let exit = Target::new(TargetKind::Exit, PriceSpec::Market, Volume::default())
            .with_side(OrderSide::Sell);
        assert!(!exit.is_entry_target());
        assert_eq!(exit.side, Some(OrderSide::Sell));
    }
}
