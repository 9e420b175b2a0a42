//! Quantity available to a trade's orders.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Available and order-locked quantity for one trade.
///
/// While the entry is still working, quantity it has already bought is
/// parked in `acquired`; it joins `available` once the entry completes so the
/// entry's own replacement orders are never sized against it.
///
/// Owned by the trade's strategy tree and mutated by one sub-strategy at a
/// time; it carries no locking of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub available: Decimal,
    pub locked: Decimal,
    #[serde(default)]
    pub acquired: Decimal,
}

impl Balance {
    pub fn new(available: Decimal) -> Self {
        Self {
            available,
            locked: Decimal::ZERO,
            acquired: Decimal::ZERO,
        }
    }

    /// Commit `qty` to a newly placed order.
    pub fn lock(&mut self, qty: Decimal) {
        let qty = qty.min(self.available).max(Decimal::ZERO);
        self.available -= qty;
        self.locked += qty;
    }

    /// Return the unfilled part of a canceled order.
    pub fn release(&mut self, qty: Decimal) {
        let qty = qty.max(Decimal::ZERO);
        self.locked = (self.locked - qty).max(Decimal::ZERO);
        self.available += qty;
    }

    /// Remove executed quantity from the locked amount.
    pub fn settle(&mut self, qty: Decimal) {
        self.locked = (self.locked - qty.max(Decimal::ZERO)).max(Decimal::ZERO);
    }

    /// Park executed quantity of an entry order that did not complete.
    pub fn acquire(&mut self, qty: Decimal) {
        let qty = qty.max(Decimal::ZERO);
        self.settle(qty);
        self.acquired += qty;
    }

    /// Entry completed with `filled` on its last order: everything bought
    /// becomes available to the closing legs.
    pub fn open_position(&mut self, filled: Decimal) {
        let filled = filled.max(Decimal::ZERO);
        self.settle(filled);
        self.available += self.acquired + filled;
        self.acquired = Decimal::ZERO;
    }

    pub fn total(&self) -> Decimal {
        self.available + self.locked + self.acquired
    }
}
