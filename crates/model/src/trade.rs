//! Trade aggregate.

use execution_core::OrderSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::params::{PriceSpec, Threshold, Volume};
use crate::target::{Target, TargetKind};

/// Overall trade status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    /// Waiting for the entry to fill.
    New,
    /// Position open; stop-loss and profit targets are working.
    Active,
    /// Done. Terminal.
    Completed,
}

/// Selects one of the trailing sections of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeLeg {
    Entry,
    Exit,
}

impl TradeLeg {
    /// Kind tag carried by this section's targets.
    pub fn target_kind(&self) -> TargetKind {
        match self {
            Self::Entry => TargetKind::Entry,
            Self::Exit => TargetKind::Exit,
        }
    }
}

/// An entry or exit section trailed by a smart order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSection {
    /// Explicit side; falls back to a side derived from the trade.
    pub side: Option<OrderSide>,
    /// Legs of this section. The last one is the one being worked.
    pub targets: Vec<Target>,
    /// Distance between the best price and the stop trigger.
    pub sl_threshold: Threshold,
    /// Minimum move before the trigger is allowed to move again.
    pub pullback_threshold: Threshold,
    /// Trigger price of the last order placed for this section.
    pub best_price: Option<Decimal>,
}

impl TradeSection {
    /// A section with one leg.
    pub fn new(target: Target, sl_threshold: Threshold, pullback_threshold: Threshold) -> Self {
        Self {
            side: None,
            targets: vec![target],
            sl_threshold,
            pullback_threshold,
            best_price: None,
        }
    }

    /// Builder method to set an explicit side.
    pub fn with_side(mut self, side: OrderSide) -> Self {
        self.side = Some(side);
        self
    }

    /// The leg currently being worked.
    pub fn target(&self) -> Option<&Target> {
        self.targets.last()
    }

    pub fn target_mut(&mut self) -> Option<&mut Target> {
        self.targets.last_mut()
    }

    pub fn is_completed(&self) -> bool {
        !self.targets.is_empty() && self.targets.iter().all(Target::is_completed)
    }
}

/// A trade: entry, exit, stop-loss and profit targets for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    /// Side of the closing orders. Entries default to the opposite side.
    pub side: OrderSide,
    pub status: TradeStatus,
    pub entry: Option<TradeSection>,
    pub exit: Option<TradeSection>,
    pub stop_loss: Option<Target>,
    pub targets: Vec<Target>,
}

impl Trade {
    /// Create an empty trade with a generated ID.
    pub fn new(symbol: impl Into<String>, side: OrderSide) -> Self {
        Self {
            id: Uuid::new_v4().as_simple().to_string(),
            symbol: symbol.into(),
            side,
            status: TradeStatus::New,
            entry: None,
            exit: None,
            stop_loss: None,
            targets: Vec::new(),
        }
    }

    /// Builder method to set the entry section.
    pub fn with_entry(mut self, section: TradeSection) -> Self {
        self.entry = Some(section);
        self
    }

    /// Builder method to set the exit section.
    pub fn with_exit(mut self, section: TradeSection) -> Self {
        self.exit = Some(section);
        self
    }

    /// Builder method to set a stop-loss leg at `price`.
    pub fn with_stop_loss(mut self, price: Decimal, volume: Volume) -> Self {
        self.stop_loss = Some(Target::new(
            TargetKind::StopLoss,
            PriceSpec::Absolute(price),
            volume,
        ));
        self
    }

    /// Builder method to add a profit target at `price`.
    pub fn with_target(mut self, price: Decimal, volume: Volume) -> Self {
        self.targets.push(Target::new(
            TargetKind::Profit,
            PriceSpec::Absolute(price),
            volume,
        ));
        self
    }

    pub fn section(&self, leg: TradeLeg) -> Option<&TradeSection> {
        match leg {
            TradeLeg::Entry => self.entry.as_ref(),
            TradeLeg::Exit => self.exit.as_ref(),
        }
    }

    pub fn section_mut(&mut self, leg: TradeLeg) -> Option<&mut TradeSection> {
        match leg {
            TradeLeg::Entry => self.entry.as_mut(),
            TradeLeg::Exit => self.exit.as_mut(),
        }
    }

    /// Side used by a section: its explicit side, else derived from the trade.
    pub fn section_side(&self, leg: TradeLeg) -> OrderSide {
        let explicit = self.section(leg).and_then(|s| s.side);
        explicit.unwrap_or(match leg {
            TradeLeg::Entry => self.side.reverse(),
            TradeLeg::Exit => self.side,
        })
    }

    /// Transition `New -> Active`. Returns `true` if the status changed.
    pub fn set_active(&mut self) -> bool {
        if self.status == TradeStatus::New {
            self.status = TradeStatus::Active;
            true
        } else {
            false
        }
    }

    /// Transition to `Completed`. Returns `true` if the status changed.
    pub fn set_completed(&mut self) -> bool {
        if self.status == TradeStatus::Completed {
            return false;
        }
        self.status = TradeStatus::Completed;
        true
    }

    pub fn is_completed(&self) -> bool {
        self.status == TradeStatus::Completed
    }

    /// Find the leg that owns an exchange order.
    pub fn target_by_order_id_mut(&mut self, order_id: u64) -> Option<&mut Target> {
        self.entry
            .iter_mut()
            .chain(self.exit.iter_mut())
            .flat_map(|s| s.targets.iter_mut())
            .chain(self.stop_loss.iter_mut())
            .chain(self.targets.iter_mut())
            .find(|t| t.order_id == Some(order_id))
    }
}
