//! Price, volume and threshold parameters of a trade leg.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// How a leg's price is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSpec {
    /// A fixed price.
    Absolute(Decimal),
    /// Whatever the market price is when the leg starts.
    Market,
    /// The market price scaled by `1 + pct / 100`.
    Relative(Decimal),
}

impl PriceSpec {
    /// Resolve against the current market price.
    pub fn resolve(&self, market: Decimal) -> Decimal {
        match self {
            Self::Absolute(price) => *price,
            Self::Market => market,
            Self::Relative(pct) => market * (Decimal::ONE + pct / HUNDRED),
        }
    }

    /// The fixed price, if already resolved.
    pub fn absolute(&self) -> Option<Decimal> {
        match self {
            Self::Absolute(price) => Some(*price),
            _ => None,
        }
    }
}

/// How much of the available balance a leg trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Volume {
    /// A fixed quantity.
    Absolute(Decimal),
    /// A percentage of the available balance.
    Percent(Decimal),
}

impl Volume {
    /// Quantity to trade given the available balance.
    pub fn quantity(&self, available: Decimal) -> Decimal {
        match self {
            Self::Absolute(qty) => *qty,
            Self::Percent(pct) => available * pct / HUNDRED,
        }
    }

    /// Quantity this volume needs regardless of balance, if fixed.
    pub fn absolute(&self) -> Option<Decimal> {
        match self {
            Self::Absolute(qty) => Some(*qty),
            Self::Percent(_) => None,
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::Percent(HUNDRED)
    }
}

/// A price distance, fixed or relative to a reference price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Threshold {
    Absolute(Decimal),
    Percent(Decimal),
}

impl Threshold {
    /// Resolve to an absolute distance from `reference`.
    pub fn resolve(&self, reference: Decimal) -> Decimal {
        match self {
            Self::Absolute(distance) => distance.abs(),
            Self::Percent(pct) => (reference * pct / HUNDRED).abs(),
        }
    }
}
