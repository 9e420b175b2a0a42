//! Exchange trading rules for a symbol.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Price and quantity increments mandated by the exchange for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRules {
    /// Trading pair symbol.
    pub symbol: String,
    /// Minimum price increment. Zero disables price rounding.
    pub tick_size: Decimal,
    /// Minimum quantity increment. Zero disables quantity rounding.
    pub step_size: Decimal,
    /// Minimum order quantity.
    pub min_qty: Decimal,
}

impl SymbolRules {
    /// Create rules with the given increments and no minimum quantity.
    pub fn new(symbol: impl Into<String>, tick_size: Decimal, step_size: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            tick_size,
            step_size,
            min_qty: Decimal::ZERO,
        }
    }

    /// Rules that leave prices and quantities untouched.
    pub fn unrestricted(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Decimal::ZERO, Decimal::ZERO)
    }

    /// Builder method to set the minimum order quantity.
    pub fn with_min_qty(mut self, min_qty: Decimal) -> Self {
        self.min_qty = min_qty;
        self
    }

    /// Round a price to the nearest tick.
    pub fn adjust_price(&self, price: Decimal) -> Decimal {
        if self.tick_size <= Decimal::ZERO {
            return price;
        }
        let ticks = (price / self.tick_size)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        (ticks * self.tick_size).normalize()
    }

    /// Round a quantity down to the lot step so it never exceeds what was asked.
    pub fn adjust_quantity(&self, quantity: Decimal) -> Decimal {
        if self.step_size <= Decimal::ZERO {
            return quantity;
        }
        let steps = (quantity / self.step_size).floor();
        (steps * self.step_size).normalize()
    }

    /// Check that a (rounded) quantity is tradable.
    pub fn is_tradable_quantity(&self, quantity: Decimal) -> bool {
        quantity > Decimal::ZERO && quantity >= self.min_qty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_adjust_price_to_tick() {
        let rules = SymbolRules::new("BTCUSDT", dec!(0.01), dec!(0.001));

        assert_eq!(rules.adjust_price(dec!(50000.123)), dec!(50000.12));
        assert_eq!(rules.adjust_price(dec!(50000.125)), dec!(50000.13));
        assert_eq!(rules.adjust_price(dec!(98)), dec!(98));
    }

    #[test]
    fn test_adjust_quantity_rounds_down() {
        let rules = SymbolRules::new("BTCUSDT", dec!(0.01), dec!(0.001));

        assert_eq!(rules.adjust_quantity(dec!(0.12345)), dec!(0.123));
        assert_eq!(rules.adjust_quantity(dec!(0.0009)), dec!(0));
    }

    #[test]
    fn test_unrestricted_rules_pass_through() {
        let rules = SymbolRules::unrestricted("BTCUSDT");
        assert_eq!(rules.adjust_price(dec!(1.23456789)), dec!(1.23456789));
        assert_eq!(rules.adjust_quantity(dec!(0.00000001)), dec!(0.00000001));
    }

    #[test]
    fn test_tradable_quantity() {
        let rules = SymbolRules::new("BTCUSDT", dec!(0.01), dec!(0.001)).with_min_qty(dec!(0.01));
        assert!(rules.is_tradable_quantity(dec!(0.01)));
        assert!(!rules.is_tradable_quantity(dec!(0.009)));
        assert!(!rules.is_tradable_quantity(dec!(0)));
    }
}
