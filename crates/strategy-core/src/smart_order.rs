//! Trailing stop trigger.
//!
//! A [`SmartOrder`] follows the best price seen since initialization and
//! proposes a stop trigger a fixed distance behind it. A new trigger is only
//! proposed once the price has moved at least the pullback distance away from
//! where the previous one was proposed, so a noisy feed does not replace the
//! exchange order on every tick.
//!
//! For a buy-side order the favorable direction is down and the trigger sits
//! below the best price; for a sell-side order it is up and the trigger sits
//! above it.

use execution_core::OrderSide;
use model::Threshold;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::StrategyError;

/// Trailing-trigger engine. Pure; performs no I/O.
#[derive(Debug, Clone)]
pub struct SmartOrder {
    side: OrderSide,
    sl_threshold: Threshold,
    pullback_threshold: Threshold,
    trailing: Option<Trailing>,
}

#[derive(Debug, Clone)]
struct Trailing {
    reference_price: Decimal,
    best_price: Decimal,
    stop_loss: Decimal,
    pullback: Decimal,
    /// Tick price at the last emission.
    last_emission: Option<Decimal>,
    last_trigger: Option<Decimal>,
}

impl SmartOrder {
    pub fn new(side: OrderSide, sl_threshold: Threshold, pullback_threshold: Threshold) -> Self {
        Self {
            side,
            sl_threshold,
            pullback_threshold,
            trailing: None,
        }
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn is_init(&self) -> bool {
        self.trailing.is_some()
    }

    /// Start trailing from `price`.
    ///
    /// Percentage thresholds are resolved against `price` here. Returns
    /// `false` and changes nothing if already initialized.
    pub fn init_price(&mut self, price: Decimal) -> bool {
        if self.trailing.is_some() {
            warn!(side = %self.side, %price, "smart order already initialized");
            return false;
        }

        let stop_loss = self.sl_threshold.resolve(price);
        let pullback = self.pullback_threshold.resolve(price);
        debug!(side = %self.side, %price, %stop_loss, %pullback, "smart order initialized");

        self.trailing = Some(Trailing {
            reference_price: price,
            best_price: price,
            stop_loss,
            pullback,
            last_emission: None,
            last_trigger: None,
        });
        true
    }

    /// Feed a price; returns a new trigger price when one should be placed.
    ///
    /// The first call after initialization always emits.
    pub fn price_update(&mut self, price: Decimal) -> Result<Option<Decimal>, StrategyError> {
        let side = self.side;
        let t = self.trailing.as_mut().ok_or(StrategyError::NotInitialized)?;

        if is_better(side, price, t.best_price) {
            t.best_price = price;
        }

        let candidate = match side {
            OrderSide::Buy => t.best_price - t.stop_loss,
            OrderSide::Sell => t.best_price + t.stop_loss,
        };

        let should_emit = match (t.last_emission, t.last_trigger) {
            (Some(point), Some(trigger)) => {
                (price - point).abs() >= t.pullback && candidate != trigger
            }
            _ => true,
        };

        if !should_emit {
            return Ok(None);
        }

        t.last_emission = Some(price);
        t.last_trigger = Some(candidate);
        Ok(Some(candidate))
    }

    /// Resolved stop-loss distance, once initialized.
    pub fn stop_loss_threshold_value(&self) -> Option<Decimal> {
        self.trailing.as_ref().map(|t| t.stop_loss)
    }

    /// Trigger of the most recent emission.
    pub fn last_trigger(&self) -> Option<Decimal> {
        self.trailing.as_ref().and_then(|t| t.last_trigger)
    }

    pub fn reference_price(&self) -> Option<Decimal> {
        self.trailing.as_ref().map(|t| t.reference_price)
    }

    pub fn best_price(&self) -> Option<Decimal> {
        self.trailing.as_ref().map(|t| t.best_price)
    }
}

/// `price` is more favorable than `than` for an order on `side`.
fn is_better(side: OrderSide, price: Decimal, than: Decimal) -> bool {
    match side {
        OrderSide::Buy => price < than,
        OrderSide::Sell => price > than,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn buy_order() -> SmartOrder {
        SmartOrder::new(
            OrderSide::Buy,
            Threshold::Absolute(dec!(2)),
            Threshold::Absolute(dec!(1)),
        )
    }

    #[test]
    fn test_price_update_before_init() {
        let mut order = buy_order();
        assert!(!order.is_init());
        assert!(matches!(
            order.price_update(dec!(100)),
            Err(StrategyError::NotInitialized)
        ));
    }

    #[test]
    fn test_init_only_once() {
        let mut order = buy_order();
        assert!(order.init_price(dec!(100)));
        assert!(!order.init_price(dec!(50)));
        assert_eq!(order.reference_price(), Some(dec!(100)));
        assert_eq!(order.best_price(), Some(dec!(100)));
    }

    #[test]
    fn test_buy_side_trailing() {
        let mut order = buy_order();
        order.init_price(dec!(100));

        assert_eq!(order.last_trigger(), None);
        assert_eq!(order.price_update(dec!(100)).unwrap(), Some(dec!(98)));
        assert_eq!(order.price_update(dec!(99)).unwrap(), Some(dec!(97)));
        assert_eq!(order.price_update(dec!(98.5)).unwrap(), None);
        assert_eq!(order.last_trigger(), Some(dec!(97)));
        assert_eq!(order.best_price(), Some(dec!(98.5)));
        assert_eq!(order.price_update(dec!(98)).unwrap(), Some(dec!(96)));
    }

    #[test]
    fn test_sell_side_trailing() {
        let mut order = SmartOrder::new(
            OrderSide::Sell,
            Threshold::Absolute(dec!(2)),
            Threshold::Absolute(dec!(1)),
        );
        order.init_price(dec!(100));

        assert_eq!(order.price_update(dec!(100)).unwrap(), Some(dec!(102)));
        assert_eq!(order.price_update(dec!(101)).unwrap(), Some(dec!(103)));
        assert_eq!(order.price_update(dec!(101.5)).unwrap(), None);
    }

    #[test]
    fn test_best_price_monotonic() {
        let mut order = buy_order();
        order.init_price(dec!(100));

        let prices = [dec!(99), dec!(101), dec!(97), dec!(103), dec!(96.5), dec!(99)];
        let mut previous = order.best_price().unwrap();
        for price in prices {
            if let Some(trigger) = order.price_update(price).unwrap() {
                assert_eq!(trigger, order.best_price().unwrap() - dec!(2));
            }
            let best = order.best_price().unwrap();
            assert!(best <= previous);
            previous = best;
        }
        assert_eq!(previous, dec!(96.5));
    }

    #[test]
    fn test_small_moves_emit_only_once() {
        let mut order = buy_order();
        order.init_price(dec!(100));

        let emissions = (0..10)
            .map(|i| dec!(100) - Decimal::from(i) * dec!(0.05))
            .filter_map(|price| order.price_update(price).unwrap())
            .count();

        assert_eq!(emissions, 1);
    }

    #[test]
    fn test_adverse_move_does_not_emit() {
        let mut order = buy_order();
        order.init_price(dec!(100));
        order.price_update(dec!(100)).unwrap();

        // Best price unchanged, so the trigger would be the same.
        assert_eq!(order.price_update(dec!(105)).unwrap(), None);
    }

    #[test]
    fn test_percent_thresholds() {
        let mut order = SmartOrder::new(
            OrderSide::Sell,
            Threshold::Percent(dec!(1)),
            Threshold::Percent(dec!(0.5)),
        );
        assert_eq!(order.stop_loss_threshold_value(), None);

        order.init_price(dec!(200));
        assert_eq!(order.stop_loss_threshold_value(), Some(dec!(2)));
        assert_eq!(order.price_update(dec!(200)).unwrap(), Some(dec!(202)));
        assert_eq!(order.price_update(dec!(200.5)).unwrap(), None);
        assert_eq!(order.price_update(dec!(201)).unwrap(), Some(dec!(203)));
    }
}
