//! Price ticks from the feed.

use execution_core::OrderSide;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-of-book price update for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub symbol: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub timestamp_ms: i64,
}

impl PriceTick {
    pub fn new(symbol: impl Into<String>, bid: Decimal, ask: Decimal, last: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            bid,
            ask,
            last,
            timestamp_ms: 0,
        }
    }

    /// A tick where bid, ask and last are the same price.
    pub fn flat(symbol: impl Into<String>, price: Decimal) -> Self {
        Self::new(symbol, price, price, price)
    }

    /// Price an order on `side` would trade at: ask for buys, bid for sells.
    ///
    /// Falls back to the last trade price when the book side is empty.
    pub fn price_for(&self, side: OrderSide) -> Decimal {
        let quote = match side {
            OrderSide::Buy => self.ask,
            OrderSide::Sell => self.bid,
        };
        if quote > Decimal::ZERO {
            quote
        } else {
            self.last
        }
    }

    /// Whether two ticks carry identical prices, ignoring time.
    pub fn same_prices(&self, other: &PriceTick) -> bool {
        self.bid == other.bid && self.ask == other.ask && self.last == other.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_for_side() {
        let tick = PriceTick::new("BTCUSDT", dec!(99), dec!(101), dec!(100));
        assert_eq!(tick.price_for(OrderSide::Buy), dec!(101));
        assert_eq!(tick.price_for(OrderSide::Sell), dec!(99));

        let no_book = PriceTick::new("BTCUSDT", dec!(0), dec!(0), dec!(100));
        assert_eq!(no_book.price_for(OrderSide::Buy), dec!(100));
    }

    #[test]
    fn test_same_prices_ignores_time() {
        let mut a = PriceTick::flat("BTCUSDT", dec!(100));
        let b = PriceTick::flat("BTCUSDT", dec!(100));
        a.timestamp_ms = 5;
        assert!(a.same_prices(&b));
        assert!(!a.same_prices(&PriceTick::flat("BTCUSDT", dec!(100.5))));
    }
}
