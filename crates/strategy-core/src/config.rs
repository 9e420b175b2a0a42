//! Strategy configuration.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Behaviour switches shared by all strategies of one trade.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    /// Drop ticks whose prices equal the previous tick.
    pub dedup_ticks: bool,
    /// Distance from the stop price, in percent, inside which a live
    /// stop-loss order is kept on the exchange.
    pub stop_loss_zone: Decimal,
    /// Log every distinct tick price at debug level.
    pub log_prices: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            dedup_ticks: true,
            stop_loss_zone: Decimal::ONE,
            log_prices: false,
        }
    }
}

impl StrategyConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to toggle tick deduplication.
    pub fn with_dedup_ticks(mut self, enabled: bool) -> Self {
        self.dedup_ticks = enabled;
        self
    }

    /// Builder method to set the stop-loss zone in percent.
    pub fn with_stop_loss_zone(mut self, pct: Decimal) -> Self {
        self.stop_loss_zone = pct.abs();
        self
    }

    /// Builder method to toggle price logging.
    pub fn with_log_prices(mut self, enabled: bool) -> Self {
        self.log_prices = enabled;
        self
    }

    /// Load from `STRATEGY_*` environment variables.
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            dedup_ticks: parse_var(&lookup, "STRATEGY_DEDUP_TICKS")
                .unwrap_or(defaults.dedup_ticks),
            stop_loss_zone: parse_var::<Decimal>(&lookup, "STRATEGY_STOP_LOSS_ZONE")
                .map(|pct| pct.abs())
                .unwrap_or(defaults.stop_loss_zone),
            log_prices: parse_var(&lookup, "STRATEGY_LOG_PRICES").unwrap_or(defaults.log_prices),
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring invalid config value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StrategyConfig::default();
        assert!(config.dedup_ticks);
        assert_eq!(config.stop_loss_zone, dec!(1));
        assert!(!config.log_prices);
    }

    #[test]
    fn test_builder() {
        let config = StrategyConfig::new()
            .with_dedup_ticks(false)
            .with_stop_loss_zone(dec!(-2.5))
            .with_log_prices(true);

        assert!(!config.dedup_ticks);
        assert_eq!(config.stop_loss_zone, dec!(2.5));
        assert!(config.log_prices);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("STRATEGY_DEDUP_TICKS", "false"),
            ("STRATEGY_STOP_LOSS_ZONE", "0.5"),
            ("STRATEGY_LOG_PRICES", "yes"),
        ]
        .into_iter()
        .collect();

        let config = StrategyConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert!(!config.dedup_ticks);
        assert_eq!(config.stop_loss_zone, dec!(0.5));
        // "yes" is not a bool; default kept
        assert!(!config.log_prices);
    }

    #[test]
    fn test_from_lookup_empty() {
        let config = StrategyConfig::from_lookup(|_| None);
        assert_eq!(config, StrategyConfig::default());
    }
}
