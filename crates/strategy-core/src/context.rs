//! Collaborators shared by every strategy of one trade.

use std::fmt;
use std::sync::Arc;

use execution_core::{SharedExchange, SymbolRules};
use metrics::{create_metrics, SharedMetrics};
use model::Trade;

use crate::config::StrategyConfig;

/// Callback invoked whenever a leg's price, status or order ID changes.
pub type TargetListener = Arc<dyn Fn(&Trade) + Send + Sync>;

/// Exchange, rules, metrics, configuration and notification hook for one
/// trade's strategy tree.
///
/// Cloning is cheap; each strategy keeps its own handle.
#[derive(Clone)]
pub struct StrategyContext {
    exchange: SharedExchange,
    rules: Arc<SymbolRules>,
    metrics: SharedMetrics,
    config: StrategyConfig,
    listener: Option<TargetListener>,
}

impl StrategyContext {
    /// Create a context with default configuration and fresh metrics.
    pub fn new(exchange: SharedExchange, rules: SymbolRules) -> Self {
        Self {
            exchange,
            rules: Arc::new(rules),
            metrics: create_metrics(),
            config: StrategyConfig::default(),
            listener: None,
        }
    }

    /// Builder method to set the configuration.
    pub fn with_config(mut self, config: StrategyConfig) -> Self {
        self.config = config;
        self
    }

    /// Builder method to share an existing metrics handle.
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Builder method to install the target-updated hook.
    pub fn with_listener(mut self, listener: impl Fn(&Trade) + Send + Sync + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn exchange(&self) -> &SharedExchange {
        &self.exchange
    }

    pub fn rules(&self) -> &SymbolRules {
        &self.rules
    }

    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Tell the listener, if any, that the trade changed.
    pub fn notify_target_updated(&self, trade: &Trade) {
        if let Some(listener) = &self.listener {
            listener(trade);
        }
    }
}

impl fmt::Debug for StrategyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyContext")
            .field("rules", &self.rules)
            .field("config", &self.config)
            .field("has_listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}
