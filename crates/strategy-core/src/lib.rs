//! Core strategy types and traits.
//!
//! This crate provides the building blocks the trade strategies are made of:
//!
//! - **Strategy trait**: `TradingStrategy`, implemented by every strategy working a trade
//! - **State**: `TradeState`, the trade and balance lent to one strategy at a time
//! - **Context**: `StrategyContext` bundling the exchange, symbol rules, metrics and config
//! - **Smart order**: `SmartOrder`, the trailing stop trigger
//!
//! # Example Strategy
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use model::PriceTick;
//! use strategy_core::{StrategyError, TradeState, TradingStrategy};
//!
//! struct LogOnly;
//!
//! #[async_trait]
//! impl TradingStrategy for LogOnly {
//!     fn name(&self) -> &'static str {
//!         "log-only"
//!     }
//!
//!     async fn execute(
//!         &mut self,
//!         state: &mut TradeState,
//!         tick: &PriceTick,
//!     ) -> Result<(), StrategyError> {
//!         tracing::info!(trade_id = %state.trade.id, last = %tick.last, "tick");
//!         Ok(())
//!     }
//!
//!     fn is_completed(&self, state: &TradeState) -> bool {
//!         state.trade.is_completed()
//!     }
//! }
//! ```

mod config;
mod context;
mod error;
mod smart_order;
mod state;
mod strategy;

pub use config::StrategyConfig;
pub use context::{StrategyContext, TargetListener};
pub use error::StrategyError;
pub use smart_order::SmartOrder;
pub use state::TradeState;
pub use strategy::{BoxedStrategy, TradingStrategy};

// Re-export commonly used types from dependencies for convenience
pub use execution_core::{ExecutionReport, OrderSide, OrderStatus};
pub use model::{PriceTick, Target, Trade};
