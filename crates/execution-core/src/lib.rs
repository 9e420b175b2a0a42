//! Core execution types and the exchange capability.
//!
//! This crate provides the fundamental types for order execution:
//!
//! - **Order types**: `OrderSide`, `OrderType`, `OrderStatus`
//! - **Execution reports**: `ExecutionReport` pushed by the exchange, `OrderStatusReport` from queries
//! - **Connector**: the `ExchangeConnector` trait the strategies drive
//! - **Rules**: `SymbolRules` rounding prices and quantities to exchange increments
//! - **Paper exchange**: `PaperExchange`, an in-memory connector for dry runs and tests
//!
//! # Stop order placement
//!
//! `create_stop_limit_order` returns a `StopOrderOutcome` instead of a plain
//! `Result`: the "would trigger immediately" rejection is a normal outcome
//! that strategies answer with a market order.

mod connector;
mod error;
mod execution;
mod order;
mod paper;
mod rules;

pub use connector::{
    ExchangeConnector, PlacedOrder, SharedExchange, StopLimitRequest, StopOrderOutcome,
};
pub use error::ExchangeError;
pub use execution::{ExecutionReport, OrderStatusReport};
pub use order::{OrderSide, OrderStatus, OrderType};
pub use paper::{ExchangeCall, PaperExchange, PaperOrder};
pub use rules::SymbolRules;
