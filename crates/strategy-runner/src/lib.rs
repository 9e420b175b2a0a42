//! Trade lifecycle strategies and their runtime.
//!
//! A trade is driven by a small tree of strategies:
//!
//! - **TargetsAndStopLossStrategy**: owns the trade and its balance, routes
//!   ticks and execution reports to the leg strategies below
//! - **EntryStrategy**: trails a stop-limit entry order behind the market
//! - **StopLossStrategy**: keeps the stop-loss order live near the stop
//! - **ProfitTargetStrategy**: takes profit as targets are reached
//! - **TradeRunner**: per-trade event loop feeding the orchestrator
//!
//! # Architecture
//!
//! ```text
//!  ticks ──────┐
//!              v
//!        ┌─────────────┐     ┌──────────────────────────┐
//!        │ TradeRunner │────>│ TargetsAndStopLoss       │
//!        └─────────────┘     │  New:    EntryStrategy   │
//!              ^             │  Active: StopLoss        │
//!  reports ────┘             │          ProfitTarget    │
//!                            └──────────────────────────┘
//!                                         │
//!                                         v
//!                               ┌───────────────────┐
//!                               │ ExchangeConnector │
//!                               └───────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use strategy_runner::{TradeRunner, TradeRunnerConfig};
//!
//! let runner = TradeRunner::new(ctx, trade, balance)?;
//! let (handle, task) = runner.spawn(&TradeRunnerConfig::default(), shutdown_rx);
//!
//! handle.send_tick(tick).await?;
//! let final_state = task.await??;
//! ```

mod entry;
mod error;
mod orders;
mod profit_target;
mod runner;
mod stop_loss;
mod targets_and_stop_loss;

pub use entry::{EntryStrategy, ExitStrategy};
pub use error::RunnerError;
pub use profit_target::ProfitTargetStrategy;
pub use runner::{TradeHandle, TradeRunner, TradeRunnerConfig};
pub use stop_loss::StopLossStrategy;
pub use targets_and_stop_loss::TargetsAndStopLossStrategy;
