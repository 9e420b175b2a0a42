//! Trade runner - per-trade event loop.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use execution_core::ExecutionReport;
use model::{Balance, PriceTick, Trade};
use strategy_core::{StrategyContext, TradeState};

use crate::error::RunnerError;
use crate::targets_and_stop_loss::TargetsAndStopLossStrategy;

/// Configuration for the trade runner.
#[derive(Debug, Clone)]
pub struct TradeRunnerConfig {
    /// Capacity of the tick and report channels.
    pub channel_capacity: usize,
}

impl Default for TradeRunnerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Sending side of a spawned runner.
#[derive(Debug, Clone)]
pub struct TradeHandle {
    ticks: mpsc::Sender<PriceTick>,
    reports: mpsc::Sender<ExecutionReport>,
}

impl TradeHandle {
    pub async fn send_tick(&self, tick: PriceTick) -> Result<(), RunnerError> {
        self.ticks
            .send(tick)
            .await
            .map_err(|_| RunnerError::ChannelClosed)
    }

    pub async fn send_report(&self, report: ExecutionReport) -> Result<(), RunnerError> {
        self.reports
            .send(report)
            .await
            .map_err(|_| RunnerError::ChannelClosed)
    }
}

/// Runs one trade's strategy tree.
///
/// Ticks and execution reports are handled strictly one at a time, so the
/// strategies never see concurrent calls for the same trade. Reports are
/// drained before ticks.
pub struct TradeRunner {
    strategy: TargetsAndStopLossStrategy,
}

impl TradeRunner {
    /// Create a runner for `trade`.
    pub fn new(ctx: StrategyContext, trade: Trade, balance: Balance) -> Result<Self, RunnerError> {
        let strategy = TargetsAndStopLossStrategy::new(ctx, trade, balance)?;
        Ok(Self { strategy })
    }

    /// Wrap an already built strategy.
    pub fn from_strategy(strategy: TargetsAndStopLossStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &TargetsAndStopLossStrategy {
        &self.strategy
    }

    /// Run on a new task with fresh channels.
    pub fn spawn(
        self,
        config: &TradeRunnerConfig,
        shutdown_rx: watch::Receiver<bool>,
    ) -> (TradeHandle, JoinHandle<Result<TradeState, RunnerError>>) {
        let (tick_tx, tick_rx) = mpsc::channel(config.channel_capacity);
        let (report_tx, report_rx) = mpsc::channel(config.channel_capacity);

        let task = tokio::spawn(self.run(tick_rx, report_rx, shutdown_rx));
        let handle = TradeHandle {
            ticks: tick_tx,
            reports: report_tx,
        };
        (handle, task)
    }

    /// Run the trade loop.
    ///
    /// Returns the final trade state once the trade completes, shutdown is
    /// signaled, or both input channels close.
    pub async fn run(
        mut self,
        mut tick_rx: mpsc::Receiver<PriceTick>,
        mut report_rx: mpsc::Receiver<ExecutionReport>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<TradeState, RunnerError> {
        let trade_id = self.strategy.trade().id.clone();
        info!(trade_id = %trade_id, symbol = %self.strategy.trade().symbol, "starting trade runner");

        loop {
            if self.strategy.is_completed() {
                info!(trade_id = %trade_id, "trade completed");
                break;
            }

            tokio::select! {
                biased;

                // Shutdown signal (highest priority)
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!(trade_id = %trade_id, "shutdown signal received");
                        break;
                    }
                }

                // Execution reports (higher priority than ticks)
                Some(report) = report_rx.recv() => {
                    self.handle_report(report).await;
                }

                Some(tick) = tick_rx.recv() => {
                    self.handle_tick(tick).await;
                }

                // All channels closed
                else => {
                    warn!(trade_id = %trade_id, "all channels closed");
                    break;
                }
            }
        }

        info!(trade_id = %trade_id, status = ?self.strategy.trade().status, "trade runner stopped");
        Ok(self.strategy.into_state())
    }

    async fn handle_tick(&mut self, tick: PriceTick) {
        if tick.symbol != self.strategy.trade().symbol {
            debug!(symbol = %tick.symbol, "tick for other symbol");
            return;
        }
        if let Err(e) = self.strategy.execute(&tick).await {
            error!(
                trade_id = %self.strategy.trade().id,
                price = %tick.last,
                error = %e,
                "tick processing failed"
            );
        }
    }

    async fn handle_report(&mut self, report: ExecutionReport) {
        match self.strategy.on_execution_report(&report).await {
            Ok(true) => {}
            Ok(false) => debug!(order_id = report.order_id, status = ?report.order_status, "report ignored"),
            Err(e) => error!(
                trade_id = %self.strategy.trade().id,
                order_id = report.order_id,
                error = %e,
                "report processing failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use execution_core::{ExchangeCall, OrderSide, PaperExchange, SymbolRules};
    use model::{PriceSpec, Target, TargetKind, TradeSection, TradeStatus, Threshold, Volume};
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn context(exchange: &Arc<PaperExchange>) -> StrategyContext {
        StrategyContext::new(exchange.clone(), SymbolRules::new("BTCUSDT", dec!(0.01), dec!(0.001)))
    }

    fn trade() -> Trade {
        Trade::new("BTCUSDT", OrderSide::Sell)
            .with_entry(TradeSection::new(
                Target::new(TargetKind::Entry, PriceSpec::Market, Volume::default()),
                Threshold::Absolute(dec!(2)),
                Threshold::Absolute(dec!(1)),
            ))
            .with_stop_loss(dec!(90), Volume::default())
            .with_target(dec!(110), Volume::default())
    }

    #[tokio::test]
    async fn test_runner_shutdown() {
        let exchange = Arc::new(PaperExchange::new());
        let runner = TradeRunner::new(context(&exchange), trade(), Balance::new(dec!(1))).unwrap();

        let (tick_tx, tick_rx) = mpsc::channel(10);
        let (report_tx, report_rx) = mpsc::channel(10);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Immediately signal shutdown
        shutdown_tx.send(true).unwrap();

        // Drop senders to close channels
        drop(tick_tx);
        drop(report_tx);

        let state = runner.run(tick_rx, report_rx, shutdown_rx).await.unwrap();
        assert_eq!(state.trade.status, TradeStatus::New);
    }

    #[test]
    fn test_insufficient_balance() {
        let exchange = Arc::new(PaperExchange::new());
        let result = TradeRunner::new(context(&exchange), trade(), Balance::default());
        assert!(matches!(result, Err(RunnerError::Strategy(_))));
    }

    #[tokio::test]
    async fn test_full_trade_lifecycle() {
        common::init_logging();
        let exchange = Arc::new(PaperExchange::new());
        let updates = Arc::new(Mutex::new(Vec::new()));
        let seen = updates.clone();
        let ctx = context(&exchange).with_listener(move |trade: &Trade| {
            seen.lock().push(trade.status);
        });

        let runner = TradeRunner::new(ctx.clone(), trade(), Balance::new(dec!(1))).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (handle, task) = runner.spawn(&TradeRunnerConfig::default(), shutdown_rx);

        // Entry stop placed, then filled.
        handle.send_tick(PriceTick::flat("BTCUSDT", dec!(100))).await.unwrap();
        tokio::task::yield_now().await;
        let entry_id = loop {
            if let Some(order) = exchange.open_orders().first() {
                break order.order_id;
            }
            tokio::task::yield_now().await;
        };
        let report = exchange.fill(entry_id, dec!(1), dec!(98)).unwrap();
        handle.send_report(report).await.unwrap();

        // Target reached, then filled.
        handle.send_tick(PriceTick::flat("BTCUSDT", dec!(111))).await.unwrap();
        let target_id = loop {
            if let Some(order) = exchange.open_orders().first() {
                break order.order_id;
            }
            tokio::task::yield_now().await;
        };
        let report = exchange.fill(target_id, dec!(1), dec!(110)).unwrap();
        handle.send_report(report).await.unwrap();

        // Next tick observes the completed target and finishes the trade.
        handle.send_tick(PriceTick::flat("BTCUSDT", dec!(112))).await.unwrap();

        let state = task.await.unwrap().unwrap();
        drop(shutdown_tx);

        assert_eq!(state.trade.status, TradeStatus::Completed);
        assert!(state.trade.targets[0].is_completed());
        assert_eq!(state.balance.locked, dec!(0));
        assert!(exchange.calls().contains(&ExchangeCall::Limit {
            side: OrderSide::Sell,
            price: dec!(110),
            quantity: dec!(1)
        }));
        assert_eq!(updates.lock().last(), Some(&TradeStatus::Completed));
        assert_eq!(ctx.metrics().orders_placed(), 2);
    }
}
