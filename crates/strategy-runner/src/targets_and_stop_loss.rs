//! Trade orchestrator.
//!
//! [`TargetsAndStopLossStrategy`] owns one trade and drives it through
//! `New -> Active -> Completed`:
//!
//! - while `New`, ticks go to the [`EntryStrategy`] (or the trade activates
//!   at once if it has no entry);
//! - while `Active`, ticks go to the stop-loss sibling, and to the
//!   profit-target sibling only when no stop-loss order is live, so the two
//!   never commit the same quantity;
//! - whichever sibling completes first completes the trade.
//!
//! Exchange reports are matched to a leg by order ID, applied to it, and
//! forwarded to every sibling only when the leg actually changed, which
//! makes re-delivered reports harmless.

use execution_core::{ExecutionReport, OrderStatus};
use model::{Balance, PriceTick, Target, Trade, TradeStatus, Volume};
use rust_decimal::Decimal;
use strategy_core::{BoxedStrategy, StrategyContext, StrategyError, TradeState, TradingStrategy};
use tracing::{debug, info, warn};

use crate::entry::EntryStrategy;
use crate::orders::{cancel_leg_order, settle_cancel, settle_fill, LegRef};
use crate::profit_target::ProfitTargetStrategy;
use crate::stop_loss::StopLossStrategy;

/// Drives one trade's entry, stop-loss and profit targets.
pub struct TargetsAndStopLossStrategy {
    ctx: StrategyContext,
    state: TradeState,
    entry: Option<EntryStrategy>,
    stop_loss: Option<BoxedStrategy>,
    profit_target: Option<BoxedStrategy>,
    last_tick: Option<PriceTick>,
    last_logged_price: Option<Decimal>,
}

impl TargetsAndStopLossStrategy {
    /// Build the strategy tree for `trade`.
    ///
    /// Fails if the trade has nothing to execute, targets another symbol, or
    /// `balance` cannot cover it.
    pub fn new(ctx: StrategyContext, trade: Trade, balance: Balance) -> Result<Self, StrategyError> {
        if trade.symbol != ctx.rules().symbol {
            return Err(StrategyError::InvalidTrade(format!(
                "trade symbol {} does not match rules for {}",
                trade.symbol,
                ctx.rules().symbol
            )));
        }
        if trade.entry.is_none() && trade.stop_loss.is_none() && trade.targets.is_empty() {
            return Err(StrategyError::InvalidTrade(format!(
                "trade {} has no entry, stop-loss or targets",
                trade.id
            )));
        }
        validate_balance(&trade, &balance, ctx.rules().min_qty)?;

        let stop_loss = trade
            .stop_loss
            .as_ref()
            .map(|_| Box::new(StopLossStrategy::new(ctx.clone())) as BoxedStrategy);
        let profit_target = (!trade.targets.is_empty())
            .then(|| Box::new(ProfitTargetStrategy::new(ctx.clone())) as BoxedStrategy);
        let entry = match &trade.entry {
            Some(section) if !section.is_completed() => {
                Some(EntryStrategy::entry(ctx.clone(), &trade)?)
            }
            _ => None,
        };

        info!(
            trade_id = %trade.id,
            symbol = %trade.symbol,
            side = %trade.side,
            has_entry = entry.is_some(),
            has_stop_loss = stop_loss.is_some(),
            targets = trade.targets.len(),
            available = %balance.available,
            "trade strategy created"
        );

        Ok(Self {
            ctx,
            state: TradeState::new(trade, balance),
            entry,
            stop_loss,
            profit_target,
            last_tick: None,
            last_logged_price: None,
        })
    }

    /// Builder method to replace the stop-loss sibling.
    pub fn with_stop_loss_strategy(mut self, strategy: BoxedStrategy) -> Self {
        self.stop_loss = Some(strategy);
        self
    }

    /// Builder method to replace the profit-target sibling.
    pub fn with_profit_target_strategy(mut self, strategy: BoxedStrategy) -> Self {
        self.profit_target = Some(strategy);
        self
    }

    pub fn trade(&self) -> &Trade {
        &self.state.trade
    }

    pub fn balance(&self) -> &Balance {
        &self.state.balance
    }

    pub fn state(&self) -> &TradeState {
        &self.state
    }

    pub fn into_state(self) -> TradeState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state.trade.is_completed()
    }

    /// React to a price tick.
    pub async fn execute(&mut self, tick: &PriceTick) -> Result<(), StrategyError> {
        self.ctx.metrics().inc_ticks_received();

        if self.state.trade.is_completed() {
            debug!(trade_id = %self.state.trade.id, "trade complete");
            return Ok(());
        }

        if self.sibling_completed() {
            self.complete().await;
            return Ok(());
        }

        if self.ctx.config().dedup_ticks
            && self
                .last_tick
                .as_ref()
                .is_some_and(|last| last.same_prices(tick))
        {
            self.ctx.metrics().inc_ticks_skipped();
            return Ok(());
        }
        self.last_tick = Some(tick.clone());
        self.log_price(tick);

        if self.state.trade.status == TradeStatus::New {
            let entry_done = match self.entry.as_mut() {
                Some(entry) => {
                    entry.execute(&mut self.state, tick).await?;
                    entry.is_completed(&self.state)
                }
                None => true,
            };
            if entry_done {
                self.activate();
            }
        }

        if self.state.trade.status == TradeStatus::Active {
            if let Some(stop_loss) = self.stop_loss.as_mut() {
                stop_loss.execute(&mut self.state, tick).await?;
            }
            if !self.state.is_stop_loss_order_active() {
                if let Some(profit_target) = self.profit_target.as_mut() {
                    profit_target.execute(&mut self.state, tick).await?;
                }
            }
        }

        Ok(())
    }

    /// Forward a leg change to every sibling.
    ///
    /// A completed entry leg activates the trade.
    pub async fn order_status_changed(
        &mut self,
        target: &Target,
        report: &ExecutionReport,
    ) -> Result<(), StrategyError> {
        if target.is_entry_target() && target.is_completed() {
            self.activate();
        }

        if let Some(stop_loss) = self.stop_loss.as_mut() {
            stop_loss
                .order_status_changed(&mut self.state, target, report)
                .await?;
        }
        if let Some(profit_target) = self.profit_target.as_mut() {
            profit_target
                .order_status_changed(&mut self.state, target, report)
                .await?;
        }
        if let Some(entry) = self.entry.as_mut() {
            entry
                .order_status_changed(&mut self.state, target, report)
                .await?;
        }
        Ok(())
    }

    /// Apply an exchange report to the matching leg.
    ///
    /// Returns `true` if the report changed a leg. Reports for unknown orders
    /// and repeats of an already applied status are ignored.
    pub async fn on_execution_report(
        &mut self,
        report: &ExecutionReport,
    ) -> Result<bool, StrategyError> {
        if report.symbol != self.state.trade.symbol {
            return Ok(false);
        }
        let Some(target) = self.state.trade.target_by_order_id_mut(report.order_id) else {
            debug!(order_id = report.order_id, "report for unknown order");
            return Ok(false);
        };
        if !target.apply_order_status(report.order_status) {
            return Ok(false);
        }
        let snapshot = target.clone();

        match report.order_status {
            OrderStatus::Filled => {
                settle_fill(&mut self.state.balance, snapshot.kind, report.cumulative_filled_qty)
            }
            OrderStatus::Canceled | OrderStatus::Expired | OrderStatus::Rejected => settle_cancel(
                &mut self.state.balance,
                snapshot.kind,
                report.cumulative_filled_qty,
                report.remaining_qty(),
            ),
            OrderStatus::New | OrderStatus::PartiallyFilled => {}
        }

        info!(
            trade_id = %self.state.trade.id,
            order_id = report.order_id,
            kind = ?snapshot.kind,
            status = ?snapshot.status,
            "leg updated"
        );
        self.ctx.notify_target_updated(&self.state.trade);
        self.order_status_changed(&snapshot, report).await?;
        Ok(true)
    }

    fn sibling_completed(&self) -> bool {
        let done = |s: &Option<BoxedStrategy>| {
            s.as_ref()
                .is_some_and(|strategy| strategy.is_completed(&self.state))
        };
        done(&self.stop_loss) || done(&self.profit_target)
    }

    fn activate(&mut self) {
        if self.state.trade.set_active() {
            info!(trade_id = %self.state.trade.id, "trade active");
            self.ctx.notify_target_updated(&self.state.trade);
        }
    }

    /// Mark the trade completed and pull any orders still working.
    async fn complete(&mut self) {
        if !self.state.trade.set_completed() {
            return;
        }
        info!(trade_id = %self.state.trade.id, "trade completed");

        for leg in LegRef::all(&self.state.trade) {
            let active = leg.get(&self.state.trade).is_some_and(Target::is_active);
            if active && !cancel_leg_order(&self.ctx, &mut self.state, leg).await.is_clear() {
                warn!(trade_id = %self.state.trade.id, ?leg, "order left open after completion");
            }
        }
        self.ctx.notify_target_updated(&self.state.trade);
    }

    fn log_price(&mut self, tick: &PriceTick) {
        if !self.ctx.config().log_prices || self.last_logged_price == Some(tick.last) {
            return;
        }
        debug!(symbol = %tick.symbol, price = %tick.last, "price");
        self.last_logged_price = Some(tick.last);
    }
}

/// Check `balance` covers the quantity the first orders of `trade` need.
fn validate_balance(trade: &Trade, balance: &Balance, min_qty: Decimal) -> Result<(), StrategyError> {
    let fixed = |volume: Volume| volume.absolute().unwrap_or(Decimal::ZERO);

    let needed = match trade.entry.as_ref().and_then(|s| s.target()) {
        Some(entry) => fixed(entry.volume),
        None => {
            let stop = trade.stop_loss.as_ref().map_or(Decimal::ZERO, |t| fixed(t.volume));
            let targets: Decimal = trade.targets.iter().map(|t| fixed(t.volume)).sum();
            stop.max(targets)
        }
    };
    let required = needed.max(min_qty);

    if balance.available <= Decimal::ZERO || balance.available < required {
        warn!(
            trade_id = %trade.id,
            %required,
            available = %balance.available,
            "insufficient balance"
        );
        return Err(StrategyError::InsufficientBalance {
            required,
            available: balance.available,
        });
    }
    Ok(())
}
