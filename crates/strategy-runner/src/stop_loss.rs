//! Stop-loss sibling strategy.

use async_trait::async_trait;
use execution_core::{ExecutionReport, OrderSide, StopLimitRequest};
use model::{PriceSpec, PriceTick, Target, TargetKind};
use rust_decimal::Decimal;
use strategy_core::{StrategyContext, StrategyError, TradeState, TradingStrategy};
use tracing::{debug, info, warn};

use crate::orders::{cancel_leg_order, place_stop_or_market, LegRef};

/// Keeps a stop-limit order on the stop-loss leg while the market is close
/// to the stop, and pulls it when the market moves away.
///
/// Leaving the order off the book while the price is far from the stop
/// frees the quantity for profit targets; entering the zone pulls any working
/// profit-target orders so the stop covers the whole position.
#[derive(Debug)]
pub struct StopLossStrategy {
    ctx: StrategyContext,
}

impl StopLossStrategy {
    pub fn new(ctx: StrategyContext) -> Self {
        Self { ctx }
    }

    /// Whether the stop-loss order is working on the exchange.
    pub fn is_stop_loss_order_active(&self, state: &TradeState) -> bool {
        state.is_stop_loss_order_active()
    }

    /// `price` is inside the zone around `stop`, or already through it.
    fn in_zone(&self, side: OrderSide, price: Decimal, stop: Decimal) -> bool {
        let crossed = match side {
            OrderSide::Sell => price <= stop,
            OrderSide::Buy => price >= stop,
        };
        let distance_pct = (price - stop).abs() / stop * Decimal::ONE_HUNDRED;
        crossed || distance_pct <= self.ctx.config().stop_loss_zone
    }

    /// Pull working profit-target orders so their quantity can back the stop.
    ///
    /// Returns `false` if any of them could not be cleared this tick.
    async fn reclaim_profit_orders(&self, state: &mut TradeState) -> bool {
        for index in 0..state.trade.targets.len() {
            if !state.trade.targets[index].is_active() {
                continue;
            }
            let outcome = cancel_leg_order(&self.ctx, state, LegRef::Profit(index)).await;
            if !outcome.is_clear() {
                debug!(index, ?outcome, "profit target not cleared for stop-loss");
                return false;
            }
        }
        true
    }

    async fn place(
        &self,
        state: &mut TradeState,
        side: OrderSide,
        stop: Decimal,
    ) -> Result<(), StrategyError> {
        let Some(target) = state.trade.stop_loss.as_ref() else {
            return Ok(());
        };

        let rules = self.ctx.rules();
        let available = state.balance.available;
        let quantity = rules.adjust_quantity(target.volume.quantity(available).min(available));
        if !rules.is_tradable_quantity(quantity) {
            debug!(%quantity, %available, "no quantity for stop-loss");
            return Ok(());
        }

        let offset = stop * self.ctx.config().stop_loss_zone / Decimal::ONE_HUNDRED;
        let limit = match side {
            OrderSide::Sell => stop - offset,
            OrderSide::Buy => stop + offset,
        };

        let request = StopLimitRequest {
            symbol: state.trade.symbol.clone(),
            side,
            stop_price: rules.adjust_price(stop),
            limit_price: rules.adjust_price(limit),
            quantity,
        };
        let placed = place_stop_or_market(&self.ctx, &request).await?;

        state.balance.lock(quantity);
        if let Some(target) = state.trade.stop_loss.as_mut() {
            target.set_active(placed.order_id);
        }
        self.ctx.metrics().inc_orders_placed();
        info!(
            trade_id = %state.trade.id,
            order_id = placed.order_id,
            stop_price = %request.stop_price,
            %quantity,
            "stop-loss placed"
        );
        self.ctx.notify_target_updated(&state.trade);
        Ok(())
    }
}

#[async_trait]
impl TradingStrategy for StopLossStrategy {
    fn name(&self) -> &'static str {
        "stop-loss"
    }

    async fn execute(
        &mut self,
        state: &mut TradeState,
        tick: &PriceTick,
    ) -> Result<(), StrategyError> {
        let Some(target) = state.trade.stop_loss.as_ref() else {
            return Ok(());
        };
        if target.is_completed() {
            return Ok(());
        }

        let side = target.side.unwrap_or(state.trade.side);
        let price = tick.price_for(side);

        let stop = match target.price.absolute() {
            Some(stop) => stop,
            None => {
                let stop = self.ctx.rules().adjust_price(target.price.resolve(price));
                if let Some(target) = state.trade.stop_loss.as_mut() {
                    target.price = PriceSpec::Absolute(stop);
                }
                self.ctx.notify_target_updated(&state.trade);
                stop
            }
        };
        if stop <= Decimal::ZERO {
            warn!(trade_id = %state.trade.id, %stop, "invalid stop price");
            return Ok(());
        }

        let active = state.is_stop_loss_order_active();
        match (self.in_zone(side, price, stop), active) {
            (true, false) => {
                if !self.reclaim_profit_orders(state).await {
                    return Ok(());
                }
                self.place(state, side, stop).await
            }
            (false, true) => {
                debug!(%price, %stop, "price left stop-loss zone");
                cancel_leg_order(&self.ctx, state, LegRef::StopLoss).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn order_status_changed(
        &mut self,
        _state: &mut TradeState,
        target: &Target,
        _report: &ExecutionReport,
    ) -> Result<(), StrategyError> {
        if target.kind != TargetKind::StopLoss {
            return Ok(());
        }
        if target.is_completed() {
            warn!(order_id = ?target.order_id, "stop-loss filled");
        } else {
            debug!(status = ?target.status, "stop-loss status updated");
        }
        Ok(())
    }

    fn is_completed(&self, state: &TradeState) -> bool {
        state
            .trade
            .stop_loss
            .as_ref()
            .is_some_and(Target::is_completed)
    }
}
