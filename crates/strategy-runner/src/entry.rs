//! Trailing stop entry and exit.

use async_trait::async_trait;
use execution_core::{ExecutionReport, OrderSide, StopLimitRequest};
use model::{PriceSpec, PriceTick, Target, Trade, TradeLeg};
use rust_decimal::Decimal;
use strategy_core::{SmartOrder, StrategyContext, StrategyError, TradeState, TradingStrategy};
use tracing::{debug, info};

use crate::orders::{cancel_leg_order, place_stop_or_market, LegRef};

/// Works the current target of one trade section by trailing a stop-limit
/// order behind the market.
///
/// Each time the [`SmartOrder`] proposes a better trigger the working order
/// is canceled and replaced. The section and its default side come from the
/// [`TradeLeg`] the strategy was built for.
#[derive(Debug)]
pub struct EntryStrategy {
    ctx: StrategyContext,
    leg: TradeLeg,
    smart_order: SmartOrder,
    /// Last trigger an order was placed at.
    last_smart_price: Option<Decimal>,
}

/// Same strategy working the exit section.
pub type ExitStrategy = EntryStrategy;

impl EntryStrategy {
    /// Work the trade's entry section.
    pub fn entry(ctx: StrategyContext, trade: &Trade) -> Result<Self, StrategyError> {
        Self::for_leg(ctx, trade, TradeLeg::Entry)
    }

    /// Work the trade's exit section.
    pub fn exit(ctx: StrategyContext, trade: &Trade) -> Result<ExitStrategy, StrategyError> {
        Self::for_leg(ctx, trade, TradeLeg::Exit)
    }

    pub fn for_leg(
        ctx: StrategyContext,
        trade: &Trade,
        leg: TradeLeg,
    ) -> Result<Self, StrategyError> {
        let section = trade.section(leg).ok_or_else(|| {
            StrategyError::InvalidTrade(format!("trade {} has no {:?} section", trade.id, leg))
        })?;
        if section.targets.is_empty() {
            return Err(StrategyError::InvalidTrade(format!(
                "trade {} has an empty {:?} section",
                trade.id, leg
            )));
        }

        let smart_order = SmartOrder::new(
            trade.section_side(leg),
            section.sl_threshold,
            section.pullback_threshold,
        );

        Ok(Self {
            ctx,
            leg,
            smart_order,
            last_smart_price: section.best_price,
        })
    }

    pub fn leg(&self) -> TradeLeg {
        self.leg
    }

    pub fn smart_order(&self) -> &SmartOrder {
        &self.smart_order
    }

    /// Whether `trigger` may replace the working order.
    ///
    /// With no order working any positive trigger goes; otherwise it must
    /// beat the last trigger acted on.
    fn improves(&self, side: OrderSide, trigger: Decimal, working: bool) -> bool {
        if trigger <= Decimal::ZERO {
            return false;
        }
        match self.last_smart_price {
            Some(last) if working => match side {
                OrderSide::Buy => trigger < last,
                OrderSide::Sell => trigger > last,
            },
            _ => true,
        }
    }

    async fn on_trailing_update(
        &mut self,
        state: &mut TradeState,
        trigger: Decimal,
        working: bool,
    ) -> Result<(), StrategyError> {
        let side = state.trade.section_side(self.leg);
        if !self.improves(side, trigger, working) {
            debug!(leg = ?self.leg, %trigger, last = ?self.last_smart_price, "trigger not better");
            return Ok(());
        }

        info!(
            trade_id = %state.trade.id,
            leg = ?self.leg,
            %side,
            %trigger,
            "moving trailing stop"
        );

        let leg = LegRef::Section(self.leg);
        if !cancel_leg_order(&self.ctx, state, leg).await.is_clear() {
            return Ok(());
        }

        let threshold = self
            .smart_order
            .stop_loss_threshold_value()
            .ok_or(StrategyError::NotInitialized)?;
        let Some(target) = leg.get(&state.trade) else {
            return Ok(());
        };
        let nominal = target.price.absolute().unwrap_or(trigger);

        // Keep the limit on the far side of the stop so it cannot fill early.
        let limit = match side {
            OrderSide::Buy => (trigger + threshold).max(nominal + threshold),
            OrderSide::Sell => (trigger - threshold).min(nominal - threshold),
        };

        let rules = self.ctx.rules();
        let available = state.balance.available;
        let quantity = rules.adjust_quantity(target.volume.quantity(available).min(available));
        if !rules.is_tradable_quantity(quantity) {
            debug!(leg = ?self.leg, %quantity, %available, "nothing to place");
            return Ok(());
        }

        let request = StopLimitRequest {
            symbol: state.trade.symbol.clone(),
            side,
            stop_price: rules.adjust_price(trigger),
            limit_price: rules.adjust_price(limit),
            quantity,
        };
        let placed = place_stop_or_market(&self.ctx, &request).await?;

        state.balance.lock(quantity);
        if let Some(section) = state.trade.section_mut(self.leg) {
            section.best_price = Some(trigger);
            if let Some(target) = section.target_mut() {
                target.set_active(placed.order_id);
            }
        }
        self.last_smart_price = Some(trigger);
        self.ctx.metrics().inc_orders_placed();

        info!(
            trade_id = %state.trade.id,
            order_id = placed.order_id,
            stop_price = %request.stop_price,
            limit_price = %request.limit_price,
            %quantity,
            "trailing order placed"
        );
        self.ctx.notify_target_updated(&state.trade);
        Ok(())
    }
}

#[async_trait]
impl TradingStrategy for EntryStrategy {
    fn name(&self) -> &'static str {
        match self.leg {
            TradeLeg::Entry => "entry",
            TradeLeg::Exit => "exit",
        }
    }

    async fn execute(
        &mut self,
        state: &mut TradeState,
        tick: &PriceTick,
    ) -> Result<(), StrategyError> {
        if self.is_completed(state) {
            return Ok(());
        }

        let leg = LegRef::Section(self.leg);
        let Some(target) = leg.get(&state.trade) else {
            return Ok(());
        };
        if target.is_completed() {
            debug!(leg = ?self.leg, "all orders completed");
            return Ok(());
        }

        let working = target.is_active();
        let price = tick.price_for(state.trade.section_side(self.leg));

        if !self.smart_order.is_init() {
            let nominal = self.ctx.rules().adjust_price(target.price.resolve(price));
            self.smart_order.init_price(nominal);
            if let Some(target) = leg.get_mut(&mut state.trade) {
                target.price = PriceSpec::Absolute(nominal);
            }
            self.ctx.notify_target_updated(&state.trade);
        }

        let trigger = match self.smart_order.price_update(price)? {
            Some(trigger) => Some(trigger),
            // The leg lost its order without filling: place it again.
            None if !working => self.smart_order.last_trigger(),
            None => None,
        };
        if let Some(trigger) = trigger {
            self.on_trailing_update(state, trigger, working).await?;
        }
        Ok(())
    }

    async fn order_status_changed(
        &mut self,
        _state: &mut TradeState,
        target: &Target,
        report: &ExecutionReport,
    ) -> Result<(), StrategyError> {
        if target.kind != self.leg.target_kind() {
            return Ok(());
        }

        if target.is_completed() {
            info!(leg = ?self.leg, order_id = report.order_id, "target completed");
        } else {
            info!(leg = ?self.leg, status = ?target.status, "order status updated");
        }
        Ok(())
    }

    fn is_completed(&self, state: &TradeState) -> bool {
        state
            .trade
            .section(self.leg)
            .map_or(true, |section| section.is_completed())
    }
}
