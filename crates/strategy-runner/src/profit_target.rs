//! Profit-target sibling strategy.

use async_trait::async_trait;
use execution_core::{ExecutionReport, OrderSide};
use model::{PriceSpec, PriceTick, Target, TargetKind, TargetStatus};
use rust_decimal::Decimal;
use strategy_core::{StrategyContext, StrategyError, TradeState, TradingStrategy};
use tracing::{debug, info};

/// Places a limit order for each profit target once the market reaches it.
///
/// Percentage volumes are sized against the position held when the strategy
/// first runs, so later fills do not shrink the remaining targets.
#[derive(Debug)]
pub struct ProfitTargetStrategy {
    ctx: StrategyContext,
    position: Option<Decimal>,
}

impl ProfitTargetStrategy {
    pub fn new(ctx: StrategyContext) -> Self {
        Self {
            ctx,
            position: None,
        }
    }

    async fn place(
        &self,
        state: &mut TradeState,
        index: usize,
        side: OrderSide,
        price: Decimal,
        position: Decimal,
    ) -> Result<(), StrategyError> {
        let Some(target) = state.trade.targets.get(index) else {
            return Ok(());
        };

        let rules = self.ctx.rules();
        let available = state.balance.available;
        let quantity = rules.adjust_quantity(target.volume.quantity(position).min(available));
        if !rules.is_tradable_quantity(quantity) {
            debug!(index, %quantity, %available, "no quantity for profit target");
            return Ok(());
        }

        let price = rules.adjust_price(price);
        let placed = self
            .ctx
            .exchange()
            .create_limit_order(&state.trade.symbol, side, price, quantity)
            .await
            .map_err(|e| {
                self.ctx.metrics().inc_exchange_errors();
                StrategyError::from(e)
            })?;

        state.balance.lock(quantity);
        if let Some(target) = state.trade.targets.get_mut(index) {
            target.set_active(placed.order_id);
        }
        self.ctx.metrics().inc_orders_placed();
        info!(
            trade_id = %state.trade.id,
            index,
            order_id = placed.order_id,
            %price,
            %quantity,
            "profit target placed"
        );
        self.ctx.notify_target_updated(&state.trade);
        Ok(())
    }
}

/// The market at `market` has reached a target at `target` for `side`.
fn reached(side: OrderSide, market: Decimal, target: Decimal) -> bool {
    match side {
        OrderSide::Sell => market >= target,
        OrderSide::Buy => market <= target,
    }
}

#[async_trait]
impl TradingStrategy for ProfitTargetStrategy {
    fn name(&self) -> &'static str {
        "profit-target"
    }

    async fn execute(
        &mut self,
        state: &mut TradeState,
        tick: &PriceTick,
    ) -> Result<(), StrategyError> {
        let position = *self.position.get_or_insert(state.balance.total());

        for index in 0..state.trade.targets.len() {
            let target = &state.trade.targets[index];
            if !matches!(target.status, TargetStatus::New | TargetStatus::Canceled) {
                continue;
            }

            let side = target.side.unwrap_or(state.trade.side);
            let market = tick.price_for(side);
            let price = match target.price.absolute() {
                Some(price) => price,
                None => {
                    let price = target.price.resolve(market);
                    state.trade.targets[index].price = PriceSpec::Absolute(price);
                    self.ctx.notify_target_updated(&state.trade);
                    price
                }
            };

            if reached(side, market, price) {
                self.place(state, index, side, price, position).await?;
            }
        }
        Ok(())
    }

    async fn order_status_changed(
        &mut self,
        _state: &mut TradeState,
        target: &Target,
        report: &ExecutionReport,
    ) -> Result<(), StrategyError> {
        if target.kind != TargetKind::Profit {
            return Ok(());
        }
        if target.is_completed() {
            info!(
                order_id = report.order_id,
                price = %report.last_executed_price,
                "profit target filled"
            );
        } else {
            debug!(status = ?target.status, "profit target status updated");
        }
        Ok(())
    }

    fn is_completed(&self, state: &TradeState) -> bool {
        !state.trade.targets.is_empty() && state.trade.targets.iter().all(Target::is_completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use execution_core::{ExchangeCall, PaperExchange, SymbolRules};
    use model::{Balance, Trade, Volume};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn setup() -> (Arc<PaperExchange>, ProfitTargetStrategy, TradeState) {
        let exchange = Arc::new(PaperExchange::new());
        let ctx = StrategyContext::new(exchange.clone(), SymbolRules::unrestricted("BTCUSDT"));
        let trade = Trade::new("BTCUSDT", OrderSide::Sell)
            .with_target(dec!(110), Volume::Percent(dec!(50)))
            .with_target(dec!(120), Volume::Percent(dec!(50)));
        let state = TradeState::new(trade, Balance::new(dec!(2)));
        (exchange, ProfitTargetStrategy::new(ctx), state)
    }

    #[tokio::test]
    async fn test_places_reached_targets() {
        let (exchange, mut strategy, mut state) = setup();

        strategy
            .execute(&mut state, &PriceTick::flat("BTCUSDT", dec!(105)))
            .await
            .unwrap();
        assert!(exchange.calls().is_empty());

        strategy
            .execute(&mut state, &PriceTick::flat("BTCUSDT", dec!(111)))
            .await
            .unwrap();
        strategy
            .execute(&mut state, &PriceTick::flat("BTCUSDT", dec!(125)))
            .await
            .unwrap();

        assert_eq!(
            exchange.calls(),
            vec![
                ExchangeCall::Limit {
                    side: OrderSide::Sell,
                    price: dec!(110),
                    quantity: dec!(1)
                },
                ExchangeCall::Limit {
                    side: OrderSide::Sell,
                    price: dec!(120),
                    quantity: dec!(1)
                },
            ]
        );
        assert_eq!(state.balance.available, dec!(0));
        assert!(state.trade.targets.iter().all(Target::is_active));
    }

    #[tokio::test]
    async fn test_completed_when_all_filled() {
        let (_, mut strategy, mut state) = setup();
        strategy
            .execute(&mut state, &PriceTick::flat("BTCUSDT", dec!(125)))
            .await
            .unwrap();
        assert!(!strategy.is_completed(&state));

        state.trade.targets[0].set_completed();
        assert!(!strategy.is_completed(&state));
        state.trade.targets[1].set_completed();
        assert!(strategy.is_completed(&state));
    }
}
