//! Order plumbing shared by the leg strategies.

use execution_core::{
    ExchangeError, OrderStatusReport, PlacedOrder, StopLimitRequest, StopOrderOutcome,
};
use model::{Balance, Target, TargetKind, Trade, TradeLeg};
use rust_decimal::Decimal;
use strategy_core::{StrategyContext, StrategyError, TradeState};
use tracing::{error, info, warn};

/// Addresses one leg of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LegRef {
    /// Current target of the entry or exit section.
    Section(TradeLeg),
    StopLoss,
    Profit(usize),
}

impl LegRef {
    pub(crate) fn get(self, trade: &Trade) -> Option<&Target> {
        match self {
            Self::Section(leg) => trade.section(leg).and_then(|s| s.target()),
            Self::StopLoss => trade.stop_loss.as_ref(),
            Self::Profit(i) => trade.targets.get(i),
        }
    }

    pub(crate) fn get_mut(self, trade: &mut Trade) -> Option<&mut Target> {
        match self {
            Self::Section(leg) => trade.section_mut(leg).and_then(|s| s.target_mut()),
            Self::StopLoss => trade.stop_loss.as_mut(),
            Self::Profit(i) => trade.targets.get_mut(i),
        }
    }

    /// Every leg of `trade` that can carry an order.
    pub(crate) fn all(trade: &Trade) -> Vec<LegRef> {
        let mut legs = Vec::new();
        if trade.entry.is_some() {
            legs.push(Self::Section(TradeLeg::Entry));
        }
        if trade.exit.is_some() {
            legs.push(Self::Section(TradeLeg::Exit));
        }
        if trade.stop_loss.is_some() {
            legs.push(Self::StopLoss);
        }
        legs.extend((0..trade.targets.len()).map(Self::Profit));
        legs
    }
}

/// What happened to a leg's working order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CancelOutcome {
    /// The leg had no working order.
    NoOrder,
    /// Canceled; unfilled quantity is back in the balance.
    Canceled,
    /// The order had already filled; the leg is now completed.
    Completed,
    /// An exchange call failed or the order could not be reconciled.
    Abandoned,
}

impl CancelOutcome {
    /// The leg is free for a new order.
    pub(crate) fn is_clear(self) -> bool {
        matches!(self, Self::NoOrder | Self::Canceled)
    }
}

/// Cancel the working order of `leg`, if any, and settle the balance.
///
/// Exchange failures are logged and counted, never returned: the caller
/// gives up for this tick and tries again on the next one. An order the
/// exchange does not know is not a failure; the leg is marked canceled so it
/// can be placed again.
pub(crate) async fn cancel_leg_order(
    ctx: &StrategyContext,
    state: &mut TradeState,
    leg: LegRef,
) -> CancelOutcome {
    let Some((order_id, kind)) = leg
        .get(&state.trade)
        .filter(|t| t.is_active())
        .and_then(|t| t.order_id.map(|id| (id, t.kind)))
    else {
        return CancelOutcome::NoOrder;
    };
    let symbol = state.trade.symbol.clone();
    let exchange = ctx.exchange();

    let status = match query_status(ctx, &symbol, order_id).await {
        Ok(Some(status)) => status,
        Ok(None) => return forget_order(ctx, state, leg, order_id),
        Err(()) => return CancelOutcome::Abandoned,
    };

    let canceled = match exchange.cancel_order(&symbol, order_id).await {
        Ok(canceled) => canceled,
        Err(ExchangeError::OrderNotFound) => false,
        Err(e) => {
            ctx.metrics().inc_exchange_errors();
            warn!(%symbol, order_id, error = %e, "cancel failed");
            return CancelOutcome::Abandoned;
        }
    };

    if canceled {
        settle_cancel(&mut state.balance, kind, status.executed_qty, status.unfilled_qty());
        if let Some(target) = leg.get_mut(&mut state.trade) {
            target.set_canceled();
        }
        ctx.metrics().inc_orders_canceled();
        info!(
            %symbol,
            order_id,
            released = %status.unfilled_qty(),
            "order canceled"
        );
        ctx.notify_target_updated(&state.trade);
        return CancelOutcome::Canceled;
    }

    // Not cancelable any more: take the exchange's word for where it ended up.
    let status = match query_status(ctx, &symbol, order_id).await {
        Ok(Some(status)) => status,
        Ok(None) => return forget_order(ctx, state, leg, order_id),
        Err(()) => return CancelOutcome::Abandoned,
    };

    let Some(target) = leg.get_mut(&mut state.trade) else {
        return CancelOutcome::Abandoned;
    };
    if !target.apply_order_status(status.status) {
        warn!(%symbol, order_id, status = ?status.status, "order neither cancelable nor done");
        return CancelOutcome::Abandoned;
    }

    let outcome = if target.is_completed() {
        settle_fill(&mut state.balance, kind, status.executed_qty);
        CancelOutcome::Completed
    } else {
        settle_cancel(&mut state.balance, kind, status.executed_qty, status.unfilled_qty());
        CancelOutcome::Canceled
    };
    info!(%symbol, order_id, status = ?status.status, "order reconciled instead of canceled");
    ctx.notify_target_updated(&state.trade);
    outcome
}

/// Status of `order_id`, or `None` if the exchange does not know it.
async fn query_status(
    ctx: &StrategyContext,
    symbol: &str,
    order_id: u64,
) -> Result<Option<OrderStatusReport>, ()> {
    match ctx.exchange().order_status(symbol, order_id).await {
        Ok(status) => Ok(Some(status)),
        Err(ExchangeError::OrderNotFound) => Ok(None),
        Err(e) => {
            ctx.metrics().inc_exchange_errors();
            warn!(%symbol, order_id, error = %e, "order status query failed");
            Err(())
        }
    }
}

fn forget_order(
    ctx: &StrategyContext,
    state: &mut TradeState,
    leg: LegRef,
    order_id: u64,
) -> CancelOutcome {
    if let Some(target) = leg.get_mut(&mut state.trade) {
        target.set_canceled();
    }
    warn!(symbol = %state.trade.symbol, order_id, ?leg, "order unknown to exchange, leg reset");
    ctx.notify_target_updated(&state.trade);
    CancelOutcome::Canceled
}

/// Book a completed fill on a leg of `kind`.
///
/// An entry fill opens the position, so the quantity becomes available to
/// the closing legs; every other fill leaves the trade.
pub(crate) fn settle_fill(balance: &mut Balance, kind: TargetKind, filled: Decimal) {
    if kind == TargetKind::Entry {
        balance.open_position(filled);
    } else {
        balance.settle(filled);
    }
}

/// Book an order that ended without completing its leg.
pub(crate) fn settle_cancel(
    balance: &mut Balance,
    kind: TargetKind,
    executed: Decimal,
    unfilled: Decimal,
) {
    if kind == TargetKind::Entry {
        balance.acquire(executed);
    } else {
        balance.settle(executed);
    }
    balance.release(unfilled);
}

/// Submit a stop-limit order, falling back to a market order when the stop
/// would trigger immediately.
pub(crate) async fn place_stop_or_market(
    ctx: &StrategyContext,
    request: &StopLimitRequest,
) -> Result<PlacedOrder, StrategyError> {
    match ctx.exchange().create_stop_limit_order(request).await {
        StopOrderOutcome::Placed(order) => Ok(order),
        StopOrderOutcome::WouldTriggerImmediately => {
            warn!(
                symbol = %request.symbol,
                side = %request.side,
                stop_price = %request.stop_price,
                quantity = %request.quantity,
                "stop would trigger immediately, sending market order"
            );
            ctx.metrics().inc_market_fallbacks();
            ctx.exchange()
                .create_market_order(&request.symbol, request.side, request.quantity)
                .await
                .map_err(|e| {
                    ctx.metrics().inc_exchange_errors();
                    error!(symbol = %request.symbol, error = %e, "market fallback failed");
                    StrategyError::from(e)
                })
        }
        StopOrderOutcome::Failed(e) => {
            ctx.metrics().inc_exchange_errors();
            error!(
                symbol = %request.symbol,
                stop_price = %request.stop_price,
                error = %e,
                "stop order rejected"
            );
            Err(e.into())
        }
    }
}
