//! In-memory exchange for dry runs and tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::connector::{ExchangeConnector, PlacedOrder, StopLimitRequest, StopOrderOutcome};
use crate::error::ExchangeError;
use crate::execution::{ExecutionReport, OrderStatusReport};
use crate::order::{OrderSide, OrderStatus, OrderType};

/// First simulated order ID.
const FIRST_ORDER_ID: u64 = 1_000_000;

/// A call received by the [`PaperExchange`], in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeCall {
    OrderStatus { order_id: u64 },
    Cancel { order_id: u64 },
    StopLimit(StopLimitRequest),
    Market { side: OrderSide, quantity: Decimal },
    Limit { side: OrderSide, price: Decimal, quantity: Decimal },
}

/// An order resting on the paper exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperOrder {
    pub order_id: u64,
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub executed_qty: Decimal,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub status: OrderStatus,
}

#[derive(Debug)]
struct PaperState {
    next_order_id: u64,
    orders: HashMap<u64, PaperOrder>,
    calls: Vec<ExchangeCall>,
    stop_rejections: VecDeque<ExchangeError>,
    status_failures: VecDeque<ExchangeError>,
    market_fills: bool,
}

/// Simulated exchange that accepts every order and records every call.
///
/// Stop-limit rejections and status query failures can be scripted so tests
/// can drive the strategies' fallback and error paths.
#[derive(Debug)]
pub struct PaperExchange {
    state: Mutex<PaperState>,
}

impl Default for PaperExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperExchange {
    /// Create an empty paper exchange.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PaperState {
                next_order_id: FIRST_ORDER_ID,
                orders: HashMap::new(),
                calls: Vec::new(),
                stop_rejections: VecDeque::new(),
                status_failures: VecDeque::new(),
                market_fills: false,
            }),
        }
    }

    /// Fill market orders immediately on submission.
    pub fn with_market_fills(self) -> Self {
        self.state.lock().market_fills = true;
        self
    }

    /// Reject the next stop-limit submission with `error`.
    pub fn reject_next_stop_order(&self, error: ExchangeError) {
        self.state.lock().stop_rejections.push_back(error);
    }

    /// Fail the next status query with `error`.
    pub fn fail_next_status_query(&self, error: ExchangeError) {
        self.state.lock().status_failures.push_back(error);
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<ExchangeCall> {
        self.state.lock().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Look up an order by ID.
    pub fn order(&self, order_id: u64) -> Option<PaperOrder> {
        self.state.lock().orders.get(&order_id).cloned()
    }

    /// Orders still working on the book.
    pub fn open_orders(&self) -> Vec<PaperOrder> {
        let mut open: Vec<_> = self
            .state
            .lock()
            .orders
            .values()
            .filter(|o| o.status.is_active())
            .cloned()
            .collect();
        open.sort_by_key(|o| o.order_id);
        open
    }

    /// Execute `quantity` of an open order and return the resulting report.
    ///
    /// Returns `None` if the order is unknown or no longer active.
    pub fn fill(&self, order_id: u64, quantity: Decimal, price: Decimal) -> Option<ExecutionReport> {
        let mut state = self.state.lock();
        let order = state.orders.get_mut(&order_id)?;
        if !order.status.is_active() {
            return None;
        }

        order.executed_qty = (order.executed_qty + quantity).min(order.quantity);
        order.status = if order.executed_qty >= order.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };

        Some(report_for(order, price))
    }

    fn submit(&self, call: ExchangeCall, mut order: PaperOrder) -> PlacedOrder {
        let mut state = self.state.lock();
        state.calls.push(call);

        let order_id = state.next_order_id;
        state.next_order_id += 1;
        order.order_id = order_id;

        if order.order_type == OrderType::Market && state.market_fills {
            order.executed_qty = order.quantity;
            order.status = OrderStatus::Filled;
        }

        tracing::debug!(
            order_id,
            symbol = %order.symbol,
            side = %order.side,
            order_type = ?order.order_type,
            quantity = %order.quantity,
            price = ?order.price,
            stop_price = ?order.stop_price,
            "[PAPER] order accepted"
        );

        state.orders.insert(order_id, order);
        PlacedOrder { order_id }
    }
}

fn report_for(order: &PaperOrder, price: Decimal) -> ExecutionReport {
    ExecutionReport {
        event_time_ms: 0,
        symbol: order.symbol.clone(),
        order_id: order.order_id,
        side: order.side,
        order_status: order.status,
        quantity: order.quantity,
        cumulative_filled_qty: order.executed_qty,
        last_executed_price: price,
    }
}

#[async_trait]
impl ExchangeConnector for PaperExchange {
    async fn order_status(
        &self,
        _symbol: &str,
        order_id: u64,
    ) -> Result<OrderStatusReport, ExchangeError> {
        let mut state = self.state.lock();
        state.calls.push(ExchangeCall::OrderStatus { order_id });

        if let Some(error) = state.status_failures.pop_front() {
            return Err(error);
        }

        state
            .orders
            .get(&order_id)
            .map(|o| OrderStatusReport {
                order_id,
                orig_qty: o.quantity,
                executed_qty: o.executed_qty,
                status: o.status,
            })
            .ok_or(ExchangeError::OrderNotFound)
    }

    async fn cancel_order(&self, _symbol: &str, order_id: u64) -> Result<bool, ExchangeError> {
        let mut state = self.state.lock();
        state.calls.push(ExchangeCall::Cancel { order_id });

        match state.orders.get_mut(&order_id) {
            Some(order) if order.status.is_active() => {
                order.status = OrderStatus::Canceled;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(ExchangeError::OrderNotFound),
        }
    }

    async fn create_stop_limit_order(&self, request: &StopLimitRequest) -> StopOrderOutcome {
        let rejection = self.state.lock().stop_rejections.pop_front();
        if let Some(error) = rejection {
            self.state
                .lock()
                .calls
                .push(ExchangeCall::StopLimit(request.clone()));
            return StopOrderOutcome::from(Err::<PlacedOrder, _>(error));
        }

        let order = PaperOrder {
            order_id: 0,
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: OrderType::StopLossLimit,
            quantity: request.quantity,
            executed_qty: Decimal::ZERO,
            price: Some(request.limit_price),
            stop_price: Some(request.stop_price),
            status: OrderStatus::New,
        };
        StopOrderOutcome::Placed(self.submit(ExchangeCall::StopLimit(request.clone()), order))
    }

    async fn create_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<PlacedOrder, ExchangeError> {
        let order = PaperOrder {
            order_id: 0,
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Market,
            quantity,
            executed_qty: Decimal::ZERO,
            price: None,
            stop_price: None,
            status: OrderStatus::New,
        };
        Ok(self.submit(ExchangeCall::Market { side, quantity }, order))
    }

    async fn create_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<PlacedOrder, ExchangeError> {
        let order = PaperOrder {
            order_id: 0,
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Limit,
            quantity,
            executed_qty: Decimal::ZERO,
            price: Some(price),
            stop_price: None,
            status: OrderStatus::New,
        };
        Ok(self.submit(
            ExchangeCall::Limit {
                side,
                price,
                quantity,
            },
            order,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stop_request() -> StopLimitRequest {
        StopLimitRequest {
            symbol: "BTCUSDT".into(),
            side: OrderSide::Buy,
            stop_price: dec!(98),
            limit_price: dec!(100),
            quantity: dec!(1),
        }
    }

    #[tokio::test]
    async fn test_unique_sequential_ids() {
        let exchange = PaperExchange::new();

        let a = exchange
            .create_market_order("BTCUSDT", OrderSide::Buy, dec!(1))
            .await
            .unwrap();
        let b = exchange
            .create_limit_order("BTCUSDT", OrderSide::Sell, dec!(110), dec!(1))
            .await
            .unwrap();

        assert_eq!(a.order_id, FIRST_ORDER_ID);
        assert_eq!(b.order_id, FIRST_ORDER_ID + 1);
    }

    #[tokio::test]
    async fn test_scripted_stop_rejection() {
        let exchange = PaperExchange::new();
        exchange.reject_next_stop_order(ExchangeError::WouldTriggerImmediately);

        let outcome = exchange.create_stop_limit_order(&stop_request()).await;
        assert_eq!(outcome, StopOrderOutcome::WouldTriggerImmediately);
        assert!(exchange.open_orders().is_empty());

        let outcome = exchange.create_stop_limit_order(&stop_request()).await;
        assert!(matches!(outcome, StopOrderOutcome::Placed(_)));
        assert_eq!(exchange.open_orders().len(), 1);
        assert_eq!(exchange.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_filled_order_has_no_effect() {
        let exchange = PaperExchange::new();
        let placed = exchange
            .create_limit_order("BTCUSDT", OrderSide::Sell, dec!(110), dec!(1))
            .await
            .unwrap();

        let report = exchange.fill(placed.order_id, dec!(1), dec!(110)).unwrap();
        assert_eq!(report.order_status, OrderStatus::Filled);

        let canceled = exchange
            .cancel_order("BTCUSDT", placed.order_id)
            .await
            .unwrap();
        assert!(!canceled);
        assert_eq!(
            exchange.cancel_order("BTCUSDT", 42).await,
            Err(ExchangeError::OrderNotFound)
        );
    }

    #[tokio::test]
    async fn test_partial_fill_status() {
        let exchange = PaperExchange::new();
        let outcome = exchange.create_stop_limit_order(&stop_request()).await;
        let StopOrderOutcome::Placed(placed) = outcome else {
            panic!("stop order should be accepted");
        };

        exchange.fill(placed.order_id, dec!(0.4), dec!(99)).unwrap();

        let status = exchange
            .order_status("BTCUSDT", placed.order_id)
            .await
            .unwrap();
        assert_eq!(status.status, OrderStatus::PartiallyFilled);
        assert_eq!(status.unfilled_qty(), dec!(0.6));
    }

    #[tokio::test]
    async fn test_market_fills() {
        let exchange = PaperExchange::new().with_market_fills();
        let placed = exchange
            .create_market_order("BTCUSDT", OrderSide::Sell, dec!(2))
            .await
            .unwrap();
        assert_eq!(
            exchange.order(placed.order_id).unwrap().status,
            OrderStatus::Filled
        );
    }
}
