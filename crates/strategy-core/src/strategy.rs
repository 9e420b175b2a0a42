//! Strategy trait definition.

use async_trait::async_trait;
use execution_core::ExecutionReport;
use model::{PriceTick, Target};

use crate::error::StrategyError;
use crate::state::TradeState;

/// Capability shared by every strategy that works a trade.
///
/// Calls for one trade are made strictly one at a time; implementations
/// mutate `state` freely during their turn.
#[async_trait]
pub trait TradingStrategy: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// React to a price tick.
    async fn execute(&mut self, state: &mut TradeState, tick: &PriceTick)
        -> Result<(), StrategyError>;

    /// Reconcile after the exchange reported a change on `target`.
    ///
    /// `target` is a snapshot of the leg after the change was applied.
    async fn order_status_changed(
        &mut self,
        _state: &mut TradeState,
        _target: &Target,
        _report: &ExecutionReport,
    ) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Whether this strategy has nothing left to do.
    fn is_completed(&self, state: &TradeState) -> bool;
}

/// A boxed strategy trait object.
pub type BoxedStrategy = Box<dyn TradingStrategy>;
