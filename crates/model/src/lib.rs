//! Trade data model shared by the strategies.
//!
//! A [`Trade`] aggregates an optional entry section, an optional exit
//! section, an optional stop-loss leg and any number of profit targets. Each
//! leg is a [`Target`] whose status moves `New -> Active -> {Canceled -> Active}* -> Completed`.

mod balance;
mod params;
mod target;
mod tick;
mod trade;

pub use balance::Balance;
pub use params::{PriceSpec, Threshold, Volume};
pub use target::{Target, TargetKind, TargetStatus};
pub use tick::PriceTick;
pub use trade::{Trade, TradeLeg, TradeSection, TradeStatus};
