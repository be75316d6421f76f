//! Strategies: turn released market data into directional advice.
//!
//! A strategy sees the feed only through its read-only lookback API, so it
//! cannot observe a bar the feed has not released. It never sees the ledger:
//! sizing and exits-to-flat are the ledger's job.

pub mod buy_and_hold;
pub mod ma_crossover;

pub use buy_and_hold::BuyAndHold;
pub use ma_crossover::MaCrossover;

use crate::data::MarketDataFeed;
use crate::domain::{MarketEvent, SignalEvent};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StrategyError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParam { name: &'static str, reason: String },
}

/// Trait for strategies driven by the dispatch loop.
pub trait Strategy: Send {
    /// Human-readable name (e.g., "buy_and_hold").
    fn name(&self) -> &str;

    /// React to a market event. Returned signals are queued in order.
    fn calculate_signals(&mut self, market: &MarketEvent, feed: &MarketDataFeed)
        -> Vec<SignalEvent>;
}
