//! Execution: turn orders into fills.
//!
//! The simulated handler fills every order in full, immediately, at the
//! latest released adjusted close. The fill is dated with the current tick so
//! replays are deterministic.

pub mod commission;

pub use commission::CommissionModel;

use crate::data::MarketDataFeed;
use crate::domain::{FillEvent, OrderEvent};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExecutionError {
    #[error("no released price for {symbol}")]
    NoPrice { symbol: String },

    #[error("order for {symbol} has zero quantity")]
    ZeroQuantity { symbol: String },
}

/// Seam between the dispatch loop and a (simulated) broker.
pub trait ExecutionHandler: Send {
    fn execute_order(
        &mut self,
        order: &OrderEvent,
        feed: &MarketDataFeed,
    ) -> Result<FillEvent, ExecutionError>;
}

/// Instant full fill at the latest released close.
#[derive(Debug, Clone)]
pub struct SimulatedExecution {
    venue: String,
    commission: CommissionModel,
}

impl SimulatedExecution {
    pub const DEFAULT_VENUE: &'static str = "ARCA";

    pub fn new(venue: impl Into<String>, commission: CommissionModel) -> Self {
        Self {
            venue: venue.into(),
            commission,
        }
    }

    /// Zero-commission simulator on the default venue.
    pub fn frictionless() -> Self {
        Self::new(Self::DEFAULT_VENUE, CommissionModel::None)
    }
}

impl Default for SimulatedExecution {
    fn default() -> Self {
        Self::frictionless()
    }
}

impl ExecutionHandler for SimulatedExecution {
    fn execute_order(
        &mut self,
        order: &OrderEvent,
        feed: &MarketDataFeed,
    ) -> Result<FillEvent, ExecutionError> {
        if order.quantity == 0 {
            return Err(ExecutionError::ZeroQuantity {
                symbol: order.symbol.clone(),
            });
        }
        let (price, date) = feed
            .latest_close(&order.symbol)
            .zip(feed.current_date())
            .ok_or_else(|| ExecutionError::NoPrice {
                symbol: order.symbol.clone(),
            })?;

        let commission = self.commission.compute(price, order.quantity);

        tracing::debug!(
            symbol = %order.symbol,
            direction = %order.direction,
            quantity = order.quantity,
            price,
            commission,
            "order filled"
        );

        Ok(FillEvent {
            symbol: order.symbol.clone(),
            date,
            venue: self.venue.clone(),
            quantity: order.quantity,
            direction: order.direction,
            fill_cost: price,
            commission,
        })
    }
}
