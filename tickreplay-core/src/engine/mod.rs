//! Event dispatch loop: the scheduler that ties the feed, strategy, ledger
//! and broker together one tick at a time.
//!
//! Per tick:
//!
//! 1. Running: the feed releases one bar per symbol and a Market event is queued
//! 2. Draining: events are popped FIFO and dispatched until the queue is empty
//!    - Market: ledger valuation, then strategy signals
//!    - Signal: ledger sizing into an Order
//!    - Order: execution into a Fill
//!    - Fill: ledger booking, then re-valuation
//! 3. Back to Running; the feed is never advanced while events are pending
//!
//! When the feed reports exhaustion the loop stops and analytics run once.

pub mod event_loop;

pub use event_loop::Simulation;

use crate::analytics::{PerformanceReport, DEFAULT_PERIODS_PER_YEAR};
use crate::ledger::{Ledger, LedgerError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Draining,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Optional sleep between ticks.
    pub pacing: Option<Duration>,
    pub periods_per_year: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            pacing: None,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
        }
    }
}

/// Event throughput for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub ticks: usize,
    pub signals: usize,
    pub orders: usize,
    pub fills: usize,
    /// Events discarded with a warning.
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub report: PerformanceReport,
    pub ledger: Ledger,
    pub counters: RunCounters,
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("feed symbols {feed:?} do not match ledger symbols {ledger:?}")]
    SymbolMismatch {
        feed: Vec<String>,
        ledger: Vec<String>,
    },

    #[error("feed has already released bars")]
    FeedAlreadyStarted,

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
