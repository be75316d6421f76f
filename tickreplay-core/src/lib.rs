//! tickreplay core: event-driven backtesting over aligned daily bars.
//!
//! This crate contains the whole simulation:
//! - Domain types (bars, events, ledger snapshots)
//! - Bar sources, calendar alignment and the drip-feed
//! - Strategy and execution traits with reference implementations
//! - Portfolio ledger with mark-to-market snapshots
//! - Single-threaded event dispatch loop
//! - Performance analytics (returns, equity curve, Sharpe, drawdown)

pub mod analytics;
pub mod data;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod ledger;
pub mod strategy;

pub use analytics::PerformanceReport;
pub use data::{BarSource, CsvSource, DataError, MarketDataFeed, MemorySource};
pub use domain::{Bar, Event};
pub use engine::{LoopState, RunCounters, Simulation, SimulationConfig, SimulationError, SimulationOutcome};
pub use execution::{CommissionModel, ExecutionHandler, SimulatedExecution};
pub use ledger::{FillPricing, Ledger, LedgerConfig, LedgerError};
pub use strategy::{BuyAndHold, MaCrossover, Strategy};
