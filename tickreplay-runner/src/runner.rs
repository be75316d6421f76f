//! Backtest runner: wires a `Simulation` from config and collects the result.
//!
//! Two entry points:
//! - `run_from_config()`: reads CSVs from `backtest.data_dir`. Used by the CLI.
//! - `run_with_source()`: takes any `BarSource`. Used by tests and callers
//!   that already hold the bars in memory.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use tickreplay_core::analytics::PerformanceReport;
use tickreplay_core::data::{BarSource, CsvSource, DataError, MarketDataFeed};
use tickreplay_core::execution::SimulatedExecution;
use tickreplay_core::ledger::{Ledger, LedgerConfig, LedgerError};
use tickreplay_core::strategy::{BuyAndHold, MaCrossover, Strategy, StrategyError};
use tickreplay_core::{RunCounters, Simulation, SimulationConfig, SimulationError};

use crate::config::{BacktestConfig, ConfigError, RunId, StrategyConfig};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("no bars to replay")]
    EmptyCalendar,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// One row of the equity output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub total: f64,
    pub cash: f64,
    pub commission: f64,
    /// NaN on the first row and after a zero total; serialized as null.
    pub returns: Option<f64>,
    pub equity_curve: f64,
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub symbols: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_capital: f64,
    pub final_cash: f64,
    pub final_total: f64,
    pub report: PerformanceReport,
    /// Ordered (label, value) pairs as printed on the console.
    pub summary: Vec<(String, String)>,
    pub counters: RunCounters,
    pub equity: Vec<EquityPoint>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Build the configured strategy.
pub fn build_strategy(config: &StrategyConfig) -> Result<Box<dyn Strategy>, StrategyError> {
    Ok(match *config {
        StrategyConfig::BuyAndHold => Box::new(BuyAndHold::new()),
        StrategyConfig::MaCrossover {
            short_window,
            long_window,
        } => Box::new(MaCrossover::new(short_window, long_window)?),
    })
}

/// Run a backtest reading `<data_dir>/<SYMBOL>.csv` for every symbol.
///
/// Returns the result alongside the final ledger so callers can export the
/// full snapshot history.
pub fn run_from_config(config: &BacktestConfig) -> Result<(BacktestResult, Ledger), RunError> {
    let source = CsvSource::new(&config.backtest.data_dir);
    run_with_source(config, &source)
}

/// Run a backtest against an arbitrary bar source.
pub fn run_with_source(
    config: &BacktestConfig,
    source: &dyn BarSource,
) -> Result<(BacktestResult, Ledger), RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let bt = &config.backtest;

    let feed = MarketDataFeed::load_since(&bt.symbols, source, bt.start_date)?;
    let seed_date = bt
        .start_date
        .or_else(|| feed.calendar().first().copied())
        .ok_or(RunError::EmptyCalendar)?;
    let ledger = Ledger::new(
        feed.symbols(),
        seed_date,
        LedgerConfig {
            initial_capital: bt.initial_capital,
            order_size: bt.order_size,
            fill_pricing: config.execution.fill_pricing,
        },
    )?;
    let strategy = build_strategy(&config.strategy)?;
    let strategy_name = strategy.name().to_string();
    let execution = SimulatedExecution::new(config.execution.venue.clone(), config.execution.commission);
    let sim_config = SimulationConfig {
        pacing: bt.pacing_ms.filter(|&ms| ms > 0).map(Duration::from_millis),
        periods_per_year: bt.periods_per_year,
    };

    tracing::info!(run_id = %&run_id[..12], strategy = %strategy_name, "starting run");
    let outcome = Simulation::new(feed, ledger, strategy, Box::new(execution), sim_config)?.run()?;

    let ledger = outcome.ledger;
    let equity = equity_points(&ledger);
    let current = ledger.current_holdings();
    let result = BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        strategy: strategy_name,
        symbols: bt.symbols.clone(),
        start_date: ledger.all_holdings().first().map(|h| h.date),
        end_date: ledger.all_holdings().last().map(|h| h.date),
        initial_capital: bt.initial_capital,
        final_cash: current.cash,
        final_total: current.total,
        summary: outcome
            .report
            .summary()
            .into_iter()
            .map(|(label, value)| (label.to_string(), value))
            .collect(),
        report: outcome.report,
        counters: outcome.counters,
        equity,
    };
    Ok((result, ledger))
}

/// Date, totals and the analytics series for every holdings snapshot.
pub fn equity_points(ledger: &Ledger) -> Vec<EquityPoint> {
    let returns = ledger.returns();
    let curve = ledger.equity_curve();
    ledger
        .all_holdings()
        .iter()
        .zip(returns.iter().zip(curve.iter()))
        .map(|(h, (&r, &c))| EquityPoint {
            date: h.date,
            total: h.total,
            cash: h.cash,
            commission: h.commission,
            returns: Some(r).filter(|r| r.is_finite()),
            equity_curve: c,
        })
        .collect()
}
