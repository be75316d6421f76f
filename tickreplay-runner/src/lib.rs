//! tickreplay runner: configuration, run wiring and artifact export.
//!
//! This crate builds on `tickreplay-core` to provide:
//! - TOML configuration with validation and content-addressed run IDs
//! - A single-run entry point from config to `BacktestResult`
//! - JSON and CSV artifacts for each run

pub mod config;
pub mod export;
pub mod runner;

pub use config::{BacktestConfig, ConfigError, RunId, StrategyConfig};
pub use export::{load_artifacts, save_artifacts};
pub use runner::{run_from_config, run_with_source, BacktestResult, EquityPoint, RunError};
