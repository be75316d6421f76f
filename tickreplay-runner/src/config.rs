//! Serializable backtest configuration, loaded from TOML.
//!
//! ```toml
//! [backtest]
//! symbols = ["AAPL", "CVX"]
//! data_dir = "data"
//! initial_capital = 100000.0
//!
//! [strategy]
//! type = "ma_crossover"
//! short_window = 20
//! long_window = 50
//!
//! [execution.commission]
//! type = "per_share"
//! amount = 0.005
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tickreplay_core::analytics::DEFAULT_PERIODS_PER_YEAR;
use tickreplay_core::execution::{CommissionModel, SimulatedExecution};
use tickreplay_core::ledger::FillPricing;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Full configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,

    #[serde(default)]
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSection {
    /// Symbols to trade, in output order.
    pub symbols: Vec<String>,

    /// Directory holding one `<SYMBOL>.csv` per symbol.
    pub data_dir: PathBuf,

    /// Rows before this date are dropped; also dates the seed snapshot.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,

    /// Units per Long/Short order.
    #[serde(default = "default_order_size")]
    pub order_size: u64,

    /// Optional sleep between ticks, in milliseconds.
    #[serde(default)]
    pub pacing_ms: Option<u64>,

    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
}

/// Strategy selection (serializable enum).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Long every symbol once, never exit.
    #[default]
    BuyAndHold,

    /// Long-only SMA crossover.
    MaCrossover { short_window: usize, long_window: usize },
}

/// Simulated broker settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionConfig {
    #[serde(default = "default_venue")]
    pub venue: String,

    #[serde(default)]
    pub fill_pricing: FillPricing,

    #[serde(default)]
    pub commission: CommissionModel,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            venue: default_venue(),
            fill_pricing: FillPricing::default(),
            commission: CommissionModel::default(),
        }
    }
}

fn default_initial_capital() -> f64 {
    100_000.0
}

fn default_order_size() -> u64 {
    100
}

fn default_periods_per_year() -> u32 {
    DEFAULT_PERIODS_PER_YEAR
}

fn default_venue() -> String {
    SimulatedExecution::DEFAULT_VENUE.to_string()
}

impl BacktestConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs the core would refuse or mis-handle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if bt.symbols.is_empty() {
            return Err(invalid("backtest.symbols", "at least one symbol is required"));
        }
        let mut seen = HashSet::new();
        for symbol in &bt.symbols {
            if symbol.trim().is_empty() {
                return Err(invalid("backtest.symbols", "symbols must be non-empty"));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(invalid("backtest.symbols", format!("duplicate symbol {symbol}")));
            }
        }
        if !(bt.initial_capital.is_finite() && bt.initial_capital > 0.0) {
            return Err(invalid(
                "backtest.initial_capital",
                format!("must be positive, got {}", bt.initial_capital),
            ));
        }
        if bt.order_size == 0 {
            return Err(invalid("backtest.order_size", "must be > 0"));
        }
        if bt.periods_per_year == 0 {
            return Err(invalid("backtest.periods_per_year", "must be > 0"));
        }

        if let StrategyConfig::MaCrossover {
            short_window,
            long_window,
        } = self.strategy
        {
            if short_window == 0 || short_window >= long_window {
                return Err(invalid(
                    "strategy",
                    format!("need 0 < short_window < long_window, got {short_window} / {long_window}"),
                ));
            }
        }

        let rate = self.execution.commission.rate();
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(invalid(
                "execution.commission",
                format!("must be non-negative, got {rate}"),
            ));
        }
        if self.execution.venue.trim().is_empty() {
            return Err(invalid("execution.venue", "must be non-empty"));
        }
        Ok(())
    }

    /// Deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
