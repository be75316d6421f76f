//! Bar source trait and structured error types.
//!
//! The `BarSource` trait abstracts over where per-symbol history comes from
//! (a directory of CSV files, an in-memory map for tests) so the feed never
//! knows about files.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Raw daily bar as read from a source, before calendar alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    pub adj_close: f64,
}

/// Structured error types for data loading.
///
/// Every variant is fatal to feed construction: there is no partial-data mode.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no symbols requested")]
    NoSymbols,

    #[error("duplicate symbol '{symbol}' in symbol list")]
    DuplicateSymbol { symbol: String },

    #[error("no data source for '{symbol}' (expected {path})")]
    SourceMissing { symbol: String, path: PathBuf },

    #[error("symbol not found in source: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("malformed data for '{symbol}': {reason}")]
    Malformed { symbol: String, reason: String },

    #[error("no bars for '{symbol}' in the requested window")]
    EmptySeries { symbol: String },

    #[error("I/O error reading '{symbol}': {source}")]
    Io {
        symbol: String,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for per-symbol history sources.
pub trait BarSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Load the complete daily history for one symbol, in any order.
    fn load(&self, symbol: &str) -> Result<Vec<RawBar>, DataError>;
}

/// Source backed by bars already in memory. Used by tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    series: HashMap<String, Vec<RawBar>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, bars: Vec<RawBar>) -> Self {
        self.series.insert(symbol.to_string(), bars);
        self
    }
}

impl BarSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self, symbol: &str) -> Result<Vec<RawBar>, DataError> {
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}
