//! Ledger snapshots: one row of positions and one row of holdings per tick.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Signed quantity held per symbol at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub date: NaiveDate,
    pub quantities: BTreeMap<String, i64>,
}

impl PositionSnapshot {
    pub fn quantity(&self, symbol: &str) -> i64 {
        self.quantities.get(symbol).copied().unwrap_or(0)
    }
}

/// Mark-to-market value per symbol plus the cash account.
///
/// `cash` is net of every commission paid so far; `commission` is the running
/// total kept for reporting. `total == cash + Σ market_values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    pub date: NaiveDate,
    pub market_values: BTreeMap<String, f64>,
    pub cash: f64,
    pub commission: f64,
    pub total: f64,
}

impl HoldingsSnapshot {
    pub fn market_value(&self, symbol: &str) -> f64 {
        self.market_values.get(symbol).copied().unwrap_or(0.0)
    }

    /// Sum of all position market values.
    pub fn invested(&self) -> f64 {
        self.market_values.values().sum()
    }
}
