//! Bar: the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily bar for a single symbol, as released by the feed.
///
/// `adj_close` is the only price the ledger values positions at. Bars are
/// produced once by calendar alignment and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    pub adj_close: f64,
}

impl Bar {
    /// A placeholder for a calendar date that precedes the symbol's first
    /// observation. There is nothing to carry forward yet, so prices are NaN.
    pub fn void(symbol: &str, date: NaiveDate) -> Self {
        Self {
            symbol: symbol.to_string(),
            date,
            open: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            volume: 0,
            adj_close: f64::NAN,
        }
    }

    /// Returns true if any price field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.adj_close.is_nan()
    }

    /// Same prices and volume under a different date.
    ///
    /// Used by alignment to forward-fill a gap: the carried bar keeps the
    /// previous observation's values and only moves on the calendar.
    pub fn carried_to(&self, date: NaiveDate) -> Self {
        Self {
            date,
            ..self.clone()
        }
    }
}
