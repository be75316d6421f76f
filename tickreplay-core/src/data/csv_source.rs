//! CSV directory source: one `<SYMBOL>.csv` per symbol.
//!
//! Expected header: `date,open,high,low,volume,adj_close`. Extra columns
//! (`close`, `dividends`, ...) are ignored. Dates are `YYYY-MM-DD`.

use super::provider::{BarSource, DataError, RawBar};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;

/// Row shape as it appears on disk. Volume is read as a float because some
/// exporters write `12345.0`.
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    volume: f64,
    adj_close: f64,
}

#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the source will read for `symbol`.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl BarSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn load(&self, symbol: &str) -> Result<Vec<RawBar>, DataError> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(DataError::SourceMissing {
                symbol: symbol.to_string(),
                path,
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| csv_error(symbol, e))?;

        let mut bars = Vec::new();
        for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| csv_error(symbol, e))?;
            let date = parse_date(&row.date).ok_or_else(|| DataError::Malformed {
                symbol: symbol.to_string(),
                reason: format!("row {}: unparseable date '{}'", i + 1, row.date),
            })?;
            for (field, value) in [
                ("open", row.open),
                ("high", row.high),
                ("low", row.low),
                ("adj_close", row.adj_close),
            ] {
                if !value.is_finite() {
                    return Err(DataError::Malformed {
                        symbol: symbol.to_string(),
                        reason: format!("row {}: non-finite {field} {value}", i + 1),
                    });
                }
            }
            if row.volume < 0.0 || !row.volume.is_finite() {
                return Err(DataError::Malformed {
                    symbol: symbol.to_string(),
                    reason: format!("row {}: invalid volume {}", i + 1, row.volume),
                });
            }
            bars.push(RawBar {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                volume: row.volume.round() as u64,
                adj_close: row.adj_close,
            });
        }

        tracing::debug!(symbol, rows = bars.len(), path = %path.display(), "read csv");
        Ok(bars)
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn csv_error(symbol: &str, err: csv::Error) -> DataError {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(io) = err.into_kind() {
            return DataError::Io {
                symbol: symbol.to_string(),
                source: io,
            };
        }
        return DataError::Malformed {
            symbol: symbol.to_string(),
            reason: "I/O error".into(),
        };
    }
    DataError::Malformed {
        symbol: symbol.to_string(),
        reason: err.to_string(),
    }
}
