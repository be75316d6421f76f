//! Drip-feed over aligned history.
//!
//! The feed owns every symbol's aligned series and a single cursor. Bars at
//! indices `< cursor` have been released; everything else is the future and
//! is unreachable through the public API. `advance()` is the only mutator.

use super::align::{align_symbols, AlignedData};
use super::provider::{BarSource, DataError, RawBar};
use crate::domain::Bar;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct MarketDataFeed {
    symbols: Vec<String>,
    calendar: Vec<NaiveDate>,
    series: HashMap<String, Vec<Bar>>,
    /// Number of bars released per symbol.
    cursor: usize,
    exhausted: bool,
}

impl MarketDataFeed {
    /// Load and align every symbol's full history.
    ///
    /// Fails on the first symbol whose source is missing, unreadable or empty.
    pub fn load<S: AsRef<str>>(symbols: &[S], source: &dyn BarSource) -> Result<Self, DataError> {
        Self::load_since(symbols, source, None)
    }

    /// Like [`load`](Self::load), dropping rows dated before `start`.
    pub fn load_since<S: AsRef<str>>(
        symbols: &[S],
        source: &dyn BarSource,
        start: Option<NaiveDate>,
    ) -> Result<Self, DataError> {
        if symbols.is_empty() {
            return Err(DataError::NoSymbols);
        }

        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let symbol = symbol.as_ref().to_string();
            if !seen.insert(symbol.clone()) {
                return Err(DataError::DuplicateSymbol { symbol });
            }
            ordered.push(symbol);
        }

        let mut raw: HashMap<String, Vec<RawBar>> = HashMap::with_capacity(ordered.len());
        for symbol in &ordered {
            let mut bars = source.load(symbol)?;
            if let Some(start) = start {
                bars.retain(|b| b.date >= start);
            }
            if bars.is_empty() {
                return Err(DataError::EmptySeries {
                    symbol: symbol.clone(),
                });
            }
            raw.insert(symbol.clone(), bars);
        }

        let aligned = align_symbols(&ordered, &raw);
        tracing::info!(
            source = source.name(),
            symbols = ordered.len(),
            bars = aligned.len(),
            first = ?aligned.dates.first(),
            last = ?aligned.dates.last(),
            "feed loaded"
        );
        Ok(Self::from_aligned(aligned))
    }

    /// Wrap already-aligned data. Nothing is released yet.
    pub fn from_aligned(aligned: AlignedData) -> Self {
        Self {
            symbols: aligned.symbols,
            calendar: aligned.dates,
            series: aligned.bars,
            cursor: 0,
            exhausted: false,
        }
    }

    /// Release the next bar for every symbol.
    ///
    /// Returns `false` once any symbol has nothing left; from then on the feed
    /// stays exhausted and never releases again.
    pub fn advance(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        let any_consumed = self
            .symbols
            .iter()
            .any(|s| self.series.get(s).map_or(true, |bars| self.cursor >= bars.len()));
        if any_consumed {
            self.exhausted = true;
            tracing::debug!(released = self.cursor, "feed exhausted");
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Up to the last `n` released bars for `symbol`, oldest first.
    ///
    /// An unknown symbol is not an error: it logs a warning and returns an
    /// empty slice, which callers treat as "no data yet".
    pub fn latest(&self, symbol: &str, n: usize) -> &[Bar] {
        match self.series.get(symbol) {
            Some(bars) => {
                let end = self.cursor.min(bars.len());
                let start = end.saturating_sub(n);
                &bars[start..end]
            }
            None => {
                tracing::warn!(symbol, "latest() called for unknown symbol");
                &[]
            }
        }
    }

    /// The most recently released bar for `symbol`.
    pub fn latest_bar(&self, symbol: &str) -> Option<&Bar> {
        self.latest(symbol, 1).last()
    }

    /// Adjusted close of the most recently released bar, if it is not void.
    pub fn latest_close(&self, symbol: &str) -> Option<f64> {
        self.latest_bar(symbol)
            .filter(|b| !b.is_void())
            .map(|b| b.adj_close)
    }

    /// Date of the most recently released calendar slot.
    pub fn current_date(&self) -> Option<NaiveDate> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.calendar.get(i).copied())
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.series.contains_key(symbol)
    }

    pub fn calendar(&self) -> &[NaiveDate] {
        &self.calendar
    }

    /// Bars released so far (per symbol).
    pub fn released_len(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
