//! Multi-symbol time alignment.
//!
//! Given raw bars for multiple symbols, build one calendar from the union of
//! every symbol's dates and reindex each series onto it. A date a symbol did
//! not trade on repeats that symbol's previous bar (forward fill, no
//! interpolation). Dates before a symbol's first observation get a void bar.

use super::provider::RawBar;
use crate::domain::Bar;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Bar data for multiple symbols on a common calendar.
#[derive(Debug, Clone)]
pub struct AlignedData {
    /// The common date axis (sorted ascending, no duplicates).
    pub dates: Vec<NaiveDate>,
    /// Bars per symbol. Each Vec has the same length as `dates`.
    pub bars: HashMap<String, Vec<Bar>>,
    /// Symbols in the order they were requested.
    pub symbols: Vec<String>,
}

impl AlignedData {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Align multiple symbols to a common calendar.
///
/// `symbols` fixes the output order; every symbol must have an entry in
/// `symbol_bars`. Within one symbol, a repeated date keeps the last row.
pub fn align_symbols(symbols: &[String], symbol_bars: &HashMap<String, Vec<RawBar>>) -> AlignedData {
    // Deduplicate and sort each series once.
    let mut by_symbol: HashMap<&str, BTreeMap<NaiveDate, &RawBar>> = HashMap::new();
    for symbol in symbols {
        let mut dated = BTreeMap::new();
        if let Some(bars) = symbol_bars.get(symbol) {
            for bar in bars {
                dated.insert(bar.date, bar);
            }
        }
        by_symbol.insert(symbol.as_str(), dated);
    }

    // Union of every symbol's dates.
    let mut calendar = BTreeSet::new();
    for dated in by_symbol.values() {
        calendar.extend(dated.keys().copied());
    }
    let dates: Vec<NaiveDate> = calendar.into_iter().collect();

    let mut aligned = HashMap::with_capacity(symbols.len());
    for symbol in symbols {
        let dated = &by_symbol[symbol.as_str()];
        let mut series = Vec::with_capacity(dates.len());
        let mut last: Option<Bar> = None;

        for &date in &dates {
            let bar = match dated.get(&date) {
                Some(raw) => to_bar(symbol, raw),
                None => match &last {
                    Some(prev) => prev.carried_to(date),
                    None => Bar::void(symbol, date),
                },
            };
            if !bar.is_void() {
                last = Some(bar.clone());
            }
            series.push(bar);
        }

        aligned.insert(symbol.clone(), series);
    }

    AlignedData {
        dates,
        bars: aligned,
        symbols: symbols.to_vec(),
    }
}

fn to_bar(symbol: &str, raw: &RawBar) -> Bar {
    Bar {
        symbol: symbol.to_string(),
        date: raw.date,
        open: raw.open,
        high: raw.high,
        low: raw.low,
        volume: raw.volume,
        adj_close: raw.adj_close,
    }
}
