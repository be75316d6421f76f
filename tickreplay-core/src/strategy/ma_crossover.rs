//! Moving average crossover: long-only trend follower.
//!
//! Fires Long when the short SMA of adjusted closes crosses above the long
//! SMA, and Exit when it crosses back below. Both averages are computed from
//! `feed.latest(symbol, long_window)`, so only released bars are read.

use super::{Strategy, StrategyError};
use crate::data::MarketDataFeed;
use crate::domain::{MarketEvent, SignalEvent, SignalKind};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub short_window: usize,
    pub long_window: usize,
    /// Last strict short-vs-long relation per symbol. `Equal` is only held
    /// until the first strict relation is seen.
    last_relation: HashMap<String, Ordering>,
    invested: HashMap<String, bool>,
}

impl MaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, StrategyError> {
        if short_window == 0 {
            return Err(StrategyError::InvalidParam {
                name: "short_window",
                reason: "must be >= 1".into(),
            });
        }
        if long_window <= short_window {
            return Err(StrategyError::InvalidParam {
                name: "long_window",
                reason: format!("must be > short_window ({short_window})"),
            });
        }
        Ok(Self {
            short_window,
            long_window,
            last_relation: HashMap::new(),
            invested: HashMap::new(),
        })
    }

    fn relation(&self, feed: &MarketDataFeed, symbol: &str) -> Option<Ordering> {
        let window = feed.latest(symbol, self.long_window);
        if window.len() < self.long_window || window.iter().any(|b| b.is_void()) {
            return None;
        }
        let long = mean(window.iter().map(|b| b.adj_close));
        let short = mean(window[window.len() - self.short_window..].iter().map(|b| b.adj_close));
        short.partial_cmp(&long)
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len() as f64;
    values.sum::<f64>() / n
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn calculate_signals(&mut self, _market: &MarketEvent, feed: &MarketDataFeed) -> Vec<SignalEvent> {
        let mut signals = Vec::new();
        for symbol in feed.symbols() {
            let Some(relation) = self.relation(feed, symbol) else {
                continue;
            };
            let Some(date) = feed.latest_bar(symbol).map(|b| b.date) else {
                continue;
            };
            let previous = self.last_relation.get(symbol).copied();
            if relation != Ordering::Equal || previous.is_none() {
                self.last_relation.insert(symbol.clone(), relation);
            }
            let invested = self.invested.get(symbol).copied().unwrap_or(false);

            let crossed_up = relation == Ordering::Greater
                && matches!(previous, Some(Ordering::Less | Ordering::Equal));
            let crossed_down = relation == Ordering::Less
                && matches!(previous, Some(Ordering::Greater | Ordering::Equal));

            if crossed_up && !invested {
                signals.push(SignalEvent {
                    symbol: symbol.clone(),
                    date,
                    kind: SignalKind::Long,
                });
                self.invested.insert(symbol.clone(), true);
            } else if crossed_down && invested {
                signals.push(SignalEvent {
                    symbol: symbol.clone(),
                    date,
                    kind: SignalKind::Exit,
                });
                self.invested.insert(symbol.clone(), false);
            }
        }
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MemorySource, RawBar};
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> Vec<RawBar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &px)| RawBar {
                date: base + chrono::Duration::days(i as i64),
                open: px,
                high: px,
                low: px,
                volume: 1,
                adj_close: px,
            })
            .collect()
    }

    fn run(closes: &[f64], short: usize, long: usize) -> Vec<SignalKind> {
        let source = MemorySource::new().with_series("X", series(closes));
        let mut feed = MarketDataFeed::load(&["X"], &source).unwrap();
        let mut strategy = MaCrossover::new(short, long).unwrap();
        let mut kinds = Vec::new();
        while feed.advance() {
            let market = MarketEvent { date: feed.current_date().unwrap() };
            kinds.extend(strategy.calculate_signals(&market, &feed).into_iter().map(|s| s.kind));
        }
        kinds
    }

    #[test]
    fn rejects_bad_windows() {
        assert!(MaCrossover::new(0, 5).is_err());
        assert!(MaCrossover::new(5, 5).is_err());
        assert!(MaCrossover::new(2, 5).is_ok());
    }

    #[test]
    fn long_then_exit_on_reversal() {
        let closes = [10.0, 9.0, 8.0, 7.0, 8.0, 10.0, 12.0, 11.0, 9.0, 7.0];
        assert_eq!(run(&closes, 2, 4), vec![SignalKind::Long, SignalKind::Exit]);
    }

    #[test]
    fn no_entry_without_a_prior_relation() {
        // short above long from the first computable bar: nothing crossed
        assert!(run(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 4).is_empty());
    }

    #[test]
    fn exit_through_an_equal_bar() {
        // Equal, Greater (long), Equal, then Less
        let closes = [1.0, 1.0, 2.0, 2.0, 1.0, 0.9, 0.8, 0.7];
        assert_eq!(run(&closes, 1, 2), vec![SignalKind::Long, SignalKind::Exit]);
    }

    #[test]
    fn entry_through_an_equal_bar() {
        // Less, Equal, Greater
        let closes = [3.0, 2.0, 2.0, 3.0];
        assert_eq!(run(&closes, 1, 2), vec![SignalKind::Long]);
    }

    #[test]
    fn silent_during_warmup() {
        assert!(run(&[1.0, 2.0, 3.0], 2, 4).is_empty());
    }
}
