//! Look-ahead contamination tests.
//!
//! Invariant: nothing computed on tick t may depend on bar t+1 or later.
//!
//! Method: run the same strategy on a truncated history (first 60 bars) and
//! on the full history (120 bars). Every signal and every snapshot from the
//! first 60 ticks must be identical between the two runs.

use chrono::NaiveDate;
use tickreplay_core::data::{MarketDataFeed, MemorySource, RawBar};
use tickreplay_core::domain::{MarketEvent, SignalEvent};
use tickreplay_core::execution::SimulatedExecution;
use tickreplay_core::ledger::{Ledger, LedgerConfig};
use tickreplay_core::strategy::{MaCrossover, Strategy};
use tickreplay_core::{Simulation, SimulationConfig};

/// Deterministic oscillating walk so the crossover fires several times.
fn make_test_bars(n: usize) -> Vec<RawBar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    (0..n)
        .map(|i| {
            let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
            let noise = ((seed >> 33) % 100) as f64 / 100.0;
            let px = 100.0 + 10.0 * (i as f64 / 7.0).sin() + noise;
            RawBar {
                date: base_date + chrono::Duration::days(i as i64),
                open: px - 0.2,
                high: px + 1.0,
                low: px - 1.0,
                volume: 1_000 + i as u64,
                adj_close: px,
            }
        })
        .collect()
}

/// Records what the feed exposes at every market event.
struct Recorder {
    inner: MaCrossover,
    seen: Vec<(NaiveDate, NaiveDate, usize)>,
}

impl Strategy for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn calculate_signals(&mut self, market: &MarketEvent, feed: &MarketDataFeed) -> Vec<SignalEvent> {
        let history = feed.latest("TEST", usize::MAX);
        let newest = history.last().map(|b| b.date).unwrap_or(market.date);
        self.seen.push((market.date, newest, history.len()));
        self.inner.calculate_signals(market, feed)
    }
}

fn simulate(bars: Vec<RawBar>) -> Ledger {
    let source = MemorySource::new().with_series("TEST", bars);
    let feed = MarketDataFeed::load(&["TEST"], &source).unwrap();
    let ledger = Ledger::new(feed.symbols(), feed.calendar()[0], LedgerConfig::default()).unwrap();
    let recorder = Recorder {
        inner: MaCrossover::new(3, 10).unwrap(),
        seen: Vec::new(),
    };
    Simulation::new(
        feed,
        ledger,
        Box::new(recorder),
        Box::new(SimulatedExecution::frictionless()),
        SimulationConfig::default(),
    )
    .unwrap()
    .run()
    .unwrap()
    .ledger
}

#[test]
fn truncated_and_full_runs_agree_on_shared_prefix() {
    let full_bars = make_test_bars(120);
    let full = simulate(full_bars.clone());
    let truncated = simulate(full_bars[..60].to_vec());

    // seed + 60 ticks
    let shared = 61;
    assert_eq!(truncated.all_holdings().len(), shared);
    assert_eq!(
        &full.all_positions()[..shared],
        truncated.all_positions(),
        "positions diverge before the truncation point"
    );
    for (i, (f, t)) in full.all_holdings()[..shared]
        .iter()
        .zip(truncated.all_holdings())
        .enumerate()
    {
        assert_eq!(f.date, t.date, "date mismatch at snapshot {i}");
        assert!(
            (f.total - t.total).abs() < 1e-9,
            "total mismatch at snapshot {i}: full={}, truncated={}",
            f.total,
            t.total
        );
    }
}

#[test]
fn crossover_trades_in_the_test_series() {
    let ledger = simulate(make_test_bars(120));
    let entries = ledger
        .all_positions()
        .windows(2)
        .filter(|w| w[0].quantity("TEST") == 0 && w[1].quantity("TEST") > 0)
        .count();
    assert!(entries >= 1, "series should trigger at least one entry");
    ledger.reconcile().unwrap();
}

#[test]
fn feed_never_exposes_a_future_bar() {
    let source = MemorySource::new().with_series("TEST", make_test_bars(30));
    let mut feed = MarketDataFeed::load(&["TEST"], &source).unwrap();
    let mut recorder = Recorder {
        inner: MaCrossover::new(2, 5).unwrap(),
        seen: Vec::new(),
    };
    while feed.advance() {
        let market = MarketEvent {
            date: feed.current_date().unwrap(),
        };
        recorder.calculate_signals(&market, &feed);
    }

    assert_eq!(recorder.seen.len(), 30);
    for (tick, &(market_date, newest, len)) in recorder.seen.iter().enumerate() {
        assert_eq!(newest, market_date, "tick {tick} saw a bar from another date");
        assert_eq!(len, tick + 1, "tick {tick} saw {len} bars");
    }
}
