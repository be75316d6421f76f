//! Integration tests for the CSV source and calendar alignment using the
//! frozen fixtures under `tests/fixtures`.

use chrono::NaiveDate;
use std::path::PathBuf;
use tickreplay_core::data::{BarSource, CsvSource, DataError, MarketDataFeed};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn fixture_loads_with_extra_columns_ignored() {
    let source = CsvSource::new(fixture_dir());
    let bars = source.load("AAPL").unwrap();
    assert_eq!(bars.len(), 5);
    assert_eq!(bars[0].date, d("2024-01-02"));
    // adj_close, not close
    assert_eq!(bars[0].adj_close, 184.73);
    assert_eq!(bars[0].volume, 82_488_700);
}

#[test]
fn gap_is_forward_filled_not_interpolated() {
    let source = CsvSource::new(fixture_dir());
    let mut feed = MarketDataFeed::load(&["AAPL", "CVX"], &source).unwrap();
    // AAPL trades 2024-01-04, CVX does not
    assert_eq!(feed.calendar().len(), 5);

    for _ in 0..3 {
        assert!(feed.advance());
    }
    assert_eq!(feed.current_date(), Some(d("2024-01-04")));
    let filled = feed.latest_bar("CVX").unwrap();
    let prior = &feed.latest("CVX", 2)[0];
    assert_eq!(prior.date, d("2024-01-03"));
    assert_eq!(filled.date, d("2024-01-04"));
    assert_eq!(filled.open, prior.open);
    assert_eq!(filled.high, prior.high);
    assert_eq!(filled.low, prior.low);
    assert_eq!(filled.volume, prior.volume);
    assert_eq!(filled.adj_close, prior.adj_close);
}

#[test]
fn missing_file_is_fatal() {
    let source = CsvSource::new(fixture_dir());
    let err = MarketDataFeed::load(&["AAPL", "MSFT"], &source).unwrap_err();
    match err {
        DataError::SourceMissing { symbol, path } => {
            assert_eq!(symbol, "MSFT");
            assert!(path.ends_with("MSFT.csv"));
        }
        other => panic!("expected SourceMissing, got {other:?}"),
    }
}

#[test]
fn malformed_file_is_fatal() {
    let source = CsvSource::new(fixture_dir());
    let err = MarketDataFeed::load(&["BAD"], &source).unwrap_err();
    assert!(matches!(err, DataError::Malformed { .. }), "got {err:?}");
}

#[test]
fn start_date_filters_rows() {
    let source = CsvSource::new(fixture_dir());
    let feed = MarketDataFeed::load_since(&["AAPL", "CVX"], &source, Some(d("2024-01-05"))).unwrap();
    assert_eq!(feed.calendar(), &[d("2024-01-05"), d("2024-01-08")]);
}
