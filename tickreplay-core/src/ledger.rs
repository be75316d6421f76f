//! Portfolio ledger: positions, holdings and the append-only snapshot history.
//!
//! The ledger owns one mutable current state (positions + holdings) and two
//! index-aligned histories. A Market event appends exactly one snapshot of
//! each kind; a Fill mutates the current state and re-marks it in place, so
//! the next Market snapshot carries the fill.
//!
//! Accounting identity, checked after every valuation:
//! `total == cash + Σ market_value`, where `cash` is already net of every
//! commission paid.

use crate::analytics;
use crate::data::MarketDataFeed;
use crate::domain::{
    Direction, Event, FillEvent, HoldingsSnapshot, OrderEvent, OrderType, PositionSnapshot,
    SignalEvent, SignalKind,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Tolerance for the holdings reconciliation check.
const RECONCILE_TOLERANCE: f64 = 1e-6;

/// Which price the ledger books a fill at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FillPricing {
    /// Latest released adjusted close for the symbol.
    #[default]
    LatestClose,
    /// The per-unit `fill_cost` reported on the fill.
    FillEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub initial_capital: f64,
    /// Fixed quantity for Long/Short orders.
    pub order_size: u64,
    pub fill_pricing: FillPricing,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            order_size: 100,
            fill_pricing: FillPricing::LatestClose,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("initial capital must be positive and finite, got {0}")]
    InvalidCapital(f64),

    #[error("order size must be > 0")]
    ZeroOrderSize,

    #[error("fill for unknown symbol {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("no price to book fill for {symbol}")]
    NoPrice { symbol: String },

    #[error("holdings do not reconcile on {date}: total={total}, cash + positions={expected}")]
    Unreconciled {
        date: NaiveDate,
        total: f64,
        expected: f64,
    },
}

#[derive(Debug, Clone)]
pub struct Ledger {
    symbols: Vec<String>,
    config: LedgerConfig,
    current_positions: PositionSnapshot,
    current_holdings: HoldingsSnapshot,
    all_positions: Vec<PositionSnapshot>,
    all_holdings: Vec<HoldingsSnapshot>,
}

impl Ledger {
    /// Create a flat ledger holding `initial_capital` in cash. The seed
    /// snapshot at `seed_date` becomes index 0 of both histories.
    pub fn new(
        symbols: &[String],
        seed_date: NaiveDate,
        config: LedgerConfig,
    ) -> Result<Self, LedgerError> {
        if !(config.initial_capital.is_finite() && config.initial_capital > 0.0) {
            return Err(LedgerError::InvalidCapital(config.initial_capital));
        }
        if config.order_size == 0 {
            return Err(LedgerError::ZeroOrderSize);
        }

        let current_positions = PositionSnapshot {
            date: seed_date,
            quantities: symbols.iter().map(|s| (s.clone(), 0)).collect(),
        };
        let current_holdings = HoldingsSnapshot {
            date: seed_date,
            market_values: symbols.iter().map(|s| (s.clone(), 0.0)).collect(),
            cash: config.initial_capital,
            commission: 0.0,
            total: config.initial_capital,
        };

        Ok(Self {
            symbols: symbols.to_vec(),
            all_positions: vec![current_positions.clone()],
            all_holdings: vec![current_holdings.clone()],
            current_positions,
            current_holdings,
            config,
        })
    }

    /// Valuation step.
    ///
    /// Market: mark to the latest released closes, then append one snapshot
    /// of each kind. Fill: re-mark the current state only. Other variants are
    /// ignored.
    pub fn update_timeindex(&mut self, event: &Event, feed: &MarketDataFeed) {
        match event {
            Event::Market(market) => {
                self.mark(market.date, feed);
                self.all_positions.push(self.current_positions.clone());
                self.all_holdings.push(self.current_holdings.clone());
            }
            Event::Fill(fill) => self.mark(fill.date, feed),
            Event::Signal(_) | Event::Order(_) => {}
        }
    }

    fn mark(&mut self, date: NaiveDate, feed: &MarketDataFeed) {
        let mut market_values = BTreeMap::new();
        for symbol in &self.symbols {
            let qty = self.current_positions.quantity(symbol);
            let value = if qty == 0 {
                0.0
            } else {
                match feed.latest_close(symbol) {
                    Some(close) => qty as f64 * close,
                    None => {
                        tracing::warn!(%symbol, %date, "no close to mark open position; keeping last value");
                        self.current_holdings.market_value(symbol)
                    }
                }
            };
            market_values.insert(symbol.clone(), value);
        }

        self.current_positions.date = date;
        self.current_holdings.date = date;
        self.current_holdings.total = self.current_holdings.cash + market_values.values().sum::<f64>();
        self.current_holdings.market_values = market_values;
    }

    /// Size a signal into an order.
    ///
    /// Long buys and Short sells `order_size` units. Exit closes whatever the
    /// symbol currently holds; a flat Exit produces nothing.
    pub fn update_signal(&self, signal: &SignalEvent) -> Option<OrderEvent> {
        if !self.current_positions.quantities.contains_key(&signal.symbol) {
            tracing::warn!(symbol = %signal.symbol, "signal for symbol outside the portfolio");
            return None;
        }
        let (direction, quantity) = match signal.kind {
            SignalKind::Long => (Direction::Buy, self.config.order_size),
            SignalKind::Short => (Direction::Sell, self.config.order_size),
            SignalKind::Exit => {
                let held = self.current_positions.quantity(&signal.symbol);
                if held == 0 {
                    return None;
                }
                let held_side = if held > 0 { Direction::Buy } else { Direction::Sell };
                (held_side.opposite(), held.unsigned_abs())
            }
        };
        Some(OrderEvent {
            symbol: signal.symbol.clone(),
            order_type: OrderType::Market,
            quantity,
            direction,
        })
    }

    /// Book a fill against positions, cash and cumulative commission.
    pub fn update_fill(&mut self, fill: &FillEvent, feed: &MarketDataFeed) -> Result<(), LedgerError> {
        if !self.current_positions.quantities.contains_key(&fill.symbol) {
            return Err(LedgerError::UnknownSymbol {
                symbol: fill.symbol.clone(),
            });
        }
        let price = match self.config.fill_pricing {
            FillPricing::LatestClose => feed.latest_close(&fill.symbol),
            FillPricing::FillEvent => Some(fill.fill_cost).filter(|p| p.is_finite()),
        }
        .ok_or_else(|| LedgerError::NoPrice {
            symbol: fill.symbol.clone(),
        })?;

        let sign = fill.direction.sign();
        let qty = fill.quantity as i64;
        if let Some(held) = self.current_positions.quantities.get_mut(&fill.symbol) {
            *held += sign * qty;
        }

        let cost = sign as f64 * price * fill.quantity as f64;
        self.current_holdings.cash -= cost + fill.commission;
        self.current_holdings.commission += fill.commission;

        tracing::debug!(
            symbol = %fill.symbol,
            direction = %fill.direction,
            quantity = fill.quantity,
            price,
            cash = self.current_holdings.cash,
            "fill booked"
        );
        Ok(())
    }

    /// Verify `total == cash + Σ market_value` on every recorded snapshot.
    pub fn reconcile(&self) -> Result<(), LedgerError> {
        for h in &self.all_holdings {
            let expected = h.cash + h.invested();
            if (h.total - expected).abs() > RECONCILE_TOLERANCE * expected.abs().max(1.0) {
                return Err(LedgerError::Unreconciled {
                    date: h.date,
                    total: h.total,
                    expected,
                });
            }
        }
        Ok(())
    }

    pub fn all_positions(&self) -> &[PositionSnapshot] {
        &self.all_positions
    }

    pub fn all_holdings(&self) -> &[HoldingsSnapshot] {
        &self.all_holdings
    }

    pub fn current_positions(&self) -> &PositionSnapshot {
        &self.current_positions
    }

    pub fn current_holdings(&self) -> &HoldingsSnapshot {
        &self.current_holdings
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Portfolio total at each snapshot.
    pub fn totals(&self) -> Vec<f64> {
        self.all_holdings.iter().map(|h| h.total).collect()
    }

    /// Period returns over the holdings history (first entry NaN).
    pub fn returns(&self) -> Vec<f64> {
        analytics::returns(&self.totals())
    }

    /// Unit equity curve over the holdings history.
    pub fn equity_curve(&self) -> Vec<f64> {
        analytics::equity_curve(&self.returns())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MemorySource, RawBar};
    use crate::domain::MarketEvent;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn raw(date: &str, px: f64) -> RawBar {
        RawBar {
            date: d(date),
            open: px,
            high: px,
            low: px,
            volume: 1_000,
            adj_close: px,
        }
    }

    fn feed() -> MarketDataFeed {
        let source = MemorySource::new()
            .with_series(
                "AAA",
                vec![raw("2024-01-02", 10.0), raw("2024-01-03", 12.0), raw("2024-01-04", 9.0)],
            )
            .with_series(
                "BBB",
                vec![raw("2024-01-02", 50.0), raw("2024-01-03", 50.0), raw("2024-01-04", 55.0)],
            );
        MarketDataFeed::load(&["AAA", "BBB"], &source).unwrap()
    }

    fn symbols() -> Vec<String> {
        vec!["AAA".into(), "BBB".into()]
    }

    fn ledger(pricing: FillPricing) -> Ledger {
        let config = LedgerConfig {
            initial_capital: 10_000.0,
            order_size: 10,
            fill_pricing: pricing,
        };
        Ledger::new(&symbols(), d("2024-01-01"), config).unwrap()
    }

    fn market(feed: &mut MarketDataFeed) -> Event {
        assert!(feed.advance());
        Event::Market(MarketEvent {
            date: feed.current_date().unwrap(),
        })
    }

    fn fill(symbol: &str, qty: u64, direction: Direction, price: f64, commission: f64) -> FillEvent {
        FillEvent {
            symbol: symbol.into(),
            date: d("2024-01-02"),
            venue: "ARCA".into(),
            quantity: qty,
            direction,
            fill_cost: price,
            commission,
        }
    }

    fn signal(symbol: &str, kind: SignalKind) -> SignalEvent {
        SignalEvent {
            symbol: symbol.into(),
            date: d("2024-01-02"),
            kind,
        }
    }

    #[test]
    fn seeded_with_cash_only() {
        let ledger = ledger(FillPricing::LatestClose);
        assert_eq!(ledger.all_holdings().len(), 1);
        assert_eq!(ledger.all_positions().len(), 1);
        let seed = &ledger.all_holdings()[0];
        assert_eq!(seed.date, d("2024-01-01"));
        assert_eq!(seed.cash, 10_000.0);
        assert_eq!(seed.total, 10_000.0);
        assert_eq!(ledger.current_positions().quantity("AAA"), 0);
    }

    #[test]
    fn rejects_bad_config() {
        let mut config = LedgerConfig::default();
        config.initial_capital = 0.0;
        assert!(matches!(
            Ledger::new(&symbols(), d("2024-01-01"), config.clone()),
            Err(LedgerError::InvalidCapital(_))
        ));
        config.initial_capital = 1.0;
        config.order_size = 0;
        assert_eq!(
            Ledger::new(&symbols(), d("2024-01-01"), config).unwrap_err(),
            LedgerError::ZeroOrderSize
        );
    }

    #[test]
    fn market_appends_one_snapshot_each() {
        let mut feed = feed();
        let mut ledger = ledger(FillPricing::LatestClose);
        for n in 1..=3 {
            let event = market(&mut feed);
            ledger.update_timeindex(&event, &feed);
            assert_eq!(ledger.all_positions().len(), n + 1);
            assert_eq!(ledger.all_holdings().len(), n + 1);
        }
        assert_eq!(ledger.all_holdings()[3].date, d("2024-01-04"));
    }

    #[test]
    fn fill_remarks_in_place_without_appending() {
        let mut feed = feed();
        let mut ledger = ledger(FillPricing::LatestClose);
        let event = market(&mut feed);
        ledger.update_timeindex(&event, &feed);

        let f = fill("AAA", 10, Direction::Buy, 10.0, 1.0);
        ledger.update_fill(&f, &feed).unwrap();
        ledger.update_timeindex(&Event::Fill(f), &feed);

        assert_eq!(ledger.all_holdings().len(), 2);
        // the appended snapshot predates the fill
        assert_eq!(ledger.all_holdings()[1].cash, 10_000.0);

        let now = ledger.current_holdings();
        assert_eq!(now.cash, 10_000.0 - 100.0 - 1.0);
        assert_eq!(now.commission, 1.0);
        assert_eq!(now.market_value("AAA"), 100.0);
        assert_eq!(now.total, 9_999.0);

        // next tick carries the fill, marked at the new close
        let event = market(&mut feed);
        ledger.update_timeindex(&event, &feed);
        let snap = &ledger.all_holdings()[2];
        assert_eq!(snap.market_value("AAA"), 120.0);
        assert_eq!(snap.total, 9_899.0 + 120.0);
        assert_eq!(ledger.all_positions()[2].quantity("AAA"), 10);
        ledger.reconcile().unwrap();
    }

    #[test]
    fn signal_sizing() {
        let mut feed = feed();
        let mut ledger = ledger(FillPricing::LatestClose);
        let long = ledger.update_signal(&signal("AAA", SignalKind::Long)).unwrap();
        assert_eq!((long.direction, long.quantity), (Direction::Buy, 10));
        let short = ledger.update_signal(&signal("AAA", SignalKind::Short)).unwrap();
        assert_eq!((short.direction, short.quantity), (Direction::Sell, 10));
        assert_eq!(short.order_type, OrderType::Market);

        // flat exit
        assert!(ledger.update_signal(&signal("AAA", SignalKind::Exit)).is_none());

        let event = market(&mut feed);
        ledger.update_timeindex(&event, &feed);
        ledger
            .update_fill(&fill("BBB", 30, Direction::Sell, 50.0, 0.0), &feed)
            .unwrap();
        let exit = ledger.update_signal(&signal("BBB", SignalKind::Exit)).unwrap();
        assert_eq!((exit.direction, exit.quantity), (Direction::Buy, 30));
        // other symbols are unaffected by BBB's position
        assert!(ledger.update_signal(&signal("AAA", SignalKind::Exit)).is_none());

        ledger
            .update_fill(&fill("AAA", 7, Direction::Buy, 10.0, 0.0), &feed)
            .unwrap();
        let exit = ledger.update_signal(&signal("AAA", SignalKind::Exit)).unwrap();
        assert_eq!((exit.direction, exit.quantity), (Direction::Sell, 7));
    }

    #[test]
    fn unknown_symbols() {
        let mut feed = feed();
        let mut ledger = ledger(FillPricing::LatestClose);
        assert!(ledger.update_signal(&signal("ZZZ", SignalKind::Long)).is_none());
        feed.advance();
        assert_eq!(
            ledger.update_fill(&fill("ZZZ", 1, Direction::Buy, 1.0, 0.0), &feed),
            Err(LedgerError::UnknownSymbol { symbol: "ZZZ".into() })
        );
    }

    #[test]
    fn fill_event_pricing_uses_reported_cost() {
        let mut feed = feed();
        let mut ledger = ledger(FillPricing::FillEvent);
        feed.advance();
        ledger
            .update_fill(&fill("AAA", 10, Direction::Buy, 11.5, 0.0), &feed)
            .unwrap();
        assert_eq!(ledger.current_holdings().cash, 10_000.0 - 115.0);
    }

    #[test]
    fn latest_close_pricing_needs_released_bar() {
        let feed = feed();
        let mut ledger = ledger(FillPricing::LatestClose);
        assert!(matches!(
            ledger.update_fill(&fill("AAA", 1, Direction::Buy, 10.0, 0.0), &feed),
            Err(LedgerError::NoPrice { .. })
        ));
    }

    #[test]
    fn equity_curve_follows_totals() {
        let mut feed = feed();
        let mut ledger = ledger(FillPricing::LatestClose);
        let event = market(&mut feed);
        ledger.update_timeindex(&event, &feed);
        ledger
            .update_fill(&fill("AAA", 100, Direction::Buy, 10.0, 0.0), &feed)
            .unwrap();
        for _ in 0..2 {
            let event = market(&mut feed);
            ledger.update_timeindex(&event, &feed);
        }
        let totals = ledger.totals();
        assert_eq!(totals, vec![10_000.0, 10_000.0, 10_200.0, 9_900.0]);
        let curve = ledger.equity_curve();
        for (c, t) in curve.iter().zip(&totals) {
            assert!((c - t / 10_000.0).abs() < 1e-12);
        }
        assert!(ledger.returns()[0].is_nan());
    }
}
