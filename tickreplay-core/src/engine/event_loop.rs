use super::{LoopState, RunCounters, SimulationConfig, SimulationError, SimulationOutcome};
use crate::analytics::PerformanceReport;
use crate::data::MarketDataFeed;
use crate::domain::{Event, FillEvent, MarketEvent, OrderEvent, SignalEvent};
use crate::execution::ExecutionHandler;
use crate::ledger::Ledger;
use crate::strategy::Strategy;
use std::collections::VecDeque;

/// One backtest: the feed, the ledger, both collaborators and the queue.
pub struct Simulation {
    feed: MarketDataFeed,
    ledger: Ledger,
    strategy: Box<dyn Strategy>,
    execution: Box<dyn ExecutionHandler>,
    queue: VecDeque<Event>,
    state: LoopState,
    config: SimulationConfig,
    counters: RunCounters,
}

impl Simulation {
    pub fn new(
        feed: MarketDataFeed,
        ledger: Ledger,
        strategy: Box<dyn Strategy>,
        execution: Box<dyn ExecutionHandler>,
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        if feed.symbols() != ledger.symbols() {
            return Err(SimulationError::SymbolMismatch {
                feed: feed.symbols().to_vec(),
                ledger: ledger.symbols().to_vec(),
            });
        }
        if feed.released_len() > 0 {
            return Err(SimulationError::FeedAlreadyStarted);
        }
        Ok(Self {
            feed,
            ledger,
            strategy,
            execution,
            queue: VecDeque::new(),
            state: LoopState::Running,
            config,
            counters: RunCounters::default(),
        })
    }

    /// Drive exactly one transition.
    ///
    /// Running: ask the feed for the next tick and enqueue its Market event,
    /// or become Exhausted. Draining: dispatch one queued event, or return to
    /// Running once the queue is empty. Exhausted is terminal.
    pub fn step(&mut self) -> Result<LoopState, SimulationError> {
        match self.state {
            LoopState::Running => {
                if self.feed.advance() {
                    if let Some(date) = self.feed.current_date() {
                        self.counters.ticks += 1;
                        self.queue.push_back(Event::Market(MarketEvent { date }));
                    }
                    self.state = LoopState::Draining;
                } else {
                    self.state = LoopState::Exhausted;
                }
            }
            LoopState::Draining => match self.queue.pop_front() {
                Some(event) => self.dispatch(event)?,
                None => {
                    self.state = LoopState::Running;
                    if let Some(pause) = self.config.pacing {
                        std::thread::sleep(pause);
                    }
                }
            },
            LoopState::Exhausted => {}
        }
        Ok(self.state)
    }

    /// Run to exhaustion and compute the report once.
    pub fn run(mut self) -> Result<SimulationOutcome, SimulationError> {
        tracing::info!(
            strategy = self.strategy.name(),
            symbols = self.feed.symbols().len(),
            calendar = self.feed.calendar().len(),
            "simulation started"
        );
        while self.step()? != LoopState::Exhausted {}

        self.ledger.reconcile()?;
        let report =
            PerformanceReport::from_totals(&self.ledger.totals(), self.config.periods_per_year);

        tracing::info!(
            ticks = self.counters.ticks,
            signals = self.counters.signals,
            orders = self.counters.orders,
            fills = self.counters.fills,
            dropped = self.counters.dropped,
            total_return_pct = report.total_return_pct,
            "simulation finished"
        );

        Ok(SimulationOutcome {
            report,
            ledger: self.ledger,
            counters: self.counters,
        })
    }

    fn dispatch(&mut self, event: Event) -> Result<(), SimulationError> {
        tracing::debug!(kind = event.name(), date = ?event.date(), "dispatch");
        match &event {
            Event::Market(market) => self.on_market(&event, market),
            Event::Signal(signal) => self.on_signal(signal),
            Event::Order(order) => self.on_order(order),
            Event::Fill(fill) => self.on_fill(&event, fill)?,
        }
        Ok(())
    }

    fn on_market(&mut self, event: &Event, market: &MarketEvent) {
        self.ledger.update_timeindex(event, &self.feed);
        let signals = self.strategy.calculate_signals(market, &self.feed);
        self.counters.signals += signals.len();
        self.queue.extend(signals.into_iter().map(Event::Signal));
    }

    fn on_signal(&mut self, signal: &SignalEvent) {
        if !self.feed.contains(&signal.symbol) {
            tracing::warn!(symbol = %signal.symbol, "dropping signal for unknown symbol");
            self.counters.dropped += 1;
            return;
        }
        if self.feed.current_date().map_or(true, |now| signal.date > now) {
            tracing::warn!(
                symbol = %signal.symbol,
                signal_date = %signal.date,
                now = ?self.feed.current_date(),
                "dropping signal dated after the current tick"
            );
            self.counters.dropped += 1;
            return;
        }
        match self.ledger.update_signal(signal) {
            Some(order) => {
                self.counters.orders += 1;
                self.queue.push_back(Event::Order(order));
            }
            None => tracing::debug!(symbol = %signal.symbol, kind = ?signal.kind, "signal produced no order"),
        }
    }

    fn on_order(&mut self, order: &OrderEvent) {
        if order.quantity == 0 {
            tracing::warn!(symbol = %order.symbol, "dropping zero-quantity order");
            self.counters.dropped += 1;
            return;
        }
        match self.execution.execute_order(order, &self.feed) {
            Ok(fill) => self.queue.push_back(Event::Fill(fill)),
            Err(err) => {
                tracing::warn!(symbol = %order.symbol, error = %err, "dropping unfillable order");
                self.counters.dropped += 1;
            }
        }
    }

    fn on_fill(&mut self, event: &Event, fill: &FillEvent) -> Result<(), SimulationError> {
        self.ledger.update_fill(fill, &self.feed)?;
        self.counters.fills += 1;
        self.ledger.update_timeindex(event, &self.feed);
        Ok(())
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn feed(&self) -> &MarketDataFeed {
        &self.feed
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    /// Events waiting in the current tick.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Push an event from outside the loop (used to inject faults in tests
    /// and by callers replaying recorded signals).
    pub fn enqueue(&mut self, event: Event) {
        self.queue.push_back(event);
    }
}
