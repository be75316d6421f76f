//! Buy-and-hold benchmark: go long every symbol once, never exit.

use super::Strategy;
use crate::data::MarketDataFeed;
use crate::domain::{MarketEvent, SignalEvent, SignalKind};
use std::collections::HashSet;

/// Emits one `Long` per symbol on the first market event where that symbol
/// has a real (non-void) bar.
#[derive(Debug, Clone, Default)]
pub struct BuyAndHold {
    bought: HashSet<String>,
}

impl BuyAndHold {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn calculate_signals(&mut self, _market: &MarketEvent, feed: &MarketDataFeed) -> Vec<SignalEvent> {
        let mut signals = Vec::new();
        for symbol in feed.symbols() {
            if self.bought.contains(symbol) {
                continue;
            }
            let Some(bar) = feed.latest_bar(symbol) else {
                continue;
            };
            if bar.is_void() {
                continue;
            }
            signals.push(SignalEvent {
                symbol: symbol.clone(),
                date: bar.date,
                kind: SignalKind::Long,
            });
            self.bought.insert(symbol.clone());
        }
        signals
    }
}
