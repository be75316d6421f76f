//! The event model: a closed set of variants flowing through the dispatch queue.
//!
//! Every transition in a tick is one of these. `Market` announces that the feed
//! released a bar per symbol; `Signal` is the strategy's advice; `Order` is the
//! ledger's decision; `Fill` is the broker's confirmation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Advice emitted by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Long,
    Short,
    Exit,
}

/// Trade direction for orders and fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> i64 {
        match self {
            Direction::Buy => 1,
            Direction::Sell => -1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type. The simulated broker only ever sees market orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
}

/// New bars were released for every symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Calendar date of the bars just released.
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    /// Date of the bar the signal was computed from.
    pub date: NaiveDate,
    pub kind: SignalKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub symbol: String,
    pub order_type: OrderType,
    pub quantity: u64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub symbol: String,
    pub date: NaiveDate,
    pub venue: String,
    pub quantity: u64,
    pub direction: Direction,
    /// Per-unit price reported by the broker.
    pub fill_cost: f64,
    pub commission: f64,
}

/// Anything that can sit on the dispatch queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    Market(MarketEvent),
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
}

impl Event {
    /// Short variant name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Market(_) => "market",
            Event::Signal(_) => "signal",
            Event::Order(_) => "order",
            Event::Fill(_) => "fill",
        }
    }

    /// Date the event refers to. Orders are undated: they inherit the tick.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Event::Market(m) => Some(m.date),
            Event::Signal(s) => Some(s.date),
            Event::Order(_) => None,
            Event::Fill(f) => Some(f.date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_sign_and_opposite() {
        assert_eq!(Direction::Buy.sign(), 1);
        assert_eq!(Direction::Sell.sign(), -1);
        assert_eq!(Direction::Buy.opposite(), Direction::Sell);
        assert_eq!(Direction::Sell.opposite(), Direction::Buy);
    }

    #[test]
    fn orders_are_undated() {
        let order = Event::Order(OrderEvent {
            symbol: "CVX".into(),
            order_type: OrderType::Market,
            quantity: 100,
            direction: Direction::Buy,
        });
        assert_eq!(order.date(), None);
        assert_eq!(order.name(), "order");
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = Event::Signal(SignalEvent {
            symbol: "AAPL".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            kind: SignalKind::Long,
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Signal\""));
        assert!(json.contains("\"kind\":\"LONG\""));
    }
}
