//! Domain types for tickreplay

pub mod bar;
pub mod event;
pub mod snapshot;

pub use bar::Bar;
pub use event::{
    Direction, Event, FillEvent, MarketEvent, OrderEvent, OrderType, SignalEvent, SignalKind,
};
pub use snapshot::{HoldingsSnapshot, PositionSnapshot};
