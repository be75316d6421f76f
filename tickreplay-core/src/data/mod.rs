//! Data loading, calendar alignment and the drip-feed.

pub mod align;
pub mod csv_source;
pub mod feed;
pub mod provider;

pub use align::{align_symbols, AlignedData};
pub use csv_source::CsvSource;
pub use feed::MarketDataFeed;
pub use provider::{BarSource, DataError, MemorySource, RawBar};
