//! Historical replay for the strategy engine.
//!
//! A replay streams stored ticks (or 1-minute bars) through the same
//! event surface the live feed uses, so a backtest exercises the exact
//! signal path. The pieces:
//!
//! - [`source`]: the [`HistoricalSource`] trait over a tick/bar store,
//!   plus the CSV-backed implementation.
//! - [`queue`]: bounded producer/consumer queue with cancellation.
//! - [`config`]: serializable run configuration with a content hash id.
//! - [`engine`]: the replay state machine and its final report.

pub mod config;
pub mod csv_source;
pub mod engine;
pub mod queue;
pub mod source;

pub use config::{ReplayConfig, ReplayMode, RunId};
pub use csv_source::CsvHistoricalSource;
pub use engine::{ReplayEngine, ReplayHandle, ReplayReport, ReplayState};
pub use queue::{CancelToken, EventQueue};
pub use source::{DataError, HistoricalSource};
