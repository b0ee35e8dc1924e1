//! Historical data access behind a trait. The replay engine only sees
//! batch iterators, row counts and range probes, so stores can be swapped
//! without touching the state machine.

use chrono::NaiveDateTime;
use thiserror::Error;

use tickforge_core::domain::{Bar, Product, Tick};

/// Errors surfaced by a historical store. String payloads keep the enum
/// cloneable across the producer thread boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("bad row {row} in {path}: {message}")]
    Parse {
        path: String,
        row: u64,
        message: String,
    },

    #[error("no rows in the requested range; available: {available}")]
    EmptyRange { available: String },

    #[error("replay cancelled")]
    Cancelled,
}

impl DataError {
    pub fn io(err: std::io::Error) -> Self {
        DataError::Io(err.to_string())
    }
}

pub type BatchIter<'a, T> = Box<dyn Iterator<Item = Result<Vec<T>, DataError>> + 'a>;

/// Read-side contract of a historical store. All ranges are half-open
/// `[start, end)` in exchange-local time; rows come back in time order.
pub trait HistoricalSource {
    fn count_ticks(
        &self,
        product: Product,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<u64, DataError>;

    fn count_bars(
        &self,
        product: Product,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<u64, DataError>;

    /// First and last tick timestamps on record, if any.
    fn tick_range(&self, product: Product)
        -> Result<Option<(NaiveDateTime, NaiveDateTime)>, DataError>;

    /// First and last 1-minute bar start timestamps on record, if any.
    fn bar_range(&self, product: Product)
        -> Result<Option<(NaiveDateTime, NaiveDateTime)>, DataError>;

    /// Earliest row timestamp inside `[start - preload_days, start)`, the
    /// natural point to begin indicator warm-up. `None` when the store
    /// has nothing there.
    fn find_preload_start(
        &self,
        product: Product,
        start: NaiveDateTime,
        preload_days: u32,
    ) -> Result<Option<NaiveDateTime>, DataError>;

    fn read_tick_batches(
        &self,
        product: Product,
        start: NaiveDateTime,
        end: NaiveDateTime,
        batch_size: usize,
    ) -> Result<BatchIter<'_, Tick>, DataError>;

    fn read_bar_batches(
        &self,
        product: Product,
        start: NaiveDateTime,
        end: NaiveDateTime,
        batch_size: usize,
    ) -> Result<BatchIter<'_, Bar>, DataError>;
}

/// Human-readable form of a range probe, for empty-range diagnostics.
pub fn describe_range(range: Option<(NaiveDateTime, NaiveDateTime)>) -> String {
    match range {
        Some((first, last)) => format!("{first} .. {last}"),
        None => "no data on record".to_string(),
    }
}
