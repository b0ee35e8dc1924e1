//! Event-driven strategy engine: bar aggregation and the manager that
//! wires quotes, indicators, triggers and exits together.

pub mod bars;
pub mod manager;

pub use bars::BarAggregator;
pub use manager::{clock_for, SignalKind, SignalRecord, StrategyEngine};
