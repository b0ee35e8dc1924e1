//! TickForge Core — futures strategy engine for event-driven backtests.
//!
//! This crate contains the heart of the system:
//! - Domain types (bars, ticks, quote updates, products, sides)
//! - Streaming indicators with fixed-depth lookback rings
//! - Entry trigger state machines and the trend-mode router
//! - The nine-rule exit chain
//! - Session accounting with netted positions and stop reversal
//! - The exchange clock for the Taiwan futures schedule
//! - The strategy engine that wires the event stream together

pub mod calendar;
pub mod domain;
pub mod engine;
pub mod exits;
pub mod indicators;
pub mod session;
pub mod triggers;
