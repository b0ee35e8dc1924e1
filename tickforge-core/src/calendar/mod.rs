//! Exchange schedule: trait, concrete Taiwan futures clock, and the CSV
//! holiday calendar underneath it.

use chrono::{NaiveDate, NaiveDateTime};

pub mod futures_clock;
pub mod trading_calendar;

pub use futures_clock::{
    in_wrapping_window, FuturesClock, DAY_CLOSE, DAY_OPEN, NIGHT_CLOSE, NIGHT_OPEN,
};
pub use trading_calendar::{CalendarError, TradingCalendar};

/// Minute-granular market schedule oracle.
pub trait ExchangeClock {
    fn is_market_open(&self, time: NaiveDateTime) -> bool;
    /// Open AND inside a configured trading window.
    fn can_trade(&self, time: NaiveDateTime) -> bool;
    /// Minute boundary at which open bars seal.
    fn should_seal_now(&self, time: NaiveDateTime) -> bool;
    fn is_market_open_time(&self, time: NaiveDateTime) -> bool;
    fn is_market_close_time(&self, time: NaiveDateTime) -> bool;
    fn is_trading_day(&self, date: NaiveDate) -> bool;
    fn consecutive_closed_days_after(&self, date: NaiveDate) -> u32;
    /// The trading day `time` belongs to is followed by two or more
    /// closed days.
    fn is_long_holiday_eve(&self, time: NaiveDateTime) -> bool;
}
