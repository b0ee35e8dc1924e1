//! Taiwan index futures trading schedule. Three daily segments at minute
//! granularity: the tail of the night session (before 05:00), the day
//! session (08:45-13:45) and the start of the night session (from 15:00).
//! Monday has no early segment, Saturday only the early one. The holiday
//! calendar overlays the weekday grid; the early segment belongs to the
//! previous calendar day's trading day.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};

use super::trading_calendar::TradingCalendar;
use super::ExchangeClock;

pub const NIGHT_CLOSE: NaiveTime = match NaiveTime::from_hms_opt(5, 0, 0) {
    Some(t) => t,
    None => unreachable!(),
};
pub const DAY_OPEN: NaiveTime = match NaiveTime::from_hms_opt(8, 45, 0) {
    Some(t) => t,
    None => unreachable!(),
};
pub const DAY_CLOSE: NaiveTime = match NaiveTime::from_hms_opt(13, 45, 0) {
    Some(t) => t,
    None => unreachable!(),
};
pub const NIGHT_OPEN: NaiveTime = match NaiveTime::from_hms_opt(15, 0, 0) {
    Some(t) => t,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Closed,
    NightTail,
    Day,
    NightHead,
}

fn segment_of(t: NaiveTime) -> Segment {
    if t < NIGHT_CLOSE {
        Segment::NightTail
    } else if t >= DAY_OPEN && t <= DAY_CLOSE {
        Segment::Day
    } else if t >= NIGHT_OPEN {
        Segment::NightHead
    } else {
        Segment::Closed
    }
}

fn weekday_allows(weekday: Weekday, segment: Segment) -> bool {
    match segment {
        Segment::Closed => false,
        Segment::NightTail => !matches!(weekday, Weekday::Mon | Weekday::Sun),
        Segment::Day | Segment::NightHead => {
            !matches!(weekday, Weekday::Sat | Weekday::Sun)
        }
    }
}

/// True when `t` lies in the window `[start, end)`, wrapping across
/// midnight when `start > end`. A degenerate window (`start == end`)
/// contains everything.
pub fn in_wrapping_window(t: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start == end {
        true
    } else if start < end {
        t >= start && t < end
    } else {
        t >= start || t < end
    }
}

#[derive(Debug, Clone, Default)]
pub struct FuturesClock {
    calendar: TradingCalendar,
    trading_windows: Vec<(NaiveTime, NaiveTime)>,
}

impl FuturesClock {
    pub fn new(calendar: TradingCalendar) -> Self {
        Self {
            calendar,
            trading_windows: Vec::new(),
        }
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    pub fn add_trading_window(&mut self, start: NaiveTime, end: NaiveTime) {
        self.trading_windows.push((start, end));
    }

    pub fn clear_trading_windows(&mut self) {
        self.trading_windows.clear();
    }

    fn truncate_to_minute(time: NaiveDateTime) -> NaiveDateTime {
        time.date()
            .and_hms_opt(time.hour(), time.minute(), 0)
            .unwrap_or(time)
    }

    /// Trading day a timestamp belongs to: the early segment counts toward
    /// the previous calendar day.
    pub fn trading_day_of(time: NaiveDateTime) -> chrono::NaiveDate {
        if time.time() < NIGHT_CLOSE {
            time.date().pred_opt().unwrap_or_else(|| time.date())
        } else {
            time.date()
        }
    }

}

impl ExchangeClock for FuturesClock {
    fn is_market_open(&self, time: NaiveDateTime) -> bool {
        let time = Self::truncate_to_minute(time);
        let segment = segment_of(time.time());
        if segment == Segment::Closed || !weekday_allows(time.weekday(), segment) {
            return false;
        }

        match segment {
            Segment::NightTail => self
                .calendar
                .is_trading_day(time.date().pred_opt().unwrap_or_else(|| time.date())),
            _ => self.calendar.is_trading_day(time.date()),
        }
    }

    fn can_trade(&self, time: NaiveDateTime) -> bool {
        if self.trading_windows.is_empty() || !self.is_market_open(time) {
            return false;
        }
        let t = Self::truncate_to_minute(time).time();
        self.trading_windows
            .iter()
            .any(|&(start, end)| in_wrapping_window(t, start, end))
    }

    fn is_market_close_time(&self, time: NaiveDateTime) -> bool {
        let t = Self::truncate_to_minute(time).time();
        t == NIGHT_CLOSE || t == DAY_CLOSE
    }

    fn is_market_open_time(&self, time: NaiveDateTime) -> bool {
        let time = Self::truncate_to_minute(time);
        let t = time.time();
        (t == DAY_OPEN || t == NIGHT_OPEN) && self.is_market_open(time)
    }

    fn should_seal_now(&self, time: NaiveDateTime) -> bool {
        if time.second() != 0 {
            return false;
        }
        let time = Self::truncate_to_minute(time);

        if self.is_market_close_time(time) {
            return self.is_market_open(time - chrono::Duration::minutes(1));
        }
        if !self.is_market_open(time) {
            return false;
        }
        !self.is_market_open_time(time)
    }

    fn is_trading_day(&self, date: chrono::NaiveDate) -> bool {
        self.calendar.is_trading_day(date)
    }

    fn consecutive_closed_days_after(&self, date: chrono::NaiveDate) -> u32 {
        self.calendar.consecutive_closed_days_after(date)
    }

    fn is_long_holiday_eve(&self, time: NaiveDateTime) -> bool {
        self.calendar
            .consecutive_closed_days_after(Self::trading_day_of(time))
            >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn clock() -> FuturesClock {
        FuturesClock::new(TradingCalendar::empty())
    }

    // 2024-03-04 is a Monday.

    #[test]
    fn day_session_bounds() {
        let c = clock();
        assert!(!c.is_market_open(at(2024, 3, 4, 8, 44)));
        assert!(c.is_market_open(at(2024, 3, 4, 8, 45)));
        assert!(c.is_market_open(at(2024, 3, 4, 13, 45)));
        assert!(!c.is_market_open(at(2024, 3, 4, 13, 46)));
    }

    #[test]
    fn monday_has_no_early_segment() {
        let c = clock();
        assert!(!c.is_market_open(at(2024, 3, 4, 3, 0))); // Monday
        assert!(c.is_market_open(at(2024, 3, 5, 3, 0))); // Tuesday
    }

    #[test]
    fn saturday_has_only_the_early_segment() {
        let c = clock();
        assert!(c.is_market_open(at(2024, 3, 9, 4, 59)));
        assert!(!c.is_market_open(at(2024, 3, 9, 10, 0)));
        assert!(!c.is_market_open(at(2024, 3, 9, 16, 0)));
    }

    #[test]
    fn holiday_closes_day_and_night() {
        let mut cal = TradingCalendar::empty();
        cal.add_holiday(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()); // Wednesday
        let c = FuturesClock::new(cal);
        assert!(!c.is_market_open(at(2024, 3, 6, 10, 0)));
        assert!(!c.is_market_open(at(2024, 3, 6, 16, 0)));
        // Thursday early segment checks Wednesday's calendar entry.
        assert!(!c.is_market_open(at(2024, 3, 7, 3, 0)));
        assert!(c.is_market_open(at(2024, 3, 7, 10, 0)));
    }

    #[test]
    fn seal_at_minute_boundaries_only() {
        let c = clock();
        assert!(c.should_seal_now(at(2024, 3, 4, 9, 1)));
        // Opening minute does not seal.
        assert!(!c.should_seal_now(at(2024, 3, 4, 8, 45)));
        // Close boundary seals when the previous minute traded.
        assert!(c.should_seal_now(at(2024, 3, 4, 13, 45)));
        assert!(!c.should_seal_now(at(2024, 3, 4, 14, 0)));
    }

    #[test]
    fn can_trade_needs_a_window() {
        let mut c = clock();
        assert!(!c.can_trade(at(2024, 3, 4, 9, 0)));
        c.add_trading_window(
            NaiveTime::from_hms_opt(8, 45, 0).unwrap(),
            NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
        );
        assert!(c.can_trade(at(2024, 3, 4, 9, 0)));
        assert!(!c.can_trade(at(2024, 3, 4, 13, 30)));
    }

    #[test]
    fn wrapping_window_crosses_midnight() {
        let start = NaiveTime::from_hms_opt(15, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
        assert!(in_wrapping_window(NaiveTime::from_hms_opt(23, 0, 0).unwrap(), start, end));
        assert!(in_wrapping_window(NaiveTime::from_hms_opt(1, 30, 0).unwrap(), start, end));
        assert!(!in_wrapping_window(NaiveTime::from_hms_opt(10, 0, 0).unwrap(), start, end));
    }

    #[test]
    fn long_holiday_eve_detection() {
        let mut cal = TradingCalendar::empty();
        cal.add_holiday(NaiveDate::from_ymd_opt(2024, 4, 4).unwrap()); // Thursday
        cal.add_holiday(NaiveDate::from_ymd_opt(2024, 4, 5).unwrap()); // Friday
        let c = FuturesClock::new(cal);
        // Wednesday night session (Thursday 03:00 belongs to Wednesday).
        assert!(c.is_long_holiday_eve(at(2024, 4, 4, 3, 0)));
        // A regular weekday night is not an eve.
        assert!(!c.is_long_holiday_eve(at(2024, 4, 2, 3, 0)));
        // Friday trading day precedes a plain weekend: two closed days.
        assert!(c.is_long_holiday_eve(at(2024, 3, 8, 16, 0)));
    }
}
