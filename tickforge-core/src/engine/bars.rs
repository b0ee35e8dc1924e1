//! Bar aggregation. Ticks roll into 1-minute bars; 1-minute bars roll into
//! every registered N-minute period. An N-minute bar seals when its end
//! minute-of-day is a multiple of N, or at a market close boundary so the
//! last bar of a session never dangles.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;

use crate::calendar::ExchangeClock;
use crate::domain::Bar;

fn minute_floor(time: NaiveDateTime) -> NaiveDateTime {
    time.date()
        .and_hms_opt(time.hour(), time.minute(), 0)
        .unwrap_or(time)
}

fn minute_of_day(time: NaiveDateTime) -> u32 {
    time.hour() * 60 + time.minute()
}

#[derive(Debug, Clone)]
struct OpenBar {
    start: NaiveDateTime,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: u64,
}

impl OpenBar {
    fn begin(start: NaiveDateTime, price: Decimal, volume: u64) -> Self {
        Self {
            start,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    fn absorb(&mut self, price: Decimal, volume: u64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
        self.volume += volume;
    }

    fn from_bar(bar: &Bar) -> Self {
        Self {
            start: bar.start,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }

    fn merge_bar(&mut self, bar: &Bar) {
        self.high = self.high.max(bar.high);
        self.low = self.low.min(bar.low);
        self.close = bar.close;
        self.volume += bar.volume;
    }

    fn seal(self, end: NaiveDateTime) -> Bar {
        Bar {
            start: self.start,
            end,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BarAggregator {
    /// Registered N-minute periods above one minute, keyed by N.
    higher: BTreeMap<u32, Option<OpenBar>>,
    open_minute: Option<OpenBar>,
}

impl BarAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bar period. One-minute bars are always produced.
    pub fn register_period(&mut self, period_minutes: u32) {
        if period_minutes > 1 {
            self.higher.entry(period_minutes).or_insert(None);
        }
    }

    pub fn clear(&mut self) {
        for slot in self.higher.values_mut() {
            *slot = None;
        }
        self.open_minute = None;
    }

    /// Absorb one tick. Returns the sealed 1-minute bar when the tick
    /// opens a later minute.
    pub fn on_tick(&mut self, price: Decimal, volume: u64, time: NaiveDateTime) -> Option<Bar> {
        let minute = minute_floor(time);
        match &mut self.open_minute {
            Some(open) if open.start == minute => {
                open.absorb(price, volume);
                None
            }
            Some(open) if open.start < minute => {
                let end = open.start + chrono::Duration::minutes(1);
                let sealed = std::mem::replace(open, OpenBar::begin(minute, price, volume));
                Some(sealed.seal(end))
            }
            Some(_) => {
                // Out-of-order tick: fold into the open bar.
                if let Some(open) = &mut self.open_minute {
                    open.absorb(price, volume);
                }
                None
            }
            None => {
                self.open_minute = Some(OpenBar::begin(minute, price, volume));
                None
            }
        }
    }

    /// Seal the open 1-minute bar if `time` has moved past it. Driven by
    /// heartbeats so a quiet minute still closes its bar.
    pub fn flush_minute_before(&mut self, time: NaiveDateTime) -> Option<Bar> {
        let minute = minute_floor(time);
        match &self.open_minute {
            Some(open) if open.start < minute => {
                let open = self.open_minute.take()?;
                let end = open.start + chrono::Duration::minutes(1);
                Some(open.seal(end))
            }
            _ => None,
        }
    }

    /// Fold one sealed 1-minute bar into every registered higher period.
    /// Returns the higher-period bars sealed by it, in period order.
    pub fn on_minute_bar(&mut self, bar: &Bar, clock: &impl ExchangeClock) -> Vec<(u32, Bar)> {
        let mut sealed = Vec::new();
        let at_close = clock.is_market_close_time(bar.end);
        for (&period, slot) in self.higher.iter_mut() {
            match slot {
                Some(open) => open.merge_bar(bar),
                None => *slot = Some(OpenBar::from_bar(bar)),
            }
            let aligned = minute_of_day(bar.end) % period == 0;
            if aligned || at_close {
                if let Some(open) = slot.take() {
                    sealed.push((period, open.seal(bar.end)));
                }
            }
        }
        sealed
    }
}
