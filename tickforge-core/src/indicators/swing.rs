//! Swing pivot detector. Tracks running extremes of the bar stream and
//! confirms a peak (A) after an ATR-scaled impulse up followed by a retrace
//! down, or a valley (V) after the mirror pattern. Thresholds are
//! `max(3 * ATR, 30)` for the impulse leg and `max(2 * ATR, 30)` for the
//! retrace, with a Wilder-smoothed ATR(14) seeded from the first bar's
//! range. Confirmation flips the tracker into seeking the opposite pivot.

use rust_decimal::Decimal;

use super::ring::LookbackRing;
use super::IndicatorError;

const ATR_PERIOD: u32 = 14;
const IMPULSE_MULT: u32 = 3;
const RETRACE_MULT: u32 = 2;
const MIN_THRESHOLD: u32 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum TrackMode {
    #[default]
    Both,
    SeekHigh,
    SeekLow,
}

/// Which pivot, if any, was confirmed by the latest bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PivotEvent {
    #[default]
    None,
    Peak,
    Valley,
}

/// One completed observation: latest confirmed pivot prices plus the event
/// flag for that bar. Unconfirmed pivots read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwingValue {
    pub peak: Decimal,
    pub valley: Decimal,
    pub event: PivotEvent,
}

#[derive(Debug, Clone, Default)]
pub struct SwingPivots {
    initialized: bool,
    prev_close: Decimal,
    atr: Decimal,
    mode: TrackMode,
    high: Decimal,
    high_seq: u64,
    low: Decimal,
    low_seq: u64,
    seq: u64,
    value: SwingValue,
    ring: LookbackRing<SwingValue>,
}

impl SwingPivots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn has_value(&self) -> bool {
        !self.ring.is_empty()
    }

    pub fn peak(&self) -> Decimal {
        self.value.peak
    }

    pub fn valley(&self) -> Decimal {
        self.value.valley
    }

    pub fn event(&self) -> PivotEvent {
        self.value.event
    }

    pub fn current_value(&self) -> Option<SwingValue> {
        self.has_value().then_some(self.value)
    }

    pub fn update(&mut self, high: Decimal, low: Decimal, close: Decimal) {
        self.seq += 1;

        let tr = if self.initialized {
            let hl = high - low;
            let hc = (high - self.prev_close).abs();
            let lc = (low - self.prev_close).abs();
            hl.max(hc).max(lc)
        } else {
            high - low
        };
        let n = Decimal::from(ATR_PERIOD);
        self.atr = if self.initialized {
            (self.atr * (n - Decimal::ONE) + tr) / n
        } else {
            tr
        };

        let floor = Decimal::from(MIN_THRESHOLD);
        let impulse = (self.atr * Decimal::from(IMPULSE_MULT)).max(floor);
        let retrace = (self.atr * Decimal::from(RETRACE_MULT)).max(floor);

        self.value.event = PivotEvent::None;

        if !self.initialized {
            self.initialized = true;
            self.high = high;
            self.low = low;
            self.high_seq = self.seq;
            self.low_seq = self.seq;
            self.mode = TrackMode::Both;
        } else {
            match self.mode {
                TrackMode::Both => {
                    if high >= self.high {
                        self.high = high;
                        self.high_seq = self.seq;
                    }
                    if low <= self.low {
                        self.low = low;
                        self.low_seq = self.seq;
                    }

                    let spread = self.high - self.low;
                    let peak_trig = self.low_seq < self.high_seq
                        && spread >= impulse
                        && (self.high - low) >= retrace;
                    let valley_trig = self.high_seq < self.low_seq
                        && spread >= impulse
                        && (high - self.low) >= retrace;

                    if peak_trig && valley_trig {
                        // Resolve by whichever extreme came first.
                        if self.high_seq <= self.low_seq {
                            self.confirm_peak(low);
                        } else {
                            self.confirm_valley(high);
                        }
                    } else if peak_trig {
                        self.confirm_peak(low);
                    } else if valley_trig {
                        self.confirm_valley(high);
                    }
                }
                TrackMode::SeekHigh => {
                    if low <= self.low {
                        self.low = low;
                        self.low_seq = self.seq;
                    }
                    if high >= self.high {
                        self.high = high;
                        self.high_seq = self.seq;
                    }
                    if (self.high - self.low) >= impulse && (self.high - low) >= retrace {
                        self.confirm_peak(low);
                    }
                }
                TrackMode::SeekLow => {
                    if high >= self.high {
                        self.high = high;
                        self.high_seq = self.seq;
                    }
                    if low <= self.low {
                        self.low = low;
                        self.low_seq = self.seq;
                    }
                    if (self.high - self.low) >= impulse && (high - self.low) >= retrace {
                        self.confirm_valley(high);
                    }
                }
            }
        }

        self.prev_close = close;
        self.ring.push(self.value);
    }

    fn confirm_peak(&mut self, bar_low: Decimal) {
        self.value.peak = self.high;
        self.value.event = PivotEvent::Peak;
        self.mode = TrackMode::SeekLow;
        self.low = bar_low;
        self.low_seq = self.seq;
    }

    fn confirm_valley(&mut self, bar_high: Decimal) {
        self.value.valley = self.low;
        self.value.event = PivotEvent::Valley;
        self.mode = TrackMode::SeekHigh;
        self.high = bar_high;
        self.high_seq = self.seq;
    }

    pub fn value_at(&self, index: usize) -> Result<SwingValue, IndicatorError> {
        self.ring.get(index).ok_or(IndicatorError::LookbackOutOfRange {
            index,
            populated: self.ring.len(),
        })
    }
}
