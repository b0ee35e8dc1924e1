//! BBIBOLL: a Bollinger-style channel whose midline is the BBI, the mean of
//! four moving averages of close. Band width is `k` standard deviations of
//! close over the band period. Produces a value from the first close on;
//! window means use however many samples are present.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use super::ring::LookbackRing;
use super::IndicatorError;

/// One completed channel observation. `bbi` and `mid` are the same number
/// today; both are kept so a future divergence stays a local change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandValue {
    pub bbi: Decimal,
    pub mid: Decimal,
    pub upper: Decimal,
    pub lower: Decimal,
}

#[derive(Debug, Clone, Default)]
struct RollingMean {
    period: usize,
    window: VecDeque<Decimal>,
    sum: Decimal,
}

impl RollingMean {
    fn set_period(&mut self, period: usize) {
        self.period = period.max(1);
        self.window.clear();
        self.sum = Decimal::ZERO;
    }

    fn update(&mut self, input: Decimal) -> Decimal {
        self.window.push_back(input);
        self.sum += input;
        if self.window.len() > self.period {
            if let Some(removed) = self.window.pop_front() {
                self.sum -= removed;
            }
        }
        self.sum / Decimal::from(self.window.len() as u64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BbiBoll {
    legs: [RollingMean; 4],
    band_period: usize,
    band_width: Decimal,
    configured: bool,
    closes: VecDeque<Decimal>,
    close_sum: Decimal,
    close_sum_sq: Decimal,
    value: BandValue,
    seen: bool,
    ring: LookbackRing<BandValue>,
}

impl BbiBoll {
    /// Channel with the standard leg periods 13/56/89/144, band period 14
    /// and one standard deviation of width.
    pub fn new() -> Self {
        let mut this = Self::default();
        this.set_parameter([13, 56, 89, 144], 14, Decimal::ONE);
        this
    }

    /// Configure leg and band periods (clamped to 1) and band width
    /// (clamped to 0), then reset.
    pub fn set_parameter(&mut self, leg_periods: [usize; 4], band_period: usize, width: Decimal) {
        for (leg, period) in self.legs.iter_mut().zip(leg_periods) {
            leg.set_period(period);
        }
        self.band_period = band_period.max(1);
        self.band_width = width.max(Decimal::ZERO);
        self.configured = true;
        self.reset();
    }

    pub fn reset(&mut self) {
        for leg in &mut self.legs {
            let p = leg.period;
            leg.set_period(p);
        }
        self.closes.clear();
        self.close_sum = Decimal::ZERO;
        self.close_sum_sq = Decimal::ZERO;
        self.value = BandValue::default();
        self.seen = false;
        self.ring.clear();
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn has_value(&self) -> bool {
        self.configured && self.seen
    }

    pub fn mid(&self) -> Decimal {
        self.value.mid
    }

    pub fn upper(&self) -> Decimal {
        self.value.upper
    }

    pub fn lower(&self) -> Decimal {
        self.value.lower
    }

    pub fn current_value(&self) -> Option<BandValue> {
        self.has_value().then_some(self.value)
    }

    pub fn update(&mut self, close: Decimal) {
        if !self.configured {
            return;
        }

        let mut leg_sum = Decimal::ZERO;
        for leg in &mut self.legs {
            leg_sum += leg.update(close);
        }
        let mid = leg_sum / Decimal::from(4u32);

        self.closes.push_back(close);
        self.close_sum += close;
        self.close_sum_sq += close * close;
        if self.closes.len() > self.band_period {
            if let Some(removed) = self.closes.pop_front() {
                self.close_sum -= removed;
                self.close_sum_sq -= removed * removed;
            }
        }

        let n = Decimal::from(self.closes.len() as u64);
        let mean = self.close_sum / n;
        let variance = (self.close_sum_sq / n - mean * mean).max(Decimal::ZERO);
        let std = decimal_sqrt(variance);

        self.value = BandValue {
            bbi: mid,
            mid,
            upper: mid + self.band_width * std,
            lower: mid - self.band_width * std,
        };
        self.seen = true;
        self.ring.push(self.value);
    }

    pub fn value_at(&self, index: usize) -> Result<BandValue, IndicatorError> {
        if !self.configured {
            return Err(IndicatorError::NotConfigured);
        }
        self.ring.get(index).ok_or(IndicatorError::LookbackOutOfRange {
            index,
            populated: self.ring.len(),
        })
    }
}

/// Square root through f64; band widths do not need exact decimal roots.
fn decimal_sqrt(value: Decimal) -> Decimal {
    use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
    let f = value.to_f64().unwrap_or(0.0).max(0.0);
    Decimal::from_f64(f.sqrt()).unwrap_or(Decimal::ZERO)
}
