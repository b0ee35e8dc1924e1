//! Stochastic oscillator (K/D/J) with recursive smoothing.
//!
//! RSV = (close - lowest_low) / (highest_high - lowest_low) * 100 over the
//! RSV window. K and D smooth recursively from zero seeds:
//! `K = (K_prev * (k_period - 1) + RSV) / k_period`, D analogous from K,
//! J = 3K - 2D. A degenerate window (highest == lowest) leaves K/D/J and
//! the lookback ring untouched for that update.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use super::ring::LookbackRing;
use super::IndicatorError;

/// One completed K/D observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KdValue {
    pub k: Decimal,
    pub d: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct Kdj {
    k_period: usize,
    d_period: usize,
    rsv_period: usize,
    configured: bool,
    highs: VecDeque<Decimal>,
    lows: VecDeque<Decimal>,
    k: Decimal,
    d: Decimal,
    j: Decimal,
    ring: LookbackRing<KdValue>,
}

impl Kdj {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the three periods, clamping each below 1 to 1, and reset.
    pub fn set_parameter(&mut self, k_period: usize, d_period: usize, rsv_period: usize) {
        self.k_period = k_period.max(1);
        self.d_period = d_period.max(1);
        self.rsv_period = rsv_period.max(1);
        self.configured = true;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.highs.clear();
        self.lows.clear();
        self.k = Decimal::ZERO;
        self.d = Decimal::ZERO;
        self.j = Decimal::ZERO;
        self.ring.clear();
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn has_value(&self) -> bool {
        self.configured && self.highs.len() == self.rsv_period
    }

    pub fn k(&self) -> Decimal {
        self.k
    }

    pub fn d(&self) -> Decimal {
        self.d
    }

    pub fn j(&self) -> Decimal {
        self.j
    }

    pub fn current_value(&self) -> Option<KdValue> {
        self.has_value().then_some(KdValue { k: self.k, d: self.d })
    }

    pub fn update(&mut self, high: Decimal, low: Decimal, close: Decimal) {
        if !self.configured {
            return;
        }

        self.highs.push_back(high);
        self.lows.push_back(low);
        if self.highs.len() > self.rsv_period {
            self.highs.pop_front();
        }
        if self.lows.len() > self.rsv_period {
            self.lows.pop_front();
        }

        if !self.has_value() {
            return;
        }

        let highest = self.highs.iter().copied().max().unwrap_or(Decimal::ZERO);
        let lowest = self.lows.iter().copied().min().unwrap_or(Decimal::ZERO);
        if highest == lowest {
            return;
        }

        let hundred = Decimal::from(100u32);
        let rsv = (close - lowest) / (highest - lowest) * hundred;
        let kp = Decimal::from(self.k_period as u64);
        let dp = Decimal::from(self.d_period as u64);
        self.k = (self.k * (kp - Decimal::ONE) + rsv) / kp;
        self.d = (self.d * (dp - Decimal::ONE) + self.k) / dp;
        self.j = Decimal::from(3u32) * self.k - Decimal::from(2u32) * self.d;

        self.ring.push(KdValue { k: self.k, d: self.d });
    }

    pub fn value_at(&self, index: usize) -> Result<KdValue, IndicatorError> {
        if !self.configured {
            return Err(IndicatorError::NotConfigured);
        }
        self.ring.get(index).ok_or(IndicatorError::LookbackOutOfRange {
            index,
            populated: self.ring.len(),
        })
    }
}
