//! Simple moving average over a fixed close window.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use super::ring::LookbackRing;
use super::IndicatorError;

#[derive(Debug, Clone, Default)]
pub struct MovingAverage {
    period: usize,
    configured: bool,
    window: VecDeque<Decimal>,
    sum: Decimal,
    value: Decimal,
    ring: LookbackRing<Decimal>,
}

impl MovingAverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the window. Periods below 1 clamp to 1; state is cleared.
    pub fn set_parameter(&mut self, period: usize) {
        self.period = period.max(1);
        self.configured = true;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.sum = Decimal::ZERO;
        self.value = Decimal::ZERO;
        self.ring.clear();
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn has_value(&self) -> bool {
        self.configured && self.window.len() == self.period
    }

    /// Current mean, once the window is full.
    pub fn current_value(&self) -> Option<Decimal> {
        self.has_value().then_some(self.value)
    }

    /// O(1) incremental update. Ignored until configured.
    pub fn update(&mut self, close: Decimal) {
        if !self.configured {
            return;
        }

        self.window.push_back(close);
        self.sum += close;
        if self.window.len() > self.period {
            if let Some(dropped) = self.window.pop_front() {
                self.sum -= dropped;
            }
        }

        if self.window.len() == self.period {
            self.value = self.sum / Decimal::from(self.period as u64);
            self.ring.push(self.value);
        }
    }

    /// Mean computed `index` completed windows ago (0 = most recent).
    pub fn value_at(&self, index: usize) -> Result<Decimal, IndicatorError> {
        if !self.configured {
            return Err(IndicatorError::NotConfigured);
        }
        self.ring.get(index).ok_or(IndicatorError::LookbackOutOfRange {
            index,
            populated: self.ring.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn warm_up_gating() {
        let mut ma = MovingAverage::new();
        ma.set_parameter(5);
        for close in [dec!(1), dec!(2), dec!(3), dec!(4)] {
            ma.update(close);
            assert!(!ma.has_value());
            assert_eq!(ma.current_value(), None);
        }
        ma.update(dec!(5));
        assert!(ma.has_value());
        assert_eq!(ma.current_value(), Some(dec!(3)));
    }

    #[test]
    fn rolling_mean_drops_oldest() {
        let mut ma = MovingAverage::new();
        ma.set_parameter(3);
        for close in [dec!(1), dec!(2), dec!(3), dec!(10)] {
            ma.update(close);
        }
        assert_eq!(ma.current_value(), Some(dec!(5)));
    }

    #[test]
    fn invalid_period_clamps_to_one() {
        let mut ma = MovingAverage::new();
        ma.set_parameter(0);
        assert_eq!(ma.period(), 1);
        ma.update(dec!(42));
        assert_eq!(ma.current_value(), Some(dec!(42)));
    }

    #[test]
    fn lookback_before_configure_fails() {
        let ma = MovingAverage::new();
        assert_eq!(ma.value_at(0), Err(IndicatorError::NotConfigured));
    }

    #[test]
    fn lookback_out_of_range_fails() {
        let mut ma = MovingAverage::new();
        ma.set_parameter(1);
        ma.update(dec!(7));
        assert_eq!(ma.value_at(0), Ok(dec!(7)));
        assert_eq!(
            ma.value_at(1),
            Err(IndicatorError::LookbackOutOfRange { index: 1, populated: 1 })
        );
    }
}
