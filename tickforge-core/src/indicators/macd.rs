//! MACD over closes: fast/slow EMA spread (DIF), signal EMA (DEA) and the
//! histogram (DIF − DEA). EMAs seed to the first input; smoothing factor
//! is `2 / (period + 1)`.

use rust_decimal::Decimal;

use super::ring::LookbackRing;
use super::IndicatorError;

#[derive(Debug, Clone, Copy, Default)]
struct Ema {
    period: usize,
    value: Decimal,
    seeded: bool,
}

impl Ema {
    fn set_period(&mut self, period: usize) {
        self.period = period.max(1);
        self.value = Decimal::ZERO;
        self.seeded = false;
    }

    fn update(&mut self, input: Decimal) -> Decimal {
        if !self.seeded {
            self.value = input;
            self.seeded = true;
        } else {
            let k = Decimal::from(2u32) / Decimal::from(self.period as u64 + 1);
            self.value = (input - self.value) * k + self.value;
        }
        self.value
    }
}

/// One completed MACD observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MacdValue {
    pub dif: Decimal,
    pub dea: Decimal,
    pub macd: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    configured: bool,
    value: MacdValue,
    ring: LookbackRing<MacdValue>,
}

impl Macd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_parameter(&mut self, fast: usize, slow: usize, signal: usize) {
        self.fast.set_period(fast);
        self.slow.set_period(slow);
        self.signal.set_period(signal);
        self.configured = true;
        self.reset();
    }

    pub fn reset(&mut self) {
        let (f, s, g) = (self.fast.period, self.slow.period, self.signal.period);
        self.fast.set_period(f);
        self.slow.set_period(s);
        self.signal.set_period(g);
        self.value = MacdValue::default();
        self.ring.clear();
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// EMAs seed to the first input, so a single update is enough.
    pub fn has_value(&self) -> bool {
        self.configured && self.signal.seeded
    }

    pub fn dif(&self) -> Decimal {
        self.value.dif
    }

    pub fn dea(&self) -> Decimal {
        self.value.dea
    }

    pub fn macd(&self) -> Decimal {
        self.value.macd
    }

    pub fn current_value(&self) -> Option<MacdValue> {
        self.has_value().then_some(self.value)
    }

    pub fn update(&mut self, close: Decimal) {
        if !self.configured {
            return;
        }
        let fast = self.fast.update(close);
        let slow = self.slow.update(close);
        let dif = fast - slow;
        let dea = self.signal.update(dif);
        self.value = MacdValue {
            dif,
            dea,
            macd: dif - dea,
        };
        self.ring.push(self.value);
    }

    pub fn value_at(&self, index: usize) -> Result<MacdValue, IndicatorError> {
        if !self.configured {
            return Err(IndicatorError::NotConfigured);
        }
        self.ring.get(index).ok_or(IndicatorError::LookbackOutOfRange {
            index,
            populated: self.ring.len(),
        })
    }
}
