//! Turning-point detector on the MACD DIF line. Runs a fixed MACD(21, 34, 9)
//! over closes and watches the last five DIF values: four strictly rising
//! bars followed by a down-turn flags a bearish turn, four strictly falling
//! followed by an up-turn flags a bullish one. The flag is recomputed from
//! scratch on every update, so it clears as soon as the pattern breaks.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use super::macd::Macd;
use super::ring::LookbackRing;
use super::IndicatorError;

const FAST: usize = 21;
const SLOW: usize = 34;
const SIGNAL: usize = 9;
const PATTERN_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnSignal {
    #[default]
    Neutral,
    /// DIF rose then turned down.
    Bearish,
    /// DIF fell then turned up.
    Bullish,
}

/// One completed observation: the turn flag and the MACD triple behind it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnValue {
    pub signal: TurnSignal,
    pub dif: Decimal,
    pub dea: Decimal,
    pub macd: Decimal,
}

#[derive(Debug, Clone)]
pub struct MacdTurn {
    macd: Macd,
    dif_window: VecDeque<Decimal>,
    value: TurnValue,
    ring: LookbackRing<TurnValue>,
}

impl Default for MacdTurn {
    fn default() -> Self {
        Self::new()
    }
}

impl MacdTurn {
    pub fn new() -> Self {
        let mut macd = Macd::new();
        macd.set_parameter(FAST, SLOW, SIGNAL);
        Self {
            macd,
            dif_window: VecDeque::new(),
            value: TurnValue::default(),
            ring: LookbackRing::default(),
        }
    }

    pub fn reset(&mut self) {
        self.macd.reset();
        self.dif_window.clear();
        self.value = TurnValue::default();
        self.ring.clear();
    }

    pub fn has_value(&self) -> bool {
        !self.ring.is_empty()
    }

    pub fn signal(&self) -> TurnSignal {
        self.value.signal
    }

    pub fn current_value(&self) -> Option<TurnValue> {
        self.has_value().then_some(self.value)
    }

    pub fn update(&mut self, close: Decimal) {
        self.macd.update(close);
        let Some(current) = self.macd.current_value() else {
            return;
        };

        self.dif_window.push_back(current.dif);
        if self.dif_window.len() > PATTERN_WINDOW {
            self.dif_window.pop_front();
        }

        let mut signal = TurnSignal::Neutral;
        if self.dif_window.len() == PATTERN_WINDOW {
            // Window runs oldest to newest.
            let w: Vec<Decimal> = self.dif_window.iter().copied().collect();
            let rising = w[0] < w[1] && w[1] < w[2] && w[2] < w[3];
            let falling = w[0] > w[1] && w[1] > w[2] && w[2] > w[3];
            if rising && w[3] > w[4] {
                signal = TurnSignal::Bearish;
            } else if falling && w[3] < w[4] {
                signal = TurnSignal::Bullish;
            }
        }

        self.value = TurnValue {
            signal,
            dif: current.dif,
            dea: current.dea,
            macd: current.macd,
        };
        self.ring.push(self.value);
    }

    pub fn value_at(&self, index: usize) -> Result<TurnValue, IndicatorError> {
        self.ring.get(index).ok_or(IndicatorError::LookbackOutOfRange {
            index,
            populated: self.ring.len(),
        })
    }
}
