//! Streaming indicators. Every indicator updates in O(1) per input, keeps a
//! five-slot lookback of completed values (index 0 is the newest) and gates
//! reads behind a warm-up check. Periods are clamped on configure; reading
//! past the populated lookback is an error, not a panic.

use thiserror::Error;

pub mod bank;
pub mod bbi_boll;
pub mod kdj;
pub mod ma;
pub mod macd;
pub mod macd_turn;
pub mod ring;
pub mod swing;

pub use bank::IndicatorBank;
pub use bbi_boll::{BandValue, BbiBoll};
pub use kdj::{KdValue, Kdj};
pub use ma::MovingAverage;
pub use macd::{Macd, MacdValue};
pub use macd_turn::{MacdTurn, TurnSignal, TurnValue};
pub use ring::LookbackRing;
pub use swing::{PivotEvent, SwingPivots, SwingValue};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("indicator is not configured")]
    NotConfigured,
    #[error("lookback index {index} outside populated range {populated}")]
    LookbackOutOfRange { index: usize, populated: usize },
}
