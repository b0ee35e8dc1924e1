//! Entry trigger state machines and the router that selects between them.
//!
//! Three triggers share one runtime state block owned by the router:
//! the bar-driven pattern breakout, the tick-driven band cross, and the
//! gated breakout that layers channel containment and pivot overrides on
//! top of the pattern breakout. Which machines run is decided by the
//! session's trend mode.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Side;
use crate::indicators::{BandValue, TurnSignal};

pub mod band_cross;
pub mod gated_breakout;
pub mod pattern_breakout;
pub mod router;

pub use band_cross::BandCross;
pub use gated_breakout::GatedBreakout;
pub use pattern_breakout::PatternBreakout;
pub use router::TriggerRouter;

/// How the session derives its trend side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendMode {
    /// Trend side follows the trend MA; entries come from the gated
    /// breakout on bars and the band cross on ticks.
    Auto,
    /// No trend filter; entries come from the pattern breakout alone.
    #[default]
    None,
    /// Same routing as `Auto`, side strictly from the trend MA.
    MovingAverage,
    /// Side pinned by configuration.
    Force,
}

/// Current trend side as the engine computed it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendSide {
    #[default]
    None,
    Long,
    Short,
}

/// Which machine produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerId {
    PatternBreakout,
    BandCross,
    GatedBreakout,
}

impl TriggerId {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerId::PatternBreakout => "M1",
            TriggerId::BandCross => "M2",
            TriggerId::GatedBreakout => "M3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSignal {
    pub side: Side,
    pub trigger: TriggerId,
}

/// Mutable runtime state shared by the trigger machines. Reset whenever a
/// session (re)starts or the trigger mode changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerState {
    /// Breakout above the channel seen; waiting for a bearish turn.
    pub wait_short_after_up_break: bool,
    /// Breakout below the channel seen; waiting for a bullish turn.
    pub wait_long_after_down_break: bool,
    /// Upper band touched; waiting for a midline cross-up.
    pub wait_long_after_up_touch: bool,
    /// Lower band touched; waiting for a midline cross-down.
    pub wait_short_after_down_touch: bool,
    /// Previous tick price seen by the band-cross machine.
    pub last_tick_price: Option<Decimal>,
}

impl TriggerState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Snapshot handed to the bar-driven machines when a bar seals.
#[derive(Debug, Clone, Copy)]
pub struct BarTriggerContext {
    pub period_minutes: u32,
    pub channel: Option<BandValue>,
    /// Sealed bar sits entirely at or above the upper band.
    pub fully_above_upper: bool,
    /// Sealed bar sits entirely at or below the lower band.
    pub fully_below_lower: bool,
    pub turn: TurnSignal,
    pub current_price: Option<Decimal>,
    /// Last confirmed swing peak, if any.
    pub peak: Option<Decimal>,
    /// Last confirmed swing valley, if any.
    pub valley: Option<Decimal>,
}

/// Snapshot handed to the tick-driven machine on every evaluated tick.
#[derive(Debug, Clone, Copy)]
pub struct TickTriggerContext {
    pub side: TrendSide,
    pub price: Decimal,
    pub channel: Option<BandValue>,
}
