//! Routes bar and tick events to the trigger machine the trend mode
//! selects. Owns the shared runtime state.

use super::{
    BandCross, BarTriggerContext, GatedBreakout, PatternBreakout, TickTriggerContext,
    TriggerSignal, TriggerState, TrendMode,
};

#[derive(Debug, Clone, Default)]
pub struct TriggerRouter {
    state: TriggerState,
}

impl TriggerRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    pub fn state(&self) -> &TriggerState {
        &self.state
    }

    /// Bar path: pattern breakout when no trend filter is active, the
    /// gated breakout otherwise.
    pub fn on_bar_closed(
        &mut self,
        mode: TrendMode,
        ctx: &BarTriggerContext,
    ) -> Option<TriggerSignal> {
        if mode == TrendMode::None {
            PatternBreakout::on_bar_closed(&mut self.state, ctx)
        } else {
            GatedBreakout::on_bar_closed(&mut self.state, ctx)
        }
    }

    /// Tick path: only active under a trend filter.
    pub fn on_tick(&mut self, mode: TrendMode, ctx: &TickTriggerContext) -> Option<TriggerSignal> {
        if mode == TrendMode::None {
            None
        } else {
            BandCross::on_tick(&mut self.state, ctx)
        }
    }
}
