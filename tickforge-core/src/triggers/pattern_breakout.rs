//! Pattern breakout trigger: arm on a 10-minute bar sealing entirely
//! outside the BBIBOLL channel, fire on the next 5-minute MACD turn in the
//! opposite direction. A breakout above arms the short side, one below
//! arms the long side; arming one side clears the other.

use crate::domain::Side;
use crate::indicators::bank::{CHANNEL_PERIOD_MINUTES, TURN_PERIOD_MINUTES};
use crate::indicators::TurnSignal;

use super::{BarTriggerContext, TriggerId, TriggerSignal, TriggerState};

#[derive(Debug, Clone, Copy, Default)]
pub struct PatternBreakout;

impl PatternBreakout {
    pub fn on_bar_closed(
        state: &mut TriggerState,
        ctx: &BarTriggerContext,
    ) -> Option<TriggerSignal> {
        if ctx.period_minutes == CHANNEL_PERIOD_MINUTES {
            if ctx.channel.is_some() {
                if ctx.fully_above_upper {
                    state.wait_short_after_up_break = true;
                    state.wait_long_after_down_break = false;
                } else if ctx.fully_below_lower {
                    state.wait_long_after_down_break = true;
                    state.wait_short_after_up_break = false;
                }
            }
            return None;
        }

        if ctx.period_minutes != TURN_PERIOD_MINUTES {
            return None;
        }

        if state.wait_short_after_up_break && ctx.turn == TurnSignal::Bearish {
            state.wait_short_after_up_break = false;
            state.wait_long_after_down_break = false;
            return Some(TriggerSignal {
                side: Side::Short,
                trigger: TriggerId::PatternBreakout,
            });
        }

        if state.wait_long_after_down_break && ctx.turn == TurnSignal::Bullish {
            state.wait_short_after_up_break = false;
            state.wait_long_after_down_break = false;
            return Some(TriggerSignal {
                side: Side::Long,
                trigger: TriggerId::PatternBreakout,
            });
        }

        None
    }
}
