//! Gated breakout trigger. Runs the pattern breakout on the shared state,
//! then only lets a signal through when the live price sits inside the
//! BBIBOLL channel. Confirmed swing pivots override the direction: price
//! above the last peak forces long, below the last valley forces short.

use crate::domain::Side;

use super::pattern_breakout::PatternBreakout;
use super::{BarTriggerContext, TriggerId, TriggerSignal, TriggerState};

#[derive(Debug, Clone, Copy, Default)]
pub struct GatedBreakout;

impl GatedBreakout {
    pub fn on_bar_closed(
        state: &mut TriggerState,
        ctx: &BarTriggerContext,
    ) -> Option<TriggerSignal> {
        let base = PatternBreakout::on_bar_closed(state, ctx)?;
        let price = ctx.current_price?;
        let channel = ctx.channel?;
        if price < channel.lower || price > channel.upper {
            return None;
        }

        let side = if ctx.peak.is_some_and(|peak| price > peak) {
            Side::Long
        } else if ctx.valley.is_some_and(|valley| price < valley) {
            Side::Short
        } else {
            base.side
        };

        Some(TriggerSignal {
            side,
            trigger: TriggerId::GatedBreakout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{BandValue, TurnSignal};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn armed_short_state() -> TriggerState {
        TriggerState {
            wait_short_after_up_break: true,
            ..TriggerState::default()
        }
    }

    fn fire_ctx(price: Option<Decimal>) -> BarTriggerContext {
        BarTriggerContext {
            period_minutes: 5,
            channel: Some(BandValue {
                bbi: dec!(17000),
                mid: dec!(17000),
                upper: dec!(17050),
                lower: dec!(16950),
            }),
            fully_above_upper: false,
            fully_below_lower: false,
            turn: TurnSignal::Bearish,
            current_price: price,
            peak: None,
            valley: None,
        }
    }

    #[test]
    fn passes_inside_channel() {
        let mut state = armed_short_state();
        let signal = GatedBreakout::on_bar_closed(&mut state, &fire_ctx(Some(dec!(17000)))).unwrap();
        assert_eq!(signal.side, Side::Short);
        assert_eq!(signal.trigger, TriggerId::GatedBreakout);
    }

    #[test]
    fn blocked_outside_channel() {
        let mut state = armed_short_state();
        assert!(GatedBreakout::on_bar_closed(&mut state, &fire_ctx(Some(dec!(17080)))).is_none());
        // The inner machine still consumed its arm flag.
        assert!(!state.wait_short_after_up_break);
    }

    #[test]
    fn blocked_without_live_price() {
        let mut state = armed_short_state();
        assert!(GatedBreakout::on_bar_closed(&mut state, &fire_ctx(None)).is_none());
    }

    #[test]
    fn price_above_peak_forces_long() {
        let mut state = armed_short_state();
        let mut ctx = fire_ctx(Some(dec!(17040)));
        ctx.peak = Some(dec!(17030));
        let signal = GatedBreakout::on_bar_closed(&mut state, &ctx).unwrap();
        assert_eq!(signal.side, Side::Long);
    }

    #[test]
    fn price_below_valley_forces_short() {
        let mut state = TriggerState {
            wait_long_after_down_break: true,
            ..TriggerState::default()
        };
        let mut ctx = fire_ctx(Some(dec!(16960)));
        ctx.turn = TurnSignal::Bullish;
        ctx.valley = Some(dec!(16970));
        let signal = GatedBreakout::on_bar_closed(&mut state, &ctx).unwrap();
        assert_eq!(signal.side, Side::Short);
    }
}
