//! Band-cross trigger, evaluated per tick. With a long trend side it arms
//! when the price touches the upper band and fires on a confirmed cross of
//! the midline from below; short side mirrors. The previous tick price is
//! recorded on every call, armed or not, so the first tick after a reset
//! can never fire.

use crate::domain::Side;

use super::{TickTriggerContext, TriggerId, TriggerSignal, TriggerState, TrendSide};

#[derive(Debug, Clone, Copy, Default)]
pub struct BandCross;

impl BandCross {
    pub fn on_tick(state: &mut TriggerState, ctx: &TickTriggerContext) -> Option<TriggerSignal> {
        let prev = state.last_tick_price;
        state.last_tick_price = Some(ctx.price);

        let Some(channel) = ctx.channel else {
            return None;
        };

        match ctx.side {
            TrendSide::None => {
                state.wait_long_after_up_touch = false;
                state.wait_short_after_down_touch = false;
                None
            }
            TrendSide::Long => {
                state.wait_short_after_down_touch = false;

                if !state.wait_long_after_up_touch {
                    if ctx.price >= channel.upper {
                        state.wait_long_after_up_touch = true;
                    }
                    return None;
                }

                match prev {
                    Some(prev) if prev < channel.mid && ctx.price >= channel.mid => {
                        state.wait_long_after_up_touch = false;
                        Some(TriggerSignal {
                            side: Side::Long,
                            trigger: TriggerId::BandCross,
                        })
                    }
                    _ => None,
                }
            }
            TrendSide::Short => {
                state.wait_long_after_up_touch = false;

                if !state.wait_short_after_down_touch {
                    if ctx.price <= channel.lower {
                        state.wait_short_after_down_touch = true;
                    }
                    return None;
                }

                match prev {
                    Some(prev) if prev > channel.mid && ctx.price <= channel.mid => {
                        state.wait_short_after_down_touch = false;
                        Some(TriggerSignal {
                            side: Side::Short,
                            trigger: TriggerId::BandCross,
                        })
                    }
                    _ => None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::BandValue;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ctx(side: TrendSide, price: Decimal) -> TickTriggerContext {
        TickTriggerContext {
            side,
            price,
            channel: Some(BandValue {
                bbi: dec!(17000),
                mid: dec!(17000),
                upper: dec!(17050),
                lower: dec!(16950),
            }),
        }
    }

    #[test]
    fn long_touch_then_midline_cross_up_fires() {
        let mut state = TriggerState::default();
        assert!(BandCross::on_tick(&mut state, &ctx(TrendSide::Long, dec!(17055))).is_none());
        assert!(state.wait_long_after_up_touch);
        // Price falls below the midline, then crosses back up.
        assert!(BandCross::on_tick(&mut state, &ctx(TrendSide::Long, dec!(16990))).is_none());
        let signal = BandCross::on_tick(&mut state, &ctx(TrendSide::Long, dec!(17002))).unwrap();
        assert_eq!(signal.side, Side::Long);
        assert!(!state.wait_long_after_up_touch);
    }

    #[test]
    fn short_touch_then_midline_cross_down_fires() {
        let mut state = TriggerState::default();
        BandCross::on_tick(&mut state, &ctx(TrendSide::Short, dec!(16940)));
        BandCross::on_tick(&mut state, &ctx(TrendSide::Short, dec!(17010)));
        let signal = BandCross::on_tick(&mut state, &ctx(TrendSide::Short, dec!(16998))).unwrap();
        assert_eq!(signal.side, Side::Short);
    }

    #[test]
    fn armed_above_midline_needs_a_dip_first() {
        let mut state = TriggerState::default();
        BandCross::on_tick(&mut state, &ctx(TrendSide::Long, dec!(17055)));
        // Still above the midline: no cross from below, no fire.
        assert!(BandCross::on_tick(&mut state, &ctx(TrendSide::Long, dec!(17020))).is_none());
        assert!(BandCross::on_tick(&mut state, &ctx(TrendSide::Long, dec!(17010))).is_none());
        assert!(state.wait_long_after_up_touch);
    }

    #[test]
    fn neutral_side_clears_arms() {
        let mut state = TriggerState::default();
        BandCross::on_tick(&mut state, &ctx(TrendSide::Long, dec!(17055)));
        assert!(state.wait_long_after_up_touch);
        BandCross::on_tick(&mut state, &ctx(TrendSide::None, dec!(17055)));
        assert!(!state.wait_long_after_up_touch);
    }

    #[test]
    fn side_flip_clears_opposite_arm() {
        let mut state = TriggerState::default();
        BandCross::on_tick(&mut state, &ctx(TrendSide::Long, dec!(17055)));
        BandCross::on_tick(&mut state, &ctx(TrendSide::Short, dec!(17055)));
        assert!(!state.wait_long_after_up_touch);
    }

    #[test]
    fn missing_channel_still_records_price() {
        let mut state = TriggerState::default();
        let bare = TickTriggerContext {
            side: TrendSide::Long,
            price: dec!(16990),
            channel: None,
        };
        assert!(BandCross::on_tick(&mut state, &bare).is_none());
        assert_eq!(state.last_tick_price, Some(dec!(16990)));
    }

    #[test]
    fn first_tick_after_reset_cannot_fire() {
        let mut state = TriggerState {
            wait_long_after_up_touch: true,
            ..TriggerState::default()
        };
        // Armed but no previous price on record.
        assert!(BandCross::on_tick(&mut state, &ctx(TrendSide::Long, dec!(17002))).is_none());
    }
}
