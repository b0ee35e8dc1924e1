//! Tick-driven PnL management: break-even recovery after a deep loss and
//! the trailing peak-drawdown exit.

use rust_decimal::Decimal;

use crate::session::{RuleSet, Session};

use super::{ExitContext, ExitEvent, ExitOutcome};

/// Arms when the session is down by the trigger; exits the moment total
/// PnL recovers to break-even. The arm survives reversals.
pub(super) fn cover_loss_recovery(
    session: &mut Session,
    rules: &RuleSet,
    ctx: &ExitContext<'_>,
) -> Option<ExitOutcome> {
    if !rules.cover_loss_exit_enabled || !matches!(ctx.event, ExitEvent::Tick) {
        return None;
    }

    let total = session.total_profit();
    if !session.cover_loss_armed && total <= -rules.cover_loss_trigger_points {
        session.cover_loss_armed = true;
        return None;
    }
    if !session.cover_loss_armed || total < Decimal::ZERO {
        return None;
    }

    let price = ctx.price?;
    session.close_all(price, "cover-loss-recovery");
    Some(ExitOutcome::Closed { reason: "cover-loss-recovery" })
}

/// Arms when total PnL first reaches the trigger, then trails the peak and
/// exits once PnL gives back the configured drawdown.
pub(super) fn peak_drawdown(
    session: &mut Session,
    rules: &RuleSet,
    ctx: &ExitContext<'_>,
) -> Option<ExitOutcome> {
    if !rules.profit_drop_exit_enabled || !matches!(ctx.event, ExitEvent::Tick) {
        return None;
    }

    let total = session.total_profit();
    if !session.profit_drop_armed {
        if total >= rules.profit_drop_trigger_points {
            session.profit_drop_armed = true;
            session.profit_peak = total;
        }
        return None;
    }

    if total > session.profit_peak {
        session.profit_peak = total;
        return None;
    }
    if total > session.profit_peak - rules.profit_drop_exit_points {
        return None;
    }

    let price = ctx.price?;
    session.close_all(price, "peak-drawdown");
    Some(ExitOutcome::Closed { reason: "peak-drawdown" })
}

#[cfg(test)]
mod tests {
    use super::super::tests::{at, tick_ctx};
    use super::*;
    use crate::domain::Side;
    use crate::exits::run_chain;
    use rust_decimal_macros::dec;

    #[test]
    fn cover_loss_arms_below_trigger_and_exits_at_breakeven() {
        let rules = RuleSet {
            cover_loss_exit_enabled: true,
            cover_loss_trigger_points: dec!(150),
            ..RuleSet::default()
        };
        let mut s = Session::open(1, Side::Long, 1, dec!(17000), at(), "M1");

        s.mark(dec!(16850), dec!(16850));
        assert!(run_chain(&mut s, &rules, &tick_ctx(dec!(16850))).is_none());
        assert!(s.cover_loss_armed);

        // Partial recovery is not enough.
        s.mark(dec!(16990), dec!(16990));
        assert!(run_chain(&mut s, &rules, &tick_ctx(dec!(16990))).is_none());

        s.mark(dec!(17001), dec!(17001));
        let outcome = run_chain(&mut s, &rules, &tick_ctx(dec!(17001))).unwrap();
        assert_eq!(outcome, ExitOutcome::Closed { reason: "cover-loss-recovery" });
    }

    #[test]
    fn cover_loss_does_not_fire_on_the_arming_tick() {
        let rules = RuleSet {
            cover_loss_exit_enabled: true,
            cover_loss_trigger_points: dec!(150),
            ..RuleSet::default()
        };
        let mut s = Session::open(1, Side::Long, 1, dec!(17000), at(), "M1");
        s.mark(dec!(16850), dec!(16850));
        assert!(run_chain(&mut s, &rules, &tick_ctx(dec!(16850))).is_none());
        assert!(!s.is_finished());
    }

    #[test]
    fn peak_drawdown_trails_the_peak() {
        let rules = RuleSet {
            profit_drop_exit_enabled: true,
            profit_drop_trigger_points: dec!(100),
            profit_drop_exit_points: dec!(40),
            ..RuleSet::default()
        };
        let mut s = Session::open(1, Side::Long, 1, dec!(17000), at(), "M1");

        s.mark(dec!(17100), dec!(17100));
        assert!(run_chain(&mut s, &rules, &tick_ctx(dec!(17100))).is_none());
        assert!(s.profit_drop_armed);

        // New high moves the peak.
        s.mark(dec!(17160), dec!(17160));
        assert!(run_chain(&mut s, &rules, &tick_ctx(dec!(17160))).is_none());
        assert_eq!(s.profit_peak, dec!(160));

        // A 30-point give-back is inside the allowance.
        s.mark(dec!(17130), dec!(17130));
        assert!(run_chain(&mut s, &rules, &tick_ctx(dec!(17130))).is_none());

        s.mark(dec!(17120), dec!(17120));
        let outcome = run_chain(&mut s, &rules, &tick_ctx(dec!(17120))).unwrap();
        assert_eq!(outcome, ExitOutcome::Closed { reason: "peak-drawdown" });
    }

    #[test]
    fn peak_drawdown_never_arms_below_trigger() {
        let rules = RuleSet {
            profit_drop_exit_enabled: true,
            ..RuleSet::default()
        };
        let mut s = Session::open(1, Side::Long, 1, dec!(17000), at(), "M1");
        s.mark(dec!(17080), dec!(17080));
        assert!(run_chain(&mut s, &rules, &tick_ctx(dec!(17080))).is_none());
        assert!(!s.profit_drop_armed);
    }
}
