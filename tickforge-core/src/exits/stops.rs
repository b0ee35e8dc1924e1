//! Hard stop rules: the absolute session stop on ticks, the auto stop on
//! 5-minute closes and the fixed-points bar risk stop on 1-minute closes.

use crate::domain::Side;
use crate::session::{RuleSet, Session, StopLossMode};

use super::{
    stop_out, ExitContext, ExitEvent, ExitOutcome, AUTO_STOP_PERIOD_MINUTES, RISK_PERIOD_MINUTES,
};

/// Total session PnL at or below the configured ceiling flattens
/// immediately, no reversal.
pub(super) fn absolute_stop_loss(
    session: &mut Session,
    rules: &RuleSet,
    ctx: &ExitContext<'_>,
) -> Option<ExitOutcome> {
    if !matches!(ctx.event, ExitEvent::Tick) || !rules.enable_absolute_stop_loss {
        return None;
    }
    let price = ctx.price?;
    if session.total_profit() > -rules.absolute_stop_loss_points {
        return None;
    }
    session.close_all(price, "absolute-stop");
    Some(ExitOutcome::Closed { reason: "absolute-stop" })
}

/// A 5-minute close beyond the stop baseline exits, optionally reversing.
pub(super) fn auto_stop_loss(
    session: &mut Session,
    rules: &RuleSet,
    ctx: &ExitContext<'_>,
) -> Option<ExitOutcome> {
    if rules.stop_loss_mode != StopLossMode::Auto {
        return None;
    }
    let ExitEvent::BarClosed { period_minutes, bar } = ctx.event else {
        return None;
    };
    if period_minutes != AUTO_STOP_PERIOD_MINUTES {
        return None;
    }

    let side = session.side()?;
    let baseline = session.stop_baseline();
    let hit = match side {
        Side::Long => bar.close <= baseline - rules.stop_loss_points,
        Side::Short => bar.close >= baseline + rules.stop_loss_points,
    };
    hit.then(|| stop_out(session, rules, bar.close, "auto-stop"))
}

/// Fixed-points mode: a 1-minute close showing at least the configured
/// loss against the average entry exits, optionally reversing.
pub(super) fn bar_risk(
    session: &mut Session,
    rules: &RuleSet,
    ctx: &ExitContext<'_>,
) -> Option<ExitOutcome> {
    if rules.stop_loss_mode != StopLossMode::FixedPoints {
        return None;
    }
    let ExitEvent::BarClosed { period_minutes, bar } = ctx.event else {
        return None;
    };
    if period_minutes != RISK_PERIOD_MINUTES {
        return None;
    }

    let side = session.side()?;
    let entry = session.book().avg_entry();
    let loss = match side {
        Side::Long => entry - bar.close,
        Side::Short => bar.close - entry,
    };
    (loss >= rules.stop_loss_points).then(|| stop_out(session, rules, bar.close, "bar-risk"))
}
