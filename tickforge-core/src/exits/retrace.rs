//! Retrace-to-MA exits. Both arm on a PnL threshold and exit when price
//! comes back to the shared exit MA: the loss variant watches 1-minute bar
//! closes, the profit variant watches ticks.

use crate::domain::Side;
use crate::session::{RuleSet, Session};

use super::{ExitContext, ExitEvent, ExitOutcome, RISK_PERIOD_MINUTES};

/// Arms once the session loss reaches the trigger; exits when a 1-minute
/// bar straddles the exit MA.
pub(super) fn loss_retrace_ma(
    session: &mut Session,
    rules: &RuleSet,
    ctx: &ExitContext<'_>,
) -> Option<ExitOutcome> {
    if !rules.loss_retrace_exit_enabled {
        return None;
    }
    let ExitEvent::BarClosed { period_minutes, bar } = ctx.event else {
        return None;
    };
    if period_minutes != RISK_PERIOD_MINUTES {
        return None;
    }

    if !session.loss_retrace_armed
        && session.total_profit() <= -rules.loss_retrace_trigger_points
    {
        session.loss_retrace_armed = true;
    }
    if !session.loss_retrace_armed {
        return None;
    }

    let ma = ctx.exit_ma?;
    if !bar.straddles(ma) {
        return None;
    }
    session.close_all(bar.close, "loss-retrace-ma");
    Some(ExitOutcome::Closed { reason: "loss-retrace-ma" })
}

/// Arms once the session profit reaches the trigger; exits when the tick
/// price touches the exit MA from the profitable side.
pub(super) fn profit_retrace_ma(
    session: &mut Session,
    rules: &RuleSet,
    ctx: &ExitContext<'_>,
) -> Option<ExitOutcome> {
    if !rules.profit_retrace_exit_enabled || !matches!(ctx.event, ExitEvent::Tick) {
        return None;
    }

    if !session.profit_retrace_armed
        && session.total_profit() >= rules.profit_retrace_trigger_points
    {
        session.profit_retrace_armed = true;
    }
    if !session.profit_retrace_armed {
        return None;
    }

    let price = ctx.price?;
    let ma = ctx.exit_ma?;
    let touched = match session.side()? {
        Side::Long => price <= ma,
        Side::Short => price >= ma,
    };
    if !touched {
        return None;
    }
    session.close_all(price, "profit-retrace-ma");
    Some(ExitOutcome::Closed { reason: "profit-retrace-ma" })
}
