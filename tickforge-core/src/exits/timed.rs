//! Calendar-driven flattening. The engine computes the "due" flags from
//! the exchange clock and the configured cutoffs; these rules just act on
//! them, so they fire on whichever event lands first inside the window.

use crate::session::Session;

use super::{ExitContext, ExitOutcome};

pub(super) fn session_end_close(
    session: &mut Session,
    ctx: &ExitContext<'_>,
) -> Option<ExitOutcome> {
    if !ctx.session_end_close_due {
        return None;
    }
    let price = ctx.price?;
    session.close_all(price, "session-end-close");
    Some(ExitOutcome::Closed { reason: "session-end-close" })
}

pub(super) fn long_holiday_close(
    session: &mut Session,
    ctx: &ExitContext<'_>,
) -> Option<ExitOutcome> {
    if !ctx.long_holiday_close_due {
        return None;
    }
    let price = ctx.price?;
    session.close_all(price, "long-holiday-close");
    Some(ExitOutcome::Closed { reason: "long-holiday-close" })
}
