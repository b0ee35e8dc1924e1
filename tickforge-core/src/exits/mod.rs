//! Exit rule chain. Nine rules evaluated in a fixed order on every tick
//! and sealed bar; the first rule that acts wins and the rest of the chain
//! is skipped for that event. Rules are a closed enum, not trait objects,
//! so the order is a compile-time constant.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::domain::Bar;
use crate::session::{RuleSet, Session};

mod recovery;
mod retrace;
mod stops;
mod timed;

/// Bar period the auto stop-loss rule listens to.
pub const AUTO_STOP_PERIOD_MINUTES: u32 = 5;
/// Bar period the fixed-bar risk and loss-retrace rules listen to.
pub const RISK_PERIOD_MINUTES: u32 = 1;

#[derive(Debug, Clone, Copy)]
pub enum ExitEvent<'a> {
    Tick,
    BarClosed { period_minutes: u32, bar: &'a Bar },
}

/// Everything a rule may consult beyond the session itself.
#[derive(Debug, Clone, Copy)]
pub struct ExitContext<'a> {
    pub event: ExitEvent<'a>,
    pub time: NaiveDateTime,
    /// Latest consolidated price, if any tick has arrived.
    pub price: Option<Decimal>,
    /// Shared profit/loss retrace MA, once warm.
    pub exit_ma: Option<Decimal>,
    /// Inside a close-before-session-end window right now.
    pub session_end_close_due: bool,
    /// Inside the close window on a long-holiday eve.
    pub long_holiday_close_due: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Closed { reason: &'static str },
    Reversed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitRule {
    AbsoluteStopLoss,
    AutoStopLoss,
    BarRisk,
    LossRetraceMa,
    CoverLossRecovery,
    ProfitRetraceMa,
    PeakDrawdown,
    SessionEndClose,
    LongHolidayClose,
}

/// Evaluation order. Hard risk limits first, discretionary profit
/// management after, calendar-driven flattening last.
pub const EXIT_CHAIN: [ExitRule; 9] = [
    ExitRule::AbsoluteStopLoss,
    ExitRule::AutoStopLoss,
    ExitRule::BarRisk,
    ExitRule::LossRetraceMa,
    ExitRule::CoverLossRecovery,
    ExitRule::ProfitRetraceMa,
    ExitRule::PeakDrawdown,
    ExitRule::SessionEndClose,
    ExitRule::LongHolidayClose,
];

impl ExitRule {
    pub fn evaluate(
        self,
        session: &mut Session,
        rules: &RuleSet,
        ctx: &ExitContext<'_>,
    ) -> Option<ExitOutcome> {
        match self {
            ExitRule::AbsoluteStopLoss => stops::absolute_stop_loss(session, rules, ctx),
            ExitRule::AutoStopLoss => stops::auto_stop_loss(session, rules, ctx),
            ExitRule::BarRisk => stops::bar_risk(session, rules, ctx),
            ExitRule::LossRetraceMa => retrace::loss_retrace_ma(session, rules, ctx),
            ExitRule::CoverLossRecovery => recovery::cover_loss_recovery(session, rules, ctx),
            ExitRule::ProfitRetraceMa => retrace::profit_retrace_ma(session, rules, ctx),
            ExitRule::PeakDrawdown => recovery::peak_drawdown(session, rules, ctx),
            ExitRule::SessionEndClose => timed::session_end_close(session, ctx),
            ExitRule::LongHolidayClose => timed::long_holiday_close(session, ctx),
        }
    }
}

/// Run the chain for one event. Short-circuits on the first rule that
/// closes or reverses the session.
pub fn run_chain(
    session: &mut Session,
    rules: &RuleSet,
    ctx: &ExitContext<'_>,
) -> Option<ExitOutcome> {
    if session.is_finished() || session.side().is_none() {
        return None;
    }
    for rule in EXIT_CHAIN {
        if let Some(outcome) = rule.evaluate(session, rules, ctx) {
            return Some(outcome);
        }
    }
    None
}

/// Exit or reverse after a stop-loss style hit, honouring the reverse
/// budget. Shared by the two stop rules.
fn stop_out(
    session: &mut Session,
    rules: &RuleSet,
    price: Decimal,
    reason: &'static str,
) -> ExitOutcome {
    if rules.reverse_after_stop_loss && session.reverse(price, rules.max_reverse_count) {
        ExitOutcome::Reversed
    } else {
        session.close_all(price, reason);
        ExitOutcome::Closed { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    pub(crate) fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    pub(crate) fn tick_ctx(price: Decimal) -> ExitContext<'static> {
        ExitContext {
            event: ExitEvent::Tick,
            time: at(),
            price: Some(price),
            exit_ma: None,
            session_end_close_due: false,
            long_holiday_close_due: false,
        }
    }

    pub(crate) fn bar(
        period: u32,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> (u32, Bar) {
        let start = at();
        (
            period,
            Bar {
                start,
                end: start + chrono::Duration::minutes(period as i64),
                open,
                high,
                low,
                close,
                volume: 10,
            },
        )
    }

    #[test]
    fn chain_short_circuits_on_first_hit() {
        let rules = RuleSet {
            enable_absolute_stop_loss: true,
            absolute_stop_loss_points: dec!(50),
            cover_loss_exit_enabled: true,
            cover_loss_trigger_points: dec!(40),
            ..RuleSet::default()
        };
        let mut s = Session::open(1, Side::Long, 1, dec!(17000), at(), "M1");
        s.mark(dec!(16940), dec!(16940));
        let outcome = run_chain(&mut s, &rules, &tick_ctx(dec!(16940))).unwrap();
        // Absolute stop fires before cover-loss could even arm.
        assert_eq!(outcome, ExitOutcome::Closed { reason: "absolute-stop" });
        assert!(s.is_finished());
        assert!(!s.cover_loss_armed);
    }

    #[test]
    fn finished_session_is_skipped() {
        let rules = RuleSet::default();
        let mut s = Session::open(1, Side::Long, 1, dec!(17000), at(), "M1");
        s.close_all(dec!(17000), "manual");
        assert!(run_chain(&mut s, &rules, &tick_ctx(dec!(16000))).is_none());
    }
}
