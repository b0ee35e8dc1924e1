//! Per-strategy parameter set. Deserialized from config; every field has a
//! default so partial configs load. Thresholds are points (index points,
//! not currency); windows are exchange-local wall-clock times.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::triggers::{TrendMode, TrendSide};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopLossMode {
    FixedPoints,
    #[default]
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub order_size: u32,
    /// Strategy bar period in minutes.
    pub kbar_period: u32,

    pub stop_loss_points: Decimal,
    pub stop_loss_mode: StopLossMode,
    pub enable_absolute_stop_loss: bool,
    pub absolute_stop_loss_points: Decimal,

    pub loss_retrace_exit_enabled: bool,
    pub loss_retrace_trigger_points: Decimal,
    pub loss_retrace_percent: u32,

    pub trend_mode: TrendMode,
    pub trend_ma_period: usize,
    pub trend_force_side: TrendSide,

    pub same_direction_block_minutes: i64,
    pub same_direction_block_range: Decimal,

    pub day_session_start: NaiveTime,
    pub day_session_end: NaiveTime,
    pub night_session_start: NaiveTime,
    pub night_session_end: NaiveTime,

    pub max_reverse_count: u32,
    pub max_session_count: usize,
    pub reverse_after_stop_loss: bool,

    pub cover_loss_exit_enabled: bool,
    pub cover_loss_trigger_points: Decimal,

    pub profit_drop_exit_enabled: bool,
    pub profit_drop_trigger_points: Decimal,
    pub profit_drop_exit_points: Decimal,

    pub profit_retrace_exit_enabled: bool,
    pub profit_retrace_trigger_points: Decimal,
    pub profit_retrace_percent: u32,

    pub close_before_day_session_end: bool,
    pub close_before_night_session_end: bool,
    pub day_close_before_time: NaiveTime,
    pub night_close_before_time: NaiveTime,

    pub close_before_long_holiday: bool,
    pub close_before_long_holiday_time: NaiveTime,
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            order_size: 1,
            kbar_period: 5,
            stop_loss_points: Decimal::from(100u32),
            stop_loss_mode: StopLossMode::Auto,
            enable_absolute_stop_loss: false,
            absolute_stop_loss_points: Decimal::from(300u32),
            loss_retrace_exit_enabled: false,
            loss_retrace_trigger_points: Decimal::from(300u32),
            loss_retrace_percent: 50,
            trend_mode: TrendMode::None,
            trend_ma_period: 144,
            trend_force_side: TrendSide::None,
            same_direction_block_minutes: 300,
            same_direction_block_range: Decimal::from(100u32),
            day_session_start: t(8, 45),
            day_session_end: t(13, 0),
            night_session_start: t(15, 0),
            night_session_end: t(2, 0),
            max_reverse_count: 20,
            max_session_count: 5,
            reverse_after_stop_loss: true,
            cover_loss_exit_enabled: false,
            cover_loss_trigger_points: Decimal::from(150u32),
            profit_drop_exit_enabled: false,
            profit_drop_trigger_points: Decimal::from(500u32),
            profit_drop_exit_points: Decimal::from(100u32),
            profit_retrace_exit_enabled: false,
            profit_retrace_trigger_points: Decimal::from(300u32),
            profit_retrace_percent: 50,
            close_before_day_session_end: false,
            close_before_night_session_end: false,
            day_close_before_time: t(13, 40),
            night_close_before_time: t(4, 50),
            close_before_long_holiday: false,
            close_before_long_holiday_time: t(4, 50),
        }
    }
}

impl RuleSet {
    /// Period of the MA shared by the profit/loss retrace exits. Zero when
    /// neither retrace exit could ever arm.
    pub fn exit_ma_period(&self) -> usize {
        self.profit_retrace_percent.max(self.loss_retrace_percent) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_match_documented_values() {
        let rules = RuleSet::default();
        assert_eq!(rules.kbar_period, 5);
        assert_eq!(rules.stop_loss_points, dec!(100));
        assert_eq!(rules.stop_loss_mode, StopLossMode::Auto);
        assert_eq!(rules.absolute_stop_loss_points, dec!(300));
        assert_eq!(rules.max_session_count, 5);
        assert!(rules.reverse_after_stop_loss);
        assert_eq!(rules.day_close_before_time, t(13, 40));
        assert_eq!(rules.night_close_before_time, t(4, 50));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let rules: RuleSet = toml::from_str(
            r#"
            kbar_period = 30
            trend_mode = "Auto"
            profit_retrace_percent = 60
            "#,
        )
        .unwrap();
        assert_eq!(rules.kbar_period, 30);
        assert_eq!(rules.trend_mode, TrendMode::Auto);
        assert_eq!(rules.exit_ma_period(), 60);
        assert_eq!(rules.max_reverse_count, 20);
    }

    #[test]
    fn exit_ma_period_takes_larger_percent() {
        let rules = RuleSet {
            profit_retrace_percent: 40,
            loss_retrace_percent: 55,
            ..RuleSet::default()
        };
        assert_eq!(rules.exit_ma_period(), 55);
    }
}
