//! Per-session indicator bank. Owns every indicator a session consults and
//! routes sealed bars to them by period: the strategy period drives the
//! trend and exit moving averages, KDJ and MACD; the fixed 10-minute bar
//! drives the BBIBOLL channel; the fixed 5-minute bar drives the MACD turn
//! detector and the swing pivot tracker.

use crate::domain::Bar;

use super::bbi_boll::BbiBoll;
use super::kdj::Kdj;
use super::ma::MovingAverage;
use super::macd::Macd;
use super::macd_turn::MacdTurn;
use super::swing::SwingPivots;

pub const CHANNEL_PERIOD_MINUTES: u32 = 10;
pub const TURN_PERIOD_MINUTES: u32 = 5;

const KDJ_K: usize = 3;
const KDJ_D: usize = 3;
const KDJ_RSV: usize = 9;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

#[derive(Debug, Clone, Default)]
pub struct IndicatorBank {
    strategy_period_minutes: u32,
    pub trend_ma: MovingAverage,
    pub exit_ma: MovingAverage,
    pub kdj: Kdj,
    pub macd: Macd,
    pub channel: BbiBoll,
    pub turn: MacdTurn,
    pub pivots: SwingPivots,
}

impl IndicatorBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure all members and reset any prior state. The strategy period
    /// decides which sealed bars feed the trend-side indicators.
    pub fn configure(
        &mut self,
        strategy_period_minutes: u32,
        trend_ma_period: usize,
        exit_ma_period: usize,
    ) {
        self.strategy_period_minutes = strategy_period_minutes.max(1);
        self.trend_ma.set_parameter(trend_ma_period);
        self.exit_ma.set_parameter(exit_ma_period);
        self.kdj.set_parameter(KDJ_K, KDJ_D, KDJ_RSV);
        self.macd.set_parameter(MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        self.channel.set_parameter([13, 56, 89, 144], 14, rust_decimal::Decimal::ONE);
        self.turn.reset();
        self.pivots.reset();
    }

    pub fn strategy_period_minutes(&self) -> u32 {
        self.strategy_period_minutes
    }

    pub fn reset(&mut self) {
        self.trend_ma.reset();
        self.exit_ma.reset();
        self.kdj.reset();
        self.macd.reset();
        self.channel.reset();
        self.turn.reset();
        self.pivots.reset();
    }

    /// Feed one sealed bar. Periods the bank does not track are ignored.
    pub fn on_bar_closed(&mut self, period_minutes: u32, bar: &Bar) {
        if period_minutes == self.strategy_period_minutes {
            self.trend_ma.update(bar.close);
            self.exit_ma.update(bar.close);
            self.kdj.update(bar.high, bar.low, bar.close);
            self.macd.update(bar.close);
        }
        if period_minutes == CHANNEL_PERIOD_MINUTES {
            self.channel.update(bar.close);
        }
        if period_minutes == TURN_PERIOD_MINUTES {
            self.turn.update(bar.close);
            self.pivots.update(bar.high, bar.low, bar.close);
        }
    }
}
