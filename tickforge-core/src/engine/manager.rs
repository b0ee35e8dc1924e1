//! The strategy engine: single consumer of the replay event stream. It
//! keeps the quote board, builds bars, feeds the indicator bank, runs the
//! entry triggers and drives the exit chain over every live session.

use chrono::{NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::calendar::{
    in_wrapping_window, ExchangeClock, FuturesClock, TradingCalendar, DAY_CLOSE, NIGHT_CLOSE,
};
use crate::domain::{Bar, Product, QuoteField, QuoteSource, QuoteUpdate, Side};
use crate::exits::{run_chain, ExitContext, ExitEvent, ExitOutcome};
use crate::indicators::IndicatorBank;
use crate::session::{RuleSet, Session};
use crate::triggers::{
    BarTriggerContext, TickTriggerContext, TriggerRouter, TriggerSignal, TrendMode, TrendSide,
};

use super::bars::BarAggregator;

/// Build a clock whose tradable windows mirror the rule set's day and
/// night session settings.
pub fn clock_for(rules: &RuleSet, calendar: TradingCalendar) -> FuturesClock {
    let mut clock = FuturesClock::new(calendar);
    clock.add_trading_window(rules.day_session_start, rules.day_session_end);
    clock.add_trading_window(rules.night_session_start, rules.night_session_end);
    clock
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Entry { trigger: &'static str },
    Exit { reason: &'static str },
    Reverse,
}

/// One line of the engine's signal log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalRecord {
    pub time: NaiveDateTime,
    pub session_id: u32,
    pub side: Side,
    pub price: Decimal,
    pub kind: SignalKind,
}

/// Last accepted entry, for the same-direction block.
#[derive(Debug, Clone, Copy)]
struct EntryBlock {
    time: NaiveDateTime,
    side: Side,
    price: Decimal,
}

#[derive(Debug)]
pub struct StrategyEngine<C: ExchangeClock> {
    product: Product,
    rules: RuleSet,
    clock: C,
    bank: IndicatorBank,
    router: TriggerRouter,
    aggregator: BarAggregator,

    /// Tick-granular feed builds 1-minute bars itself; the bar-granular
    /// feed hands them in via `on_minute_bar`.
    tick_granular: bool,
    tick_min_diff: Decimal,
    last_processed_price: Option<Decimal>,

    sessions: Vec<Session>,
    finished: Vec<Session>,
    next_session_id: u32,
    trend_side: TrendSide,
    block: Option<EntryBlock>,
    signals: Vec<SignalRecord>,

    last_price: Option<Decimal>,
    bid: Option<Decimal>,
    ask: Option<Decimal>,
    pending_volume: u64,
    current_time: Option<NaiveDateTime>,

    running: bool,
    /// Signals before this instant are suppressed (indicator warm-up).
    signal_start: Option<NaiveDateTime>,
    /// While a replay is active the live feed is shut out, so a backtest
    /// can never be contaminated by network quotes.
    replay_active: bool,
}

impl<C: ExchangeClock> StrategyEngine<C> {
    pub fn new(product: Product, rules: RuleSet, clock: C) -> Self {
        let mut bank = IndicatorBank::new();
        bank.configure(
            rules.kbar_period,
            rules.trend_ma_period,
            rules.exit_ma_period(),
        );
        let mut aggregator = BarAggregator::new();
        aggregator.register_period(rules.kbar_period);
        aggregator.register_period(crate::indicators::bank::CHANNEL_PERIOD_MINUTES);
        aggregator.register_period(crate::indicators::bank::TURN_PERIOD_MINUTES);

        Self {
            product,
            rules,
            clock,
            bank,
            router: TriggerRouter::new(),
            aggregator,
            tick_granular: true,
            tick_min_diff: Decimal::ONE,
            last_processed_price: None,
            sessions: Vec::new(),
            finished: Vec::new(),
            next_session_id: 1,
            trend_side: TrendSide::None,
            block: None,
            signals: Vec::new(),
            last_price: None,
            bid: None,
            ask: None,
            pending_volume: 0,
            current_time: None,
            running: false,
            signal_start: None,
            replay_active: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn set_signal_start(&mut self, start: Option<NaiveDateTime>) {
        self.signal_start = start;
    }

    /// Gate for the live feed: while a replay is active, network-sourced
    /// quotes are dropped at the door.
    pub fn set_replay_active(&mut self, active: bool) {
        self.replay_active = active;
    }

    /// Minimum price move, in points, between evaluated ticks.
    pub fn set_tick_min_diff(&mut self, diff: Decimal) {
        self.tick_min_diff = diff.max(Decimal::ZERO);
    }

    /// Switch to the bar-granular feed: the caller supplies sealed
    /// 1-minute bars and no per-tick quotes.
    pub fn set_bar_granular(&mut self) {
        self.tick_granular = false;
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn trend_side(&self) -> TrendSide {
        self.trend_side
    }

    pub fn current_time(&self) -> Option<NaiveDateTime> {
        self.current_time
    }

    pub fn last_price(&self) -> Option<Decimal> {
        self.last_price
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn finished_sessions(&self) -> &[Session] {
        &self.finished
    }

    pub fn signals(&self) -> &[SignalRecord] {
        &self.signals
    }

    /// Realized PnL of finished sessions plus the running total of every
    /// live one, in points.
    pub fn total_profit(&self) -> Decimal {
        let banked: Decimal = self.finished.iter().map(|s| s.book().realized()).sum();
        let live: Decimal = self.sessions.iter().map(|s| s.total_profit()).sum();
        banked + live
    }

    /// Per-second clock pulse. Seals a quiet minute's bar before the next
    /// tick arrives.
    pub fn on_heartbeat(&mut self, time: NaiveDateTime) {
        self.current_time = Some(time);
        if self.tick_granular {
            if let Some(bar) = self.aggregator.flush_minute_before(time) {
                self.handle_minute_bar(bar);
            }
        }
    }

    /// One quote-board update. Volume updates are held for the next trade
    /// print; only `Last` prints drive the strategy.
    pub fn on_quote(&mut self, quote: &QuoteUpdate) {
        if quote.product != self.product {
            return;
        }
        if self.replay_active && quote.source == QuoteSource::Network {
            return;
        }
        match quote.field {
            QuoteField::Volume => {
                self.pending_volume = quote.value.to_u64().unwrap_or(0);
            }
            QuoteField::Last => {
                let price = quote.value;
                self.current_time = Some(quote.time);
                self.last_price = Some(price);
                self.bid = Some(price);
                self.ask = Some(price);

                if self.tick_granular {
                    let volume = std::mem::take(&mut self.pending_volume);
                    if let Some(bar) = self.aggregator.on_tick(price, volume, quote.time) {
                        self.handle_minute_bar(bar);
                    }
                }

                // Tick thinning: moves smaller than the configured step do
                // not re-run the strategy.
                if let Some(prev) = self.last_processed_price {
                    if (price - prev).abs() < self.tick_min_diff {
                        return;
                    }
                }
                self.last_processed_price = Some(price);

                self.evaluate_tick(price, quote.time);
            }
        }
    }

    /// Bar-granular feed entry point: one externally sealed 1-minute bar.
    pub fn on_minute_bar(&mut self, bar: Bar) {
        self.current_time = Some(bar.end);
        if !self.tick_granular {
            self.last_price = Some(bar.close);
            self.bid = Some(bar.close);
            self.ask = Some(bar.close);
        }
        self.handle_minute_bar(bar);
    }

    fn evaluate_tick(&mut self, price: Decimal, time: NaiveDateTime) {
        for session in &mut self.sessions {
            session.mark(price, price);
        }

        if self.signal_allowed(time) {
            let ctx = TickTriggerContext {
                side: self.trend_side,
                price,
                channel: self.bank.channel.current_value(),
            };
            if let Some(signal) = self.router.on_tick(self.rules.trend_mode, &ctx) {
                self.try_open_session(signal, price, time);
            }
        }

        self.run_exits(ExitEvent::Tick, time);
        self.prune_finished();
    }

    fn handle_minute_bar(&mut self, bar: Bar) {
        let sealed = self.aggregator.on_minute_bar(&bar, &self.clock);

        let mut events = Vec::with_capacity(1 + sealed.len());
        events.push((1u32, bar));
        events.extend(sealed);

        for (period, bar) in &events {
            self.bank.on_bar_closed(*period, bar);
            if *period == self.rules.kbar_period {
                self.update_trend_side(bar.close);
            }
        }

        for (period, bar) in &events {
            if !self.tick_granular {
                for session in &mut self.sessions {
                    session.mark(bar.close, bar.close);
                }
            }

            if self.signal_allowed(bar.end) {
                let ctx = self.bar_trigger_ctx(*period, bar);
                if let Some(signal) = self.router.on_bar_closed(self.rules.trend_mode, &ctx) {
                    self.try_open_session(signal, bar.close, bar.end);
                }
            }

            self.run_exits(
                ExitEvent::BarClosed {
                    period_minutes: *period,
                    bar,
                },
                bar.end,
            );
        }
        self.prune_finished();
    }

    fn update_trend_side(&mut self, close: Decimal) {
        self.trend_side = match self.rules.trend_mode {
            TrendMode::None => TrendSide::None,
            TrendMode::Force => self.rules.trend_force_side,
            TrendMode::Auto | TrendMode::MovingAverage => {
                match self.bank.trend_ma.current_value() {
                    Some(ma) if close > ma => TrendSide::Long,
                    Some(ma) if close < ma => TrendSide::Short,
                    // Equal close keeps the prior side; cold MA gives none.
                    Some(_) => self.trend_side,
                    None => TrendSide::None,
                }
            }
        };
    }

    fn bar_trigger_ctx(&self, period_minutes: u32, bar: &Bar) -> BarTriggerContext {
        let channel = self.bank.channel.current_value();
        let (fully_above_upper, fully_below_lower) = match &channel {
            Some(band) => (bar.fully_above(band.upper), bar.fully_below(band.lower)),
            None => (false, false),
        };
        let pivots = self.bank.pivots.current_value();
        BarTriggerContext {
            period_minutes,
            channel,
            fully_above_upper,
            fully_below_lower,
            turn: self.bank.turn.signal(),
            current_price: self.last_price,
            peak: pivots.map(|p| p.peak),
            valley: pivots.map(|p| p.valley),
        }
    }

    fn signal_allowed(&self, time: NaiveDateTime) -> bool {
        self.running && self.signal_start.map_or(true, |start| time >= start)
    }

    fn try_open_session(&mut self, signal: TriggerSignal, price: Decimal, time: NaiveDateTime) {
        if !self.clock.can_trade(time) {
            return;
        }
        if self.sessions.len() >= self.rules.max_session_count {
            return;
        }
        if let Some(block) = &self.block {
            let within_window = block.side == signal.side
                && (time - block.time) <= chrono::Duration::minutes(self.rules.same_direction_block_minutes)
                && (price - block.price).abs() <= self.rules.same_direction_block_range;
            if within_window {
                return;
            }
        }

        let id = self.next_session_id;
        self.next_session_id += 1;
        let session = Session::open(
            id,
            signal.side,
            self.rules.order_size,
            price,
            time,
            signal.trigger.as_str(),
        );
        self.sessions.push(session);
        self.block = Some(EntryBlock {
            time,
            side: signal.side,
            price,
        });
        self.signals.push(SignalRecord {
            time,
            session_id: id,
            side: signal.side,
            price,
            kind: SignalKind::Entry {
                trigger: signal.trigger.as_str(),
            },
        });
    }

    fn run_exits(&mut self, event: ExitEvent<'_>, time: NaiveDateTime) {
        let ctx = ExitContext {
            event,
            time,
            price: self.last_price,
            exit_ma: self.bank.exit_ma.current_value(),
            session_end_close_due: self.session_end_close_due(time),
            long_holiday_close_due: self.long_holiday_close_due(time),
        };
        let mut outcomes = Vec::new();
        for session in &mut self.sessions {
            if let Some(outcome) = run_chain(session, &self.rules, &ctx) {
                let price = ctx.price.unwrap_or_else(|| session.book().avg_entry());
                let side = session.side().unwrap_or(session.start_side());
                outcomes.push((session.id, side, price, outcome));
            }
        }
        for (session_id, side, price, outcome) in outcomes {
            let kind = match outcome {
                ExitOutcome::Closed { reason } => SignalKind::Exit { reason },
                ExitOutcome::Reversed => SignalKind::Reverse,
            };
            self.signals.push(SignalRecord {
                time,
                session_id,
                side,
                price,
                kind,
            });
        }
    }

    fn prune_finished(&mut self) {
        let mut i = 0;
        while i < self.sessions.len() {
            if self.sessions[i].is_finished() {
                let session = self.sessions.remove(i);
                self.finished.push(session);
            } else {
                i += 1;
            }
        }
    }

    /// Inside a close-before-session-end window.
    fn session_end_close_due(&self, time: NaiveDateTime) -> bool {
        let t = time.time();
        if self.rules.close_before_day_session_end
            && in_wrapping_window(t, self.rules.day_close_before_time, DAY_CLOSE)
            && t >= self.rules.day_close_before_time
        {
            return true;
        }
        self.rules.close_before_night_session_end
            && in_wrapping_window(t, self.rules.night_close_before_time, NIGHT_CLOSE)
    }

    /// Inside the close window on the eve of a long market holiday.
    fn long_holiday_close_due(&self, time: NaiveDateTime) -> bool {
        if !self.rules.close_before_long_holiday {
            return false;
        }
        if !self.clock.is_long_holiday_eve(time) {
            return false;
        }
        let cfg = self.rules.close_before_long_holiday_time;
        in_wrapping_window(time.time(), cfg, segment_close_after(cfg))
    }
}

/// Session close boundary that ends the segment a wall-clock time falls
/// in: the night close for the early hours, the day close otherwise.
fn segment_close_after(t: NaiveTime) -> NaiveTime {
    if t < NIGHT_CLOSE {
        NIGHT_CLOSE
    } else if t <= DAY_CLOSE {
        DAY_CLOSE
    } else {
        NIGHT_CLOSE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        // A plain Monday.
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn engine(rules: RuleSet) -> StrategyEngine<FuturesClock> {
        let clock = clock_for(&rules, TradingCalendar::empty());
        let mut engine = StrategyEngine::new(Product::Tx, rules, clock);
        engine.start();
        engine
    }

    fn last(price: Decimal, time: NaiveDateTime) -> QuoteUpdate {
        QuoteUpdate::last(Product::Tx, price, time, QuoteSource::Replay)
    }

    /// Feed enough one-minute prints to seal a 10-minute bar so the
    /// channel indicator carries a value.
    fn warm_channel(engine: &mut StrategyEngine<FuturesClock>, close: Decimal) {
        for m in 0..=10 {
            engine.on_heartbeat(at(9, m, 0));
            engine.on_quote(&last(close, at(9, m, 1)));
        }
    }

    #[test]
    fn band_cross_opens_a_session() {
        let rules = RuleSet {
            trend_mode: TrendMode::Force,
            trend_force_side: TrendSide::Long,
            ..RuleSet::default()
        };
        let mut engine = engine(rules);
        warm_channel(&mut engine, dec!(17000));

        // Flat band at 17000: touch above arms, dip, midline recross fires.
        engine.on_quote(&last(dec!(17002), at(9, 11, 0)));
        engine.on_quote(&last(dec!(16999), at(9, 11, 1)));
        engine.on_quote(&last(dec!(17000), at(9, 11, 2)));

        assert_eq!(engine.sessions().len(), 1);
        let session = &engine.sessions()[0];
        assert_eq!(session.side(), Some(Side::Long));
        assert_eq!(session.entry_reason, "M2");
        assert!(matches!(
            engine.signals().last().unwrap().kind,
            SignalKind::Entry { trigger: "M2" }
        ));
    }

    #[test]
    fn absolute_stop_flattens_on_tick() {
        let rules = RuleSet {
            trend_mode: TrendMode::Force,
            trend_force_side: TrendSide::Long,
            enable_absolute_stop_loss: true,
            absolute_stop_loss_points: dec!(300),
            ..RuleSet::default()
        };
        let mut engine = engine(rules);
        warm_channel(&mut engine, dec!(17000));
        engine.on_quote(&last(dec!(17002), at(9, 11, 0)));
        engine.on_quote(&last(dec!(16999), at(9, 11, 1)));
        engine.on_quote(&last(dec!(17000), at(9, 11, 2)));
        assert_eq!(engine.sessions().len(), 1);

        engine.on_quote(&last(dec!(16600), at(9, 12, 0)));
        assert!(engine.sessions().is_empty());
        assert_eq!(engine.finished_sessions().len(), 1);
        assert_eq!(
            engine.finished_sessions()[0].close_reason(),
            Some("absolute-stop")
        );
        assert_eq!(engine.total_profit(), dec!(-400));
    }

    #[test]
    fn same_direction_block_rejects_nearby_reentry() {
        let rules = RuleSet {
            trend_mode: TrendMode::Force,
            trend_force_side: TrendSide::Long,
            enable_absolute_stop_loss: true,
            absolute_stop_loss_points: dec!(10),
            same_direction_block_minutes: 300,
            same_direction_block_range: dec!(100),
            ..RuleSet::default()
        };
        let mut engine = engine(rules);
        warm_channel(&mut engine, dec!(17000));
        engine.on_quote(&last(dec!(17002), at(9, 11, 0)));
        engine.on_quote(&last(dec!(16999), at(9, 11, 1)));
        engine.on_quote(&last(dec!(17000), at(9, 11, 2)));
        assert_eq!(engine.sessions().len(), 1);

        // Stop out, then re-arm and recross close to the first entry.
        engine.on_quote(&last(dec!(16985), at(9, 12, 0)));
        assert!(engine.sessions().is_empty());
        engine.on_quote(&last(dec!(17003), at(9, 13, 0)));
        engine.on_quote(&last(dec!(16999), at(9, 13, 1)));
        engine.on_quote(&last(dec!(17001), at(9, 13, 2)));
        assert!(engine.sessions().is_empty(), "blocked re-entry must not open");
    }

    #[test]
    fn signals_before_start_are_suppressed() {
        let rules = RuleSet {
            trend_mode: TrendMode::Force,
            trend_force_side: TrendSide::Long,
            ..RuleSet::default()
        };
        let mut engine = engine(rules);
        engine.set_signal_start(Some(at(12, 0, 0)));
        warm_channel(&mut engine, dec!(17000));
        engine.on_quote(&last(dec!(17002), at(9, 11, 0)));
        engine.on_quote(&last(dec!(16999), at(9, 11, 1)));
        engine.on_quote(&last(dec!(17000), at(9, 11, 2)));
        assert!(engine.sessions().is_empty());
        assert!(engine.signals().is_empty());
    }

    fn minute_bar(h: u32, m: u32, close: Decimal) -> Bar {
        let start = at(h, m, 0);
        Bar {
            start,
            end: start + chrono::Duration::minutes(1),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1,
        }
    }

    #[test]
    fn bar_granular_feed_updates_trend_side() {
        let rules = RuleSet {
            kbar_period: 5,
            trend_mode: TrendMode::Auto,
            trend_ma_period: 2,
            ..RuleSet::default()
        };
        let mut engine = engine(rules);
        engine.set_bar_granular();

        let mut close = dec!(17000);
        for m in 0..10 {
            engine.on_minute_bar(minute_bar(9, m, close));
            close += dec!(5);
        }
        // Two rising 5-minute closes put price above its 2-bar MA.
        assert_eq!(engine.trend_side(), TrendSide::Long);
        assert_eq!(engine.last_price(), Some(dec!(17045)));
    }

    #[test]
    fn quiet_minute_is_sealed_by_heartbeat() {
        let mut engine = engine(RuleSet::default());
        engine.on_quote(&last(dec!(17000), at(9, 0, 10)));
        engine.on_heartbeat(at(9, 1, 0));
        // The sealed bar reached the bank through the strategy period.
        assert!(engine.current_time() == Some(at(9, 1, 0)));
    }

    #[test]
    fn session_end_close_window_flattens() {
        let rules = RuleSet {
            trend_mode: TrendMode::Force,
            trend_force_side: TrendSide::Long,
            close_before_day_session_end: true,
            ..RuleSet::default()
        };
        let mut engine = engine(rules);
        warm_channel(&mut engine, dec!(17000));
        engine.on_quote(&last(dec!(17002), at(9, 11, 0)));
        engine.on_quote(&last(dec!(16999), at(9, 11, 1)));
        engine.on_quote(&last(dec!(17000), at(9, 11, 2)));
        assert_eq!(engine.sessions().len(), 1);

        // First tick inside the 13:40 close window flattens.
        engine.on_quote(&last(dec!(17005), at(13, 41, 0)));
        assert!(engine.sessions().is_empty());
        assert_eq!(
            engine.finished_sessions()[0].close_reason(),
            Some("session-end-close")
        );
    }
}
