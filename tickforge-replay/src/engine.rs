//! Replay state machine: a reader thread streams history into a bounded
//! queue, the calling thread drains it into a `StrategyEngine`.
//!
//! Lifecycle: `Idle → Preloading → Running → Draining → Stopped`.
//! `Cancelled` can be reached from any non-idle state through the handle;
//! a store error ends the run as `Failed`.

use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::Serialize;

use tickforge_core::calendar::{ExchangeClock, TradingCalendar};
use tickforge_core::domain::{Bar, QuoteField, QuoteSource, QuoteUpdate, Side};
use tickforge_core::engine::{clock_for, SignalKind, StrategyEngine};
use tickforge_core::session::Session;

use crate::config::{ReplayConfig, ReplayMode, RunId};
use crate::queue::{CancelToken, EventQueue};
use crate::source::{describe_range, DataError, HistoricalSource};

/// Wall-clock width of one equity sample bucket.
const EQUITY_BUCKET_SECS: i64 = 600;

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayState {
    Idle,
    /// Warm-up data is streaming; signals are suppressed.
    Preloading,
    Running,
    /// The reader finished; the queue is draining into the engine.
    Draining,
    Stopped,
    Cancelled,
    Failed(DataError),
}

/// What travels over the queue from the reader to the engine.
#[derive(Debug, Clone)]
enum ReplayEvent {
    Heartbeat(NaiveDateTime),
    Quote(QuoteUpdate),
    Bar(Bar),
}

impl ReplayEvent {
    fn time(&self) -> NaiveDateTime {
        match self {
            ReplayEvent::Heartbeat(t) => *t,
            ReplayEvent::Quote(q) => q.time,
            ReplayEvent::Bar(b) => b.end,
        }
    }
}

/// Shared view of a running replay. Cheap to clone, safe to poke from
/// another thread.
#[derive(Clone)]
pub struct ReplayHandle {
    state: Arc<Mutex<ReplayState>>,
    cancel: CancelToken,
}

impl ReplayHandle {
    pub fn state(&self) -> ReplayState {
        self.state.lock().expect("replay state poisoned").clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// One sampled point on the equity curve.
#[derive(Debug, Clone, Serialize)]
pub struct EquityPoint {
    pub time: NaiveDateTime,
    pub total: Decimal,
    pub realized: Decimal,
    pub floating: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: u32,
    pub start_time: NaiveDateTime,
    pub side: Side,
    pub entry_reason: String,
    pub trade_count: u32,
    pub reverse_count: u32,
    pub realized: Decimal,
    pub close_reason: Option<String>,
}

impl SessionSummary {
    fn of(session: &Session) -> Self {
        Self {
            id: session.id,
            start_time: session.start_time,
            side: session.start_side(),
            entry_reason: session.entry_reason.to_owned(),
            trade_count: session.trade_count(),
            reverse_count: session.reverse_count(),
            realized: session.book().realized(),
            close_reason: session.close_reason().map(str::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalSummary {
    pub time: NaiveDateTime,
    pub session_id: u32,
    pub side: Side,
    pub price: Decimal,
    pub kind: String,
    pub detail: Option<String>,
}

/// Final result of a replay run.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub run_id: RunId,
    /// False when the run was cancelled before the range was exhausted.
    pub completed: bool,
    pub cancelled: bool,
    /// Rows inside the main range, known up front.
    pub total_units: u64,
    /// Rows the engine actually consumed.
    pub processed_units: u64,
    pub total_profit: Decimal,
    pub sessions: Vec<SessionSummary>,
    pub signals: Vec<SignalSummary>,
    pub equity: Vec<EquityPoint>,
}

pub struct ReplayEngine<S> {
    config: ReplayConfig,
    source: S,
    calendar: TradingCalendar,
    state: Arc<Mutex<ReplayState>>,
    cancel: CancelToken,
}

impl<S: HistoricalSource + Sync> ReplayEngine<S> {
    pub fn new(config: ReplayConfig, source: S) -> Result<Self, DataError> {
        let calendar = match &config.calendar_path {
            Some(path) => TradingCalendar::load(path)
                .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?,
            None => TradingCalendar::empty(),
        };
        Ok(Self {
            config,
            source,
            calendar,
            state: Arc::new(Mutex::new(ReplayState::Idle)),
            cancel: CancelToken::new(),
        })
    }

    pub fn handle(&self) -> ReplayHandle {
        ReplayHandle {
            state: Arc::clone(&self.state),
            cancel: self.cancel.clone(),
        }
    }

    fn set_state(&self, next: ReplayState) {
        *self.state.lock().expect("replay state poisoned") = next;
    }

    /// Runs the replay to completion on the calling thread. The reader
    /// runs on its own thread and the two meet at the bounded queue.
    pub fn run(self) -> Result<ReplayReport, DataError> {
        let config = &self.config;
        self.set_state(ReplayState::Preloading);

        let total_units = match config.mode {
            ReplayMode::Precise => {
                self.source
                    .count_ticks(config.product, config.start, config.end)?
            }
            ReplayMode::FastBars => {
                self.source
                    .count_bars(config.product, config.start, config.end)?
            }
        };
        if total_units == 0 {
            let available = match config.mode {
                ReplayMode::Precise => self.source.tick_range(config.product)?,
                ReplayMode::FastBars => self.source.bar_range(config.product)?,
            };
            let err = DataError::EmptyRange {
                available: describe_range(available),
            };
            self.set_state(ReplayState::Failed(err.clone()));
            return Err(err);
        }

        let preload_start = self
            .source
            .find_preload_start(config.product, config.start, config.preload_days)?
            .unwrap_or(config.start - Duration::days(i64::from(config.preload_days)));

        let clock = clock_for(&config.rules, self.calendar.clone());
        let mut engine = StrategyEngine::new(config.product, config.rules.clone(), clock);
        engine.set_signal_start(Some(config.start));
        engine.set_replay_active(true);
        match config.mode {
            ReplayMode::Precise => engine.set_tick_min_diff(config.tick_min_diff),
            ReplayMode::FastBars => engine.set_bar_granular(),
        }
        engine.start();

        let queue = EventQueue::new(config.queue_ceiling);
        let mut processed_units = 0u64;
        let mut equity = Vec::new();
        let mut equity_bucket: Option<i64> = None;
        let mut running = false;

        let reader_result = std::thread::scope(|scope| {
            let reader = scope.spawn(|| {
                let outcome = match config.mode {
                    ReplayMode::Precise => {
                        self.stream_ticks(&queue, preload_start, config.end)
                    }
                    ReplayMode::FastBars => {
                        self.stream_bars(&queue, preload_start, config.end)
                    }
                };
                queue.close();
                outcome
            });

            let mut draining = false;
            while let Some(event) = queue.pop() {
                if self.cancel.is_cancelled() {
                    break;
                }
                let time = event.time();
                if !running && time >= config.start {
                    running = true;
                    self.set_state(ReplayState::Running);
                }
                if running && !draining && reader.is_finished() {
                    draining = true;
                    self.set_state(ReplayState::Draining);
                }
                match event {
                    ReplayEvent::Heartbeat(t) => engine.on_heartbeat(t),
                    ReplayEvent::Quote(quote) => {
                        if running
                            && quote.field == QuoteField::Last
                            && quote.time >= config.start
                        {
                            processed_units += 1;
                        }
                        engine.on_quote(&quote);
                    }
                    ReplayEvent::Bar(bar) => {
                        if running && bar.start >= config.start {
                            processed_units += 1;
                        }
                        engine.on_minute_bar(bar);
                    }
                }
                if running {
                    sample_equity(&engine, time, &mut equity_bucket, &mut equity);
                }
            }

            // Unblocks a reader stuck at the ceiling after a cancel.
            queue.close();
            reader.join().expect("replay reader panicked")
        });

        engine.stop();

        let cancelled = self.cancel.is_cancelled();
        if let Err(err) = reader_result {
            if !cancelled {
                self.set_state(ReplayState::Failed(err.clone()));
                return Err(err);
            }
        }
        self.set_state(if cancelled {
            ReplayState::Cancelled
        } else {
            ReplayState::Stopped
        });

        let mut sessions: Vec<SessionSummary> = engine
            .finished_sessions()
            .iter()
            .chain(engine.sessions())
            .map(SessionSummary::of)
            .collect();
        sessions.sort_by_key(|s| s.id);

        let signals = engine
            .signals()
            .iter()
            .map(|record| {
                let (kind, detail) = match record.kind {
                    SignalKind::Entry { trigger } => ("entry", Some(trigger.to_owned())),
                    SignalKind::Exit { reason } => ("exit", Some(reason.to_owned())),
                    SignalKind::Reverse => ("reverse", None),
                };
                SignalSummary {
                    time: record.time,
                    session_id: record.session_id,
                    side: record.side,
                    price: record.price,
                    kind: kind.to_owned(),
                    detail,
                }
            })
            .collect();

        Ok(ReplayReport {
            run_id: config.run_id(),
            completed: !cancelled && processed_units == total_units,
            cancelled,
            total_units,
            processed_units,
            total_profit: engine.total_profit(),
            sessions,
            signals,
            equity,
        })
    }

    /// Precise mode: one heartbeat per distinct second, then the tick's
    /// volume and last-price quotes in board order.
    fn stream_ticks(
        &self,
        queue: &EventQueue<ReplayEvent>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<(), DataError> {
        let config = &self.config;
        let batches =
            self.source
                .read_tick_batches(config.product, start, end, config.batch_size)?;
        let mut last_second: Option<NaiveDateTime> = None;
        for batch in batches {
            if self.cancel.is_cancelled() {
                return Err(DataError::Cancelled);
            }
            for tick in batch? {
                let second = tick.time.with_nanosecond(0).unwrap_or(tick.time);
                if last_second != Some(second) {
                    last_second = Some(second);
                    if queue.push(ReplayEvent::Heartbeat(second)).is_err() {
                        return Ok(());
                    }
                }
                let volume = QuoteUpdate::volume(
                    config.product,
                    tick.volume,
                    tick.time,
                    QuoteSource::Replay,
                );
                let last = QuoteUpdate::last(
                    config.product,
                    tick.price,
                    tick.time,
                    QuoteSource::Replay,
                );
                if queue.push(ReplayEvent::Quote(volume)).is_err()
                    || queue.push(ReplayEvent::Quote(last)).is_err()
                {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Fast mode: the stored 1-minute bars, each preceded by a heartbeat
    /// at its close so time-of-day exits see the clock move.
    fn stream_bars(
        &self,
        queue: &EventQueue<ReplayEvent>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<(), DataError> {
        let config = &self.config;
        let batches =
            self.source
                .read_bar_batches(config.product, start, end, config.batch_size)?;
        for batch in batches {
            if self.cancel.is_cancelled() {
                return Err(DataError::Cancelled);
            }
            for bar in batch? {
                if queue.push(ReplayEvent::Heartbeat(bar.end)).is_err()
                    || queue.push(ReplayEvent::Bar(bar)).is_err()
                {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

fn sample_equity<C: ExchangeClock>(
    engine: &StrategyEngine<C>,
    time: NaiveDateTime,
    bucket: &mut Option<i64>,
    out: &mut Vec<EquityPoint>,
) {
    let key = time.and_utc().timestamp() / EQUITY_BUCKET_SECS;
    if *bucket == Some(key) {
        return;
    }
    *bucket = Some(key);
    let banked: Decimal = engine
        .finished_sessions()
        .iter()
        .map(|s| s.book().realized())
        .sum();
    let live_realized: Decimal = engine.sessions().iter().map(|s| s.book().realized()).sum();
    let floating: Decimal = engine.sessions().iter().map(|s| s.book().floating()).sum();
    let realized = banked + live_realized;
    out.push(EquityPoint {
        time,
        total: realized + floating,
        realized,
        floating,
    });
}
