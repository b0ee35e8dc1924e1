//! Criterion benchmarks for hot paths.
//!
//! Benchmarks:
//! 1. Indicator bank update (one sealed bar through every member)
//! 2. Tick-to-bar aggregation
//! 3. Exit chain evaluation on a live session

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use tickforge_core::calendar::{FuturesClock, TradingCalendar};
use tickforge_core::domain::{Bar, Side};
use tickforge_core::engine::BarAggregator;
use tickforge_core::exits::{run_chain, ExitContext, ExitEvent};
use tickforge_core::indicators::IndicatorBank;
use tickforge_core::session::{RuleSet, Session};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn make_bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let close = Decimal::from(17_000 + (i as i64 % 40) - 20);
            let t = start() + chrono::Duration::minutes(i as i64);
            Bar {
                start: t,
                end: t + chrono::Duration::minutes(1),
                open: close - Decimal::ONE,
                high: close + Decimal::TWO,
                low: close - Decimal::TWO,
                close,
                volume: 100,
            }
        })
        .collect()
}

fn bench_indicator_bank(c: &mut Criterion) {
    let bars = make_bars(2_000);
    c.bench_function("bank_2000_strategy_bars", |b| {
        b.iter(|| {
            let mut bank = IndicatorBank::new();
            bank.configure(5, 144, 50);
            for bar in &bars {
                bank.on_bar_closed(black_box(5), bar);
            }
            bank.trend_ma.current_value()
        })
    });
}

fn bench_aggregation(c: &mut Criterion) {
    let clock = FuturesClock::new(TradingCalendar::empty());
    c.bench_function("aggregate_10000_ticks", |b| {
        b.iter(|| {
            let mut agg = BarAggregator::new();
            agg.register_period(5);
            agg.register_period(10);
            let mut sealed = 0usize;
            for i in 0..10_000i64 {
                let t = start() + chrono::Duration::seconds(i);
                let price = Decimal::from(17_000 + (i % 30));
                if let Some(bar) = agg.on_tick(black_box(price), 1, t) {
                    sealed += 1 + agg.on_minute_bar(&bar, &clock).len();
                }
            }
            sealed
        })
    });
}

fn bench_exit_chain(c: &mut Criterion) {
    let rules = RuleSet::default();
    let ctx = ExitContext {
        event: ExitEvent::Tick,
        time: start(),
        price: Some(Decimal::from(17_010u32)),
        exit_ma: Some(Decimal::from(17_000u32)),
        session_end_close_due: false,
        long_holiday_close_due: false,
    };
    c.bench_function("exit_chain_tick_noop", |b| {
        let mut session = Session::open(1, Side::Long, 1, Decimal::from(17_000u32), start(), "M1");
        session.mark(Decimal::from(17_010u32), Decimal::from(17_010u32));
        b.iter(|| run_chain(black_box(&mut session), &rules, &ctx))
    });
}

criterion_group!(
    benches,
    bench_indicator_bank,
    bench_aggregation,
    bench_exit_chain
);
criterion_main!(benches);
