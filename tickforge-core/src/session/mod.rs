//! One trading session: a netted position opened by an entry signal and
//! managed by the exit rule chain until flat. Exit rule state lives here so
//! it survives a stop-loss reversal inside the same session.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::domain::Side;

pub mod position;
pub mod rule_set;

pub use position::PositionBook;
pub use rule_set::{RuleSet, StopLossMode};

#[derive(Debug, Clone)]
pub struct Session {
    pub id: u32,
    pub start_time: NaiveDateTime,
    pub entry_reason: &'static str,
    book: PositionBook,
    finished: bool,
    start_side: Side,
    /// Stop-loss baseline; rebased when the session reverses.
    stop_baseline: Decimal,
    trade_count: u32,
    reverse_count: u32,
    close_reason: Option<&'static str>,

    // Exit rule state.
    pub cover_loss_armed: bool,
    pub loss_retrace_armed: bool,
    pub profit_retrace_armed: bool,
    pub profit_drop_armed: bool,
    pub profit_peak: Decimal,
}

impl Session {
    pub fn open(
        id: u32,
        side: Side,
        qty: u32,
        price: Decimal,
        time: NaiveDateTime,
        reason: &'static str,
    ) -> Self {
        let mut book = PositionBook::new();
        book.apply_fill(side, qty, price);
        Self {
            id,
            start_time: time,
            entry_reason: reason,
            book,
            finished: false,
            start_side: side,
            stop_baseline: price,
            trade_count: qty,
            reverse_count: 0,
            close_reason: None,
            cover_loss_armed: false,
            loss_retrace_armed: false,
            profit_retrace_armed: false,
            profit_drop_armed: false,
            profit_peak: Decimal::ZERO,
        }
    }

    pub fn book(&self) -> &PositionBook {
        &self.book
    }

    pub fn side(&self) -> Option<Side> {
        self.book.side()
    }

    pub fn start_side(&self) -> Side {
        self.start_side
    }

    pub fn stop_baseline(&self) -> Decimal {
        self.stop_baseline
    }

    pub fn total_profit(&self) -> Decimal {
        self.book.total()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn trade_count(&self) -> u32 {
        self.trade_count
    }

    pub fn reverse_count(&self) -> u32 {
        self.reverse_count
    }

    pub fn close_reason(&self) -> Option<&'static str> {
        self.close_reason
    }

    /// Refresh floating PnL from the latest quote.
    pub fn mark(&mut self, bid: Decimal, ask: Decimal) {
        if !self.finished {
            self.book.mark(bid, ask);
        }
    }

    /// Flatten the whole position at `price` and finish the session.
    pub fn close_all(&mut self, price: Decimal, reason: &'static str) {
        if let Some(side) = self.book.side() {
            let qty = self.book.net().unsigned_abs();
            self.book.apply_fill(side.opposite(), qty, price);
            self.trade_count += qty;
        }
        self.finished = true;
        self.close_reason = Some(reason);
    }

    /// Flatten and reopen the same size in the opposite direction at
    /// `price`. Refused once the reverse budget is spent or the session is
    /// already flat.
    pub fn reverse(&mut self, price: Decimal, max_reverse_count: u32) -> bool {
        let Some(side) = self.book.side() else {
            return false;
        };
        if self.reverse_count >= max_reverse_count {
            return false;
        }

        let qty = self.book.net().unsigned_abs();
        // Doubled fill flips through flat to the same size opposite.
        self.book.apply_fill(side.opposite(), qty * 2, price);
        self.trade_count += qty * 2;
        self.reverse_count += 1;
        self.stop_baseline = price;

        // Direction-bound arms reset with the flip; the cover-loss arm
        // tracks session-total PnL and survives.
        self.loss_retrace_armed = false;
        self.profit_retrace_armed = false;
        self.profit_drop_armed = false;
        self.profit_peak = Decimal::ZERO;
        true
    }
}
