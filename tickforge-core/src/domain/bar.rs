//! Bar — aggregated OHLCV over a fixed time window.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV bar for one product over `[start, end)`.
///
/// Immutable once sealed by the aggregator. All price fields are exact
/// decimals; index-futures points survive aggregation without rounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl Bar {
    /// Basic OHLC sanity check: high >= low, extremes contain open/close.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.start < self.end
    }

    /// The whole bar trades at or above `level` (low clears it).
    pub fn fully_above(&self, level: Decimal) -> bool {
        self.low >= level
    }

    /// The whole bar trades at or below `level` (high clears it).
    pub fn fully_below(&self, level: Decimal) -> bool {
        self.high <= level
    }

    /// The bar's range straddles `level` (inclusive on both ends).
    pub fn straddles(&self, level: Decimal) -> bool {
        self.low <= level && level <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bar(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Bar {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Bar {
            start,
            end: start + chrono::Duration::minutes(1),
            open,
            high,
            low,
            close,
            volume: 10,
        }
    }

    #[test]
    fn sanity_check() {
        assert!(bar(dec!(100), dec!(105), dec!(95), dec!(102)).is_sane());
        assert!(!bar(dec!(100), dec!(95), dec!(105), dec!(102)).is_sane());
    }

    #[test]
    fn band_containment() {
        let b = bar(dec!(100), dec!(105), dec!(95), dec!(102));
        assert!(b.fully_above(dec!(95)));
        assert!(!b.fully_above(dec!(96)));
        assert!(b.fully_below(dec!(105)));
        assert!(!b.fully_below(dec!(104)));
        assert!(b.straddles(dec!(100)));
        assert!(!b.straddles(dec!(110)));
    }
}
