//! Holiday calendar loaded from CSV. Rows are `date,status` with status
//! `HOLIDAY` (closed despite being a weekday) or `OPEN` (trading despite
//! being a weekend, e.g. a make-up session). Dates not listed fall back to
//! the weekday rule. A missing file yields an empty calendar.

use std::collections::HashSet;
use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("calendar file unreadable: {0}")]
    Csv(#[from] csv::Error),
    #[error("calendar row {row}: {message}")]
    Parse { row: usize, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct TradingCalendar {
    holidays: HashSet<NaiveDate>,
    special_open: HashSet<NaiveDate>,
}

impl TradingCalendar {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, CalendarError> {
        if !path.exists() {
            return Ok(Self::empty());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_path(path)?;

        let mut calendar = Self::empty();
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| CalendarError::Parse {
                row: idx + 1,
                message: e.to_string(),
            })?;
            if record.len() < 2 {
                continue;
            }
            let date = NaiveDate::parse_from_str(record[0].trim(), "%Y-%m-%d").map_err(|e| {
                CalendarError::Parse {
                    row: idx + 1,
                    message: format!("bad date {:?}: {e}", &record[0]),
                }
            })?;
            match record[1].trim().to_ascii_uppercase().as_str() {
                "HOLIDAY" => {
                    calendar.holidays.insert(date);
                }
                "OPEN" => {
                    calendar.special_open.insert(date);
                }
                _ => {}
            }
        }
        Ok(calendar)
    }

    pub fn with_holidays<I: IntoIterator<Item = NaiveDate>>(holidays: I) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
            special_open: HashSet::new(),
        }
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn add_special_open(&mut self, date: NaiveDate) {
        self.special_open.insert(date);
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        if self.special_open.contains(&date) {
            return true;
        }
        if self.holidays.contains(&date) {
            return false;
        }
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Number of consecutive non-trading days strictly after `date`,
    /// capped at 30.
    pub fn consecutive_closed_days_after(&self, date: NaiveDate) -> u32 {
        let mut count = 0;
        let mut day = date;
        while count < 30 {
            day = day.succ_opt().unwrap_or(day);
            if self.is_trading_day(day) {
                break;
            }
            count += 1;
        }
        count
    }
}
