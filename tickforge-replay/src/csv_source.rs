//! CSV-backed historical store. One directory per product, one file per
//! calendar year: `ticks.<year>.csv` (time, price, volume) and
//! `bars1m.<year>.csv` (start, open, high, low, close, volume), rows in
//! time order, no headers. Comments start with `#`.

use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use tickforge_core::domain::{Bar, Product, QuoteSource, Tick};

use crate::source::{BatchIter, DataError, HistoricalSource};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn product_dir(product: Product) -> &'static str {
    match product {
        Product::Tx => "tx",
        Product::Mtx => "mtx",
        Product::Tmf => "tmf",
    }
}

fn parse_time(path: &Path, row: u64, text: &str) -> Result<NaiveDateTime, DataError> {
    NaiveDateTime::parse_from_str(text, TIME_FORMAT).map_err(|e| DataError::Parse {
        path: path.display().to_string(),
        row,
        message: format!("bad timestamp {text:?}: {e}"),
    })
}

#[derive(Debug, Deserialize)]
struct TickRow {
    time: String,
    price: Decimal,
    volume: u32,
}

#[derive(Debug, Deserialize)]
struct BarRow {
    start: String,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: u64,
}

/// A parsed row plus its timestamp, so the batch iterator can filter on
/// the range without knowing the row shape.
trait TimedRow: Sized {
    type Parsed;
    fn parse(self, path: &Path, row: u64) -> Result<(NaiveDateTime, Self::Parsed), DataError>;
}

impl TimedRow for TickRow {
    type Parsed = Tick;

    fn parse(self, path: &Path, row: u64) -> Result<(NaiveDateTime, Tick), DataError> {
        let time = parse_time(path, row, &self.time)?;
        Ok((
            time,
            Tick {
                time,
                price: self.price,
                volume: self.volume,
                source: QuoteSource::Replay,
            },
        ))
    }
}

impl TimedRow for BarRow {
    type Parsed = Bar;

    fn parse(self, path: &Path, row: u64) -> Result<(NaiveDateTime, Bar), DataError> {
        let start = parse_time(path, row, &self.start)?;
        Ok((
            start,
            Bar {
                start,
                end: start + Duration::minutes(1),
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
                volume: self.volume,
            },
        ))
    }
}

/// Streams rows out of a sequence of year files, filtering on the time
/// range and yielding fixed-size batches.
struct BatchReader<R: TimedRow> {
    files: VecDeque<PathBuf>,
    current: Option<(PathBuf, csv::DeserializeRecordsIntoIter<File, R>, u64)>,
    start: NaiveDateTime,
    end: NaiveDateTime,
    batch_size: usize,
    failed: bool,
}

impl<R: TimedRow + DeserializeOwned> BatchReader<R> {
    fn new(
        files: Vec<PathBuf>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        batch_size: usize,
    ) -> Self {
        Self {
            files: files.into(),
            current: None,
            start,
            end,
            batch_size: batch_size.max(1),
            failed: false,
        }
    }

    fn open_next(&mut self) -> Result<bool, DataError> {
        let Some(path) = self.files.pop_front() else {
            return Ok(false);
        };
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .comment(Some(b'#'))
            .from_path(&path)
            .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;
        self.current = Some((path, reader.into_deserialize::<R>(), 0));
        Ok(true)
    }

    fn next_row(&mut self) -> Result<Option<R::Parsed>, DataError> {
        loop {
            if self.current.is_none() && !self.open_next()? {
                return Ok(None);
            }
            let (path, rows, row_no) = self.current.as_mut().expect("reader just opened");
            match rows.next() {
                Some(Ok(raw)) => {
                    *row_no += 1;
                    let (time, parsed) = raw.parse(path, *row_no)?;
                    if time < self.start || time >= self.end {
                        continue;
                    }
                    return Ok(Some(parsed));
                }
                Some(Err(e)) => {
                    let err = DataError::Parse {
                        path: path.display().to_string(),
                        row: *row_no + 1,
                        message: e.to_string(),
                    };
                    return Err(err);
                }
                None => self.current = None,
            }
        }
    }
}

impl<R: TimedRow + DeserializeOwned> Iterator for BatchReader<R> {
    type Item = Result<Vec<R::Parsed>, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mut batch = Vec::with_capacity(self.batch_size);
        while batch.len() < self.batch_size {
            match self.next_row() {
                Ok(Some(parsed)) => batch.push(parsed),
                Ok(None) => break,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

pub struct CsvHistoricalSource {
    data_dir: PathBuf,
}

impl CsvHistoricalSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Existing year files for a prefix, in year order. A missing product
    /// directory is just an empty store.
    fn year_files(&self, product: Product, prefix: &str) -> Result<Vec<PathBuf>, DataError> {
        let dir = self.data_dir.join(product_dir(product));
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut years = Vec::new();
        let entries = std::fs::read_dir(&dir).map_err(DataError::io)?;
        for entry in entries {
            let entry = entry.map_err(DataError::io)?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(rest) = name.strip_prefix(prefix) {
                if let Some(year) = rest
                    .strip_prefix('.')
                    .and_then(|r| r.strip_suffix(".csv"))
                    .and_then(|y| y.parse::<i32>().ok())
                {
                    years.push((year, entry.path()));
                }
            }
        }
        years.sort_by_key(|(year, _)| *year);
        Ok(years.into_iter().map(|(_, path)| path).collect())
    }

    fn files_for_range(
        &self,
        product: Product,
        prefix: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<PathBuf>, DataError> {
        let all = self.year_files(product, prefix)?;
        Ok(all
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_string_lossy().split('.').nth(1).map(str::to_owned))
                    .and_then(|y| y.parse::<i32>().ok())
                    .map(|year| year >= start.year() && year <= end.year())
                    .unwrap_or(false)
            })
            .collect())
    }

    fn scan_range<R: TimedRow + DeserializeOwned>(
        &self,
        files: Vec<PathBuf>,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime)>, DataError>
    where
        R::Parsed: Timestamped,
    {
        let mut reader =
            BatchReader::<R>::new(files, NaiveDateTime::MIN, NaiveDateTime::MAX, 4096);
        let mut first = None;
        let mut last = None;
        while let Some(row) = reader.next_row()? {
            let t = row.timestamp();
            if first.is_none() {
                first = Some(t);
            }
            last = Some(t);
        }
        Ok(first.zip(last))
    }
}

trait Timestamped {
    fn timestamp(&self) -> NaiveDateTime;
}

impl Timestamped for Tick {
    fn timestamp(&self) -> NaiveDateTime {
        self.time
    }
}

impl Timestamped for Bar {
    fn timestamp(&self) -> NaiveDateTime {
        self.start
    }
}

impl HistoricalSource for CsvHistoricalSource {
    fn count_ticks(
        &self,
        product: Product,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<u64, DataError> {
        let mut total = 0u64;
        for batch in self.read_tick_batches(product, start, end, 8192)? {
            total += batch?.len() as u64;
        }
        Ok(total)
    }

    fn count_bars(
        &self,
        product: Product,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<u64, DataError> {
        let mut total = 0u64;
        for batch in self.read_bar_batches(product, start, end, 8192)? {
            total += batch?.len() as u64;
        }
        Ok(total)
    }

    fn tick_range(
        &self,
        product: Product,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime)>, DataError> {
        let files = self.year_files(product, "ticks")?;
        self.scan_range::<TickRow>(files)
    }

    fn bar_range(
        &self,
        product: Product,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime)>, DataError> {
        let files = self.year_files(product, "bars1m")?;
        self.scan_range::<BarRow>(files)
    }

    fn find_preload_start(
        &self,
        product: Product,
        start: NaiveDateTime,
        preload_days: u32,
    ) -> Result<Option<NaiveDateTime>, DataError> {
        let window_start = start - Duration::days(i64::from(preload_days));

        let mut ticks = BatchReader::<TickRow>::new(
            self.files_for_range(product, "ticks", window_start, start)?,
            window_start,
            start,
            1,
        );
        if let Some(tick) = ticks.next_row()? {
            return Ok(Some(tick.time));
        }

        let mut bars = BatchReader::<BarRow>::new(
            self.files_for_range(product, "bars1m", window_start, start)?,
            window_start,
            start,
            1,
        );
        Ok(bars.next_row()?.map(|bar| bar.start))
    }

    fn read_tick_batches(
        &self,
        product: Product,
        start: NaiveDateTime,
        end: NaiveDateTime,
        batch_size: usize,
    ) -> Result<BatchIter<'_, Tick>, DataError> {
        let files = self.files_for_range(product, "ticks", start, end)?;
        Ok(Box::new(BatchReader::<TickRow>::new(
            files, start, end, batch_size,
        )))
    }

    fn read_bar_batches(
        &self,
        product: Product,
        start: NaiveDateTime,
        end: NaiveDateTime,
        batch_size: usize,
    ) -> Result<BatchIter<'_, Bar>, DataError> {
        let files = self.files_for_range(product, "bars1m", start, end)?;
        Ok(Box::new(BatchReader::<BarRow>::new(
            files, start, end, batch_size,
        )))
    }
}
