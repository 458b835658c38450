#![allow(dead_code)]

use chrono::NaiveDate;
use smacross::domain::error::SmacrossError;
pub use smacross::domain::ohlcv::OhlcvBar;
use smacross::domain::signal::{Signal, SignalBar};
use smacross::ports::data_port::DataPort;
use smacross::ports::report_port::{Dashboard, ReportPort};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, SmacrossError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SmacrossError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start_date.is_none_or(|s| b.date >= s))
                    .filter(|b| end_date.is_none_or(|e| b.date <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// What a report writer was asked to render.
#[derive(Debug, Clone)]
pub struct WrittenReport {
    pub symbol: String,
    pub path: PathBuf,
    pub bars: usize,
    pub trades: usize,
    pub best: Option<(usize, usize)>,
}

pub struct MockReport {
    pub written: RefCell<Vec<WrittenReport>>,
}

impl MockReport {
    pub fn new() -> Self {
        Self {
            written: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReport {
    fn write(&self, dashboard: &Dashboard<'_>, output_path: &Path) -> Result<(), SmacrossError> {
        self.written.borrow_mut().push(WrittenReport {
            symbol: dashboard.symbol.to_string(),
            path: output_path.to_path_buf(),
            bars: dashboard.bars.len(),
            trades: dashboard.result.trades.len(),
            best: dashboard.best.map(|b| (b.short_window, b.long_window)),
        });
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(i: usize) -> NaiveDate {
    date(2024, 1, 1) + chrono::Duration::days(i as i64)
}

pub fn make_bar(date_str: &str, close: f64) -> OhlcvBar {
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap();
    OhlcvBar::from_close(date, close)
}

/// Consecutive daily bars starting 2024-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| OhlcvBar::from_close(day(i), c))
        .collect()
}

/// Zips closes with signals into consecutive daily engine input.
pub fn signal_bars(closes: &[f64], signals: &[Signal]) -> Vec<SignalBar> {
    assert_eq!(closes.len(), signals.len());
    closes
        .iter()
        .zip(signals)
        .enumerate()
        .map(|(i, (&close, &signal))| SignalBar {
            date: day(i),
            close,
            signal,
        })
        .collect()
}

/// A slow uptrend with a faster oscillation, long enough for 20/50 windows.
pub fn wave_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + 12.0 * (i as f64 / 9.0).sin() + i as f64 * 0.08)
        .collect()
}
