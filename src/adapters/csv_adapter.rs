//! CSV file data adapter and run-artifact export.
//!
//! Price files are looked up as `<SYMBOL>.csv`, then `<SYMBOL>_raw.csv`,
//! under the base directory. Columns are located by header name, so both
//! plain `date,open,high,low,close,volume` files and Yahoo-style downloads
//! with an `Adj Close` column are accepted.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmacrossError;
use crate::domain::ohlcv::{normalize_series, OhlcvBar};
use crate::domain::position::Trade;
use crate::domain::signal::SignalBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> Result<PathBuf, SmacrossError> {
        let candidates = [format!("{}.csv", symbol), format!("{}_raw.csv", symbol)];
        candidates
            .iter()
            .map(|name| self.base_path.join(name))
            .find(|p| p.is_file())
            .ok_or_else(|| {
                SmacrossError::data(format!(
                    "no price file for {} in {}",
                    symbol,
                    self.base_path.display()
                ))
            })
    }
}

struct Columns {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    adj_close: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, SmacrossError> {
        let find = |names: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim().to_ascii_lowercase();
                names.iter().any(|n| *n == h)
            })
        };

        Ok(Columns {
            date: find(&["date", "datetime"])
                .ok_or_else(|| SmacrossError::data("missing date column"))?,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            close: find(&["close"])
                .ok_or_else(|| SmacrossError::data("missing close column"))?,
            adj_close: find(&["adj close", "adj_close", "adjclose"]),
            volume: find(&["volume"]),
        })
    }

    /// `None` when the row has no usable date or close.
    fn parse(&self, record: &StringRecord) -> Option<OhlcvBar> {
        let field = |idx: usize| record.get(idx).map(str::trim).filter(|s| !s.is_empty());
        let number = |idx: Option<usize>| idx.and_then(field).and_then(|s| s.parse::<f64>().ok());

        let date = parse_date(field(self.date)?)?;
        let close = number(Some(self.close)).filter(|c| c.is_finite())?;
        let volume = number(self.volume).map(|v| v.round() as i64).unwrap_or(0);

        Some(OhlcvBar {
            date,
            open: number(self.open).unwrap_or(close),
            high: number(self.high).unwrap_or(close),
            low: number(self.low).unwrap_or(close),
            close,
            adj_close: number(self.adj_close).unwrap_or(close),
            volume,
        })
    }
}

/// Accepts `YYYY-MM-DD` optionally followed by a time component.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, SmacrossError> {
        let path = self.csv_path(symbol)?;
        debug!(path = %path.display(), "reading price file");

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|e| SmacrossError::data(format!("failed to read {}: {}", path.display(), e)))?;

        let headers = rdr
            .headers()
            .map_err(|e| SmacrossError::data(format!("CSV header error: {}", e)))?
            .clone();
        let columns = Columns::locate(&headers)?;

        let mut bars = Vec::new();
        let mut dropped = 0usize;

        for result in rdr.records() {
            let record = result.map_err(|e| SmacrossError::data(format!("CSV parse error: {}", e)))?;

            let Some(bar) = columns.parse(&record) else {
                dropped += 1;
                continue;
            };
            if start_date.is_some_and(|s| bar.date < s) || end_date.is_some_and(|e| bar.date > e) {
                continue;
            }
            bars.push(bar);
        }

        if dropped > 0 {
            warn!(symbol, dropped, "dropped rows without a valid date or close");
        }

        Ok(normalize_series(bars))
    }
}

/// Writes one row per bar: signal, portfolio value and derived series.
pub fn write_trajectory_csv(
    path: &Path,
    signals: &[SignalBar],
    result: &BacktestResult,
) -> Result<(), SmacrossError> {
    let mut wtr = csv::Writer::from_path(path).map_err(csv_write_error)?;
    wtr.write_record([
        "date",
        "close",
        "signal",
        "portfolio_value",
        "daily_return",
        "cumulative_return",
        "running_max",
        "drawdown",
    ])
    .map_err(csv_write_error)?;

    for (i, (bar, point)) in signals.iter().zip(&result.trajectory).enumerate() {
        let derived = result.derived.get(i);
        let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();

        wtr.write_record([
            point.date.to_string(),
            bar.close.to_string(),
            bar.signal.code().to_string(),
            point.value.to_string(),
            opt(derived.and_then(|d| d.daily_return)),
            opt(derived.map(|d| d.cumulative_return)),
            opt(derived.map(|d| d.running_max)),
            opt(derived.map(|d| d.drawdown)),
        ])
        .map_err(csv_write_error)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> Result<(), SmacrossError> {
    let mut wtr = csv::Writer::from_path(path).map_err(csv_write_error)?;
    wtr.write_record(["date", "action", "price", "shares"])
        .map_err(csv_write_error)?;
    for trade in trades {
        wtr.write_record([
            trade.date.to_string(),
            trade.action.to_string(),
            trade.price.to_string(),
            trade.shares.to_string(),
        ])
        .map_err(csv_write_error)?;
    }
    wtr.flush()?;
    Ok(())
}

fn csv_write_error(e: csv::Error) -> SmacrossError {
    SmacrossError::data(format!("CSV write error: {}", e))
}
