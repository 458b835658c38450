//! Configuration validation.
//!
//! Reads every field through [`ConfigPort`] and turns it into typed run
//! settings. Values that are present but malformed are rejected rather
//! than silently replaced with defaults.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;

use super::backtest::{BacktestConfig, DEFAULT_INITIAL_CAPITAL};
use super::error::SmacrossError;
use super::indicator_helpers::IndicatorParams;
use super::sweep::SweepGrid;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_REPORT_OUTPUT: &str = "dashboard.html";

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub symbol: String,
    pub data_dir: PathBuf,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SmacrossError {
    SmacrossError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, SmacrossError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("expected {}, got '{}'", expected, raw))),
    }
}

pub fn parse_positive_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, SmacrossError> {
    let value = parse_value::<usize>(config, section, key, "a positive integer")?.unwrap_or(default);
    if value == 0 {
        return Err(invalid(section, key, "must be at least 1"));
    }
    Ok(value)
}

pub fn parse_positive_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SmacrossError> {
    let value = parse_value::<f64>(config, section, key, "a number")?.unwrap_or(default);
    if !(value.is_finite() && value > 0.0) {
        return Err(invalid(section, key, "must be positive and finite"));
    }
    Ok(value)
}

pub fn parse_optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, SmacrossError> {
    config
        .get_string(section, key)
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                invalid(section, key, format!("invalid {} format, expected YYYY-MM-DD", key))
            })
        })
        .transpose()
}

pub fn parse_window_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<usize>>, SmacrossError> {
    let Some(items) = config.get_list(section, key) else {
        return Ok(None);
    };
    let mut windows = Vec::with_capacity(items.len());
    for item in items {
        match item.parse::<usize>() {
            Ok(w) if w > 0 => windows.push(w),
            _ => {
                return Err(invalid(
                    section,
                    key,
                    format!("'{}' is not a positive window length", item),
                ));
            }
        }
    }
    Ok(Some(windows))
}

/// `symbol_override` takes precedence over `[data] symbol`.
pub fn parse_data_config(
    config: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<DataConfig, SmacrossError> {
    let symbol = symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("data", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SmacrossError::ConfigMissing {
            section: "data".to_string(),
            key: "symbol".to_string(),
        })?;

    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '_'))
    {
        return Err(invalid("data", "symbol", format!("'{}' is not a ticker symbol", symbol)));
    }

    let data_dir = config
        .get_string("data", "data_dir")
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

    let start_date = parse_optional_date(config, "data", "start_date")?;
    let end_date = parse_optional_date(config, "data", "end_date")?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(invalid("data", "start_date", "start_date must not be after end_date"));
        }
    }

    Ok(DataConfig {
        symbol,
        data_dir: PathBuf::from(data_dir.trim()),
        start_date,
        end_date,
    })
}

pub fn validate_windows(short_window: usize, long_window: usize) -> Result<(), SmacrossError> {
    if short_window == 0 {
        return Err(invalid("strategy", "short_window", "must be at least 1"));
    }
    if long_window <= short_window {
        return Err(invalid(
            "strategy",
            "long_window",
            format!(
                "long_window ({}) must exceed short_window ({})",
                long_window, short_window
            ),
        ));
    }
    Ok(())
}

pub fn parse_indicator_params(config: &dyn ConfigPort) -> Result<IndicatorParams, SmacrossError> {
    let defaults = IndicatorParams::default();

    let short_window = parse_positive_usize(config, "strategy", "short_window", defaults.short_window)?;
    let long_window = parse_positive_usize(config, "strategy", "long_window", defaults.long_window)?;
    validate_windows(short_window, long_window)?;

    let rsi_period = parse_positive_usize(config, "strategy", "rsi_period", defaults.rsi_period)?;
    let bollinger_period =
        parse_positive_usize(config, "strategy", "bollinger_period", defaults.bollinger_period)?;
    if bollinger_period < 2 {
        return Err(invalid("strategy", "bollinger_period", "must be at least 2"));
    }

    let stddev = parse_positive_f64(
        config,
        "strategy",
        "bollinger_stddev",
        defaults.bollinger_stddev_x100 as f64 / 100.0,
    )?;
    if stddev > 10.0 {
        return Err(invalid("strategy", "bollinger_stddev", "must not exceed 10"));
    }

    Ok(IndicatorParams {
        short_window,
        long_window,
        rsi_period,
        bollinger_period,
        bollinger_stddev_x100: (stddev * 100.0).round() as u32,
    })
}

pub fn parse_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SmacrossError> {
    let initial_capital =
        parse_positive_f64(config, "backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL)?;
    Ok(BacktestConfig {
        initial_capital,
        indicators: parse_indicator_params(config)?,
    })
}

pub fn parse_sweep_grid(config: &dyn ConfigPort) -> Result<SweepGrid, SmacrossError> {
    let defaults = SweepGrid::default();
    let grid = SweepGrid {
        short_windows: parse_window_list(config, "optimize", "short_windows")?
            .unwrap_or(defaults.short_windows),
        long_windows: parse_window_list(config, "optimize", "long_windows")?
            .unwrap_or(defaults.long_windows),
    };
    if grid.combinations().is_empty() {
        return Err(invalid(
            "optimize",
            "long_windows",
            "grid has no pair with short < long",
        ));
    }
    Ok(grid)
}

pub fn report_output(config: &dyn ConfigPort) -> PathBuf {
    PathBuf::from(
        config
            .get_string("report", "output")
            .unwrap_or_else(|| DEFAULT_REPORT_OUTPUT.to_string()),
    )
}
