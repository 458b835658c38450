//! Performance metrics and statistics.

use super::backtest::DerivedPoint;
use super::error::SmacrossError;
use super::signal::{Signal, SignalBar};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Annualised mean / sample stddev of daily returns.
    pub sharpe: f64,
    /// Most negative drawdown as a fraction (≤ 0).
    pub max_drawdown: f64,
    /// Entry signals as a percentage of all non-neutral signals.
    pub win_rate: f64,
    pub total_return: f64,
}

pub fn compute_metrics(
    derived: &[DerivedPoint],
    signals: &[SignalBar],
) -> Result<Metrics, SmacrossError> {
    Ok(Metrics {
        sharpe: sharpe_ratio(derived)?,
        max_drawdown: max_drawdown(derived),
        win_rate: win_rate(signals)?,
        total_return: derived.last().map(|p| p.cumulative_return).unwrap_or(0.0),
    })
}

/// Metric readout for display, keeping the reason a metric is undefined
/// instead of failing the whole set.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub sharpe: Result<f64, String>,
    pub max_drawdown: f64,
    pub win_rate: Result<f64, String>,
    pub total_return: f64,
}

pub fn summarize(derived: &[DerivedPoint], signals: &[SignalBar]) -> MetricsSummary {
    MetricsSummary {
        sharpe: sharpe_ratio(derived).map_err(|e| e.to_string()),
        max_drawdown: max_drawdown(derived),
        win_rate: win_rate(signals).map_err(|e| e.to_string()),
        total_return: derived.last().map(|p| p.cumulative_return).unwrap_or(0.0),
    }
}

pub fn sharpe_ratio(derived: &[DerivedPoint]) -> Result<f64, SmacrossError> {
    let returns: Vec<f64> = derived.iter().filter_map(|p| p.daily_return).collect();
    if returns.len() < 2 {
        return Err(SmacrossError::undefined(
            "sharpe",
            format!("need at least 2 daily returns, have {}", returns.len()),
        ));
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev == 0.0 || !stddev.is_finite() {
        return Err(SmacrossError::undefined(
            "sharpe",
            "daily returns have zero standard deviation",
        ));
    }

    Ok(mean / stddev * TRADING_DAYS_PER_YEAR.sqrt())
}

pub fn max_drawdown(derived: &[DerivedPoint]) -> f64 {
    if derived.len() < 2 {
        return 0.0;
    }
    derived.iter().map(|p| p.drawdown).fold(0.0, f64::min)
}

pub fn win_rate(signals: &[SignalBar]) -> Result<f64, SmacrossError> {
    let entries = signals.iter().filter(|s| s.signal == Signal::Enter).count();
    let decided = signals.iter().filter(|s| !s.signal.is_neutral()).count();

    if decided == 0 {
        return Err(SmacrossError::undefined(
            "win_rate",
            "no entry or exit signals",
        ));
    }
    Ok(entries as f64 / decided as f64 * 100.0)
}
