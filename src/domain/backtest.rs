//! Backtest engine.
//!
//! A single pass over time-ordered signal bars. The running
//! [`PortfolioState`] is threaded through [`step`]; the first bar is never
//! traded on, so the trajectory always opens at the initial capital.

use chrono::NaiveDate;
use tracing::debug;

use super::error::SmacrossError;
use super::indicator_helpers::IndicatorParams;
use super::portfolio::{check_price, EquityPoint, PortfolioState};
use super::position::Trade;
use super::signal::{Signal, SignalBar};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub indicators: IndicatorParams,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            indicators: IndicatorParams::default(),
        }
    }
}

/// Per-bar return and drawdown figures derived from the trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedPoint {
    pub date: NaiveDate,
    /// `None` on the first bar, which has no predecessor.
    pub daily_return: Option<f64>,
    pub cumulative_return: f64,
    pub running_max: f64,
    pub drawdown: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub trajectory: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub derived: Vec<DerivedPoint>,
}

impl BacktestResult {
    pub fn final_value(&self) -> f64 {
        self.trajectory
            .last()
            .map(|p| p.value)
            .unwrap_or(self.initial_capital)
    }
}

pub fn run_backtest(
    bars: &[SignalBar],
    initial_capital: f64,
) -> Result<BacktestResult, SmacrossError> {
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(SmacrossError::InvalidCapital {
            value: initial_capital,
        });
    }
    let first = bars.first().ok_or_else(|| SmacrossError::EmptyInput {
        reason: "backtest needs at least one bar".into(),
    })?;

    let mut state = PortfolioState::new(initial_capital);
    let mut trajectory = Vec::with_capacity(bars.len());
    let mut trades = Vec::new();

    trajectory.push(EquityPoint {
        date: first.date,
        value: initial_capital,
    });

    for bar in &bars[1..] {
        let (next, fill) = step(state, bar)?;
        if let Some(trade) = fill {
            debug!(
                date = %trade.date,
                action = %trade.action,
                price = trade.price,
                shares = trade.shares,
                "fill"
            );
            trades.push(trade);
        }
        trajectory.push(EquityPoint {
            date: bar.date,
            value: next.equity(bar.close),
        });
        state = next;
    }

    let derived = derive_series(&trajectory);

    Ok(BacktestResult {
        initial_capital,
        trajectory,
        trades,
        derived,
    })
}

/// Applies one bar's signal to the portfolio.
///
/// Enter while flat buys, Exit while long sells, everything else holds. A
/// held position is marked at the bar's close, so that close must be valid
/// even when no fill happens.
pub fn step(
    state: PortfolioState,
    bar: &SignalBar,
) -> Result<(PortfolioState, Option<Trade>), SmacrossError> {
    match bar.signal {
        Signal::Enter if !state.is_long() => {
            let (next, trade) = state.buy(bar.date, bar.close)?;
            Ok((next, Some(trade)))
        }
        Signal::Exit if state.is_long() => {
            let (next, trade) = state.sell(bar.date, bar.close)?;
            Ok((next, Some(trade)))
        }
        _ => {
            if state.is_long() {
                check_price(bar.date, bar.close)?;
            }
            Ok((state, None))
        }
    }
}

/// Daily/cumulative returns, running peak and drawdown for each point.
///
/// Empty for trajectories shorter than two points.
pub fn derive_series(trajectory: &[EquityPoint]) -> Vec<DerivedPoint> {
    if trajectory.len() < 2 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(trajectory.len());
    let mut growth = 1.0;
    let mut running_max = trajectory[0].value;

    for (i, point) in trajectory.iter().enumerate() {
        let daily_return = if i == 0 {
            None
        } else {
            Some(point.value / trajectory[i - 1].value - 1.0)
        };
        if let Some(r) = daily_return {
            growth *= 1.0 + r;
        }
        running_max = running_max.max(point.value);

        out.push(DerivedPoint {
            date: point.date,
            daily_return,
            cumulative_return: growth - 1.0,
            running_max,
            drawdown: (point.value - running_max) / running_max,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::TradeAction;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn bar(d: u32, close: f64, signal: Signal) -> SignalBar {
        SignalBar {
            date: date(d),
            close,
            signal,
        }
    }

    fn curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| EquityPoint {
                date: date(i as u32 + 1),
                value,
            })
            .collect()
    }

    #[test]
    fn config_defaults() {
        let c = BacktestConfig::default();
        assert!((c.initial_capital - 10_000.0).abs() < f64::EPSILON);
        assert_eq!(c.indicators, IndicatorParams::default());
    }

    #[test]
    fn step_enter_while_flat_buys() {
        let (next, fill) = step(PortfolioState::new(1000.0), &bar(2, 50.0, Signal::Enter)).unwrap();
        assert!(next.is_long());
        assert_eq!(fill.map(|t| t.action), Some(TradeAction::Buy));
    }

    #[test]
    fn step_enter_while_long_holds() {
        let long = PortfolioState {
            cash: 0.0,
            shares_held: 20.0,
        };
        let (next, fill) = step(long, &bar(2, 60.0, Signal::Enter)).unwrap();
        assert_eq!(next, long);
        assert!(fill.is_none());
    }

    #[test]
    fn step_exit_while_flat_holds() {
        let flat = PortfolioState::new(1000.0);
        let (next, fill) = step(flat, &bar(2, 50.0, Signal::Exit)).unwrap();
        assert_eq!(next, flat);
        assert!(fill.is_none());
    }

    #[test]
    fn step_flat_ignores_bad_close_without_fill() {
        let flat = PortfolioState::new(1000.0);
        assert!(step(flat, &bar(2, 0.0, Signal::Neutral)).is_ok());
        assert!(step(flat, &bar(2, 0.0, Signal::Exit)).is_ok());
    }

    #[test]
    fn flat_bars_with_non_finite_close_keep_trajectory_finite() {
        let bars = [
            bar(1, 100.0, Signal::Neutral),
            bar(2, f64::NAN, Signal::Exit),
            bar(3, f64::INFINITY, Signal::Neutral),
            bar(4, 101.0, Signal::Neutral),
        ];
        let result = run_backtest(&bars, 10_000.0).unwrap();

        let values: Vec<f64> = result.trajectory.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![10_000.0; 4]);
        for p in &result.derived {
            assert!(p.cumulative_return.is_finite());
            assert!(p.daily_return.is_none_or(f64::is_finite));
        }
        assert_eq!(result.final_value(), 10_000.0);
    }

    #[test]
    fn step_exit_while_long_rejects_bad_fill() {
        let long = PortfolioState {
            cash: 0.0,
            shares_held: 20.0,
        };
        for close in [0.0, -1.0] {
            let err = step(long, &bar(2, close, Signal::Exit)).unwrap_err();
            assert!(matches!(err, SmacrossError::InvalidPrice { .. }));
        }
    }

    #[test]
    fn sell_at_zero_close_aborts_run() {
        let bars = [
            bar(1, 100.0, Signal::Neutral),
            bar(2, 100.0, Signal::Enter),
            bar(3, 0.0, Signal::Exit),
            bar(4, 100.0, Signal::Neutral),
        ];
        let err = run_backtest(&bars, 1000.0).unwrap_err();
        assert!(matches!(err, SmacrossError::InvalidPrice { price, .. } if price == 0.0));
    }

    #[test]
    fn step_long_rejects_bad_mark() {
        let long = PortfolioState {
            cash: 0.0,
            shares_held: 20.0,
        };
        let err = step(long, &bar(2, f64::NAN, Signal::Neutral)).unwrap_err();
        assert!(matches!(err, SmacrossError::InvalidPrice { .. }));
    }

    #[test]
    fn rejects_bad_capital() {
        let bars = [bar(1, 100.0, Signal::Neutral)];
        for capital in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = run_backtest(&bars, capital).unwrap_err();
            assert!(matches!(err, SmacrossError::InvalidCapital { .. }));
        }
    }

    #[test]
    fn first_bar_never_trades() {
        let bars = [bar(1, 100.0, Signal::Enter), bar(2, 100.0, Signal::Neutral)];
        let result = run_backtest(&bars, 1000.0).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.final_value(), 1000.0);
    }

    #[test]
    fn derive_empty_for_short_trajectory() {
        assert!(derive_series(&[]).is_empty());
        assert!(derive_series(&curve(&[100.0])).is_empty());
    }

    #[test]
    fn derive_first_point() {
        let derived = derive_series(&curve(&[100.0, 110.0]));
        assert_eq!(derived[0].daily_return, None);
        assert_eq!(derived[0].cumulative_return, 0.0);
        assert_eq!(derived[0].running_max, 100.0);
        assert_eq!(derived[0].drawdown, 0.0);
    }

    #[test]
    fn derive_returns_and_drawdown() {
        let derived = derive_series(&curve(&[100.0, 110.0, 88.0, 121.0]));

        assert!((derived[1].daily_return.unwrap() - 0.10).abs() < 1e-12);
        assert!((derived[2].daily_return.unwrap() - (-0.20)).abs() < 1e-12);
        assert!((derived[2].cumulative_return - (-0.12)).abs() < 1e-12);
        assert!((derived[3].cumulative_return - 0.21).abs() < 1e-12);

        assert_eq!(derived[2].running_max, 110.0);
        assert!((derived[2].drawdown - (-0.20)).abs() < 1e-12);
        assert_eq!(derived[3].running_max, 121.0);
        assert_eq!(derived[3].drawdown, 0.0);
    }
}
