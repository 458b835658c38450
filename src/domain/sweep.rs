//! Parameter sweep over moving-average windows.
//!
//! Each (short, long) pair is an independent backtest over the same bars,
//! so the grid fans out across the rayon pool with no shared state beyond
//! a progress counter.

use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

use super::backtest::run_backtest;
use super::error::SmacrossError;
use super::indicator_helpers::{compute_indicators, drop_warmup, IndicatorParams};
use super::metrics::{max_drawdown, sharpe_ratio};
use super::ohlcv::OhlcvBar;
use super::signal::generate_signals;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
    pub short_windows: Vec<usize>,
    pub long_windows: Vec<usize>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        SweepGrid {
            short_windows: (10..=50).step_by(10).collect(),
            long_windows: (100..=200).step_by(20).collect(),
        }
    }
}

impl SweepGrid {
    /// All pairs with `0 < short < long`, in grid order.
    pub fn combinations(&self) -> Vec<(usize, usize)> {
        let mut combos = Vec::new();
        for &short in &self.short_windows {
            for &long in &self.long_windows {
                if short > 0 && short < long {
                    combos.push((short, long));
                }
            }
        }
        combos
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    pub sharpe: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub trades: usize,
    pub bars: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub short_window: usize,
    pub long_window: usize,
    pub outcome: Result<SweepOutcome, String>,
}

/// Runs one crossover backtest end to end for the given windows.
pub fn run_single(
    bars: &[OhlcvBar],
    params: &IndicatorParams,
    initial_capital: f64,
) -> Result<SweepOutcome, SmacrossError> {
    let enriched = drop_warmup(compute_indicators(bars, params));
    let signals = generate_signals(&enriched);
    let result = run_backtest(&signals, initial_capital)?;
    let sharpe = sharpe_ratio(&result.derived)?;

    Ok(SweepOutcome {
        sharpe,
        total_return: result.final_value() / initial_capital - 1.0,
        max_drawdown: max_drawdown(&result.derived),
        trades: result.trades.len(),
        bars: signals.len(),
    })
}

pub fn run_sweep(
    bars: &[OhlcvBar],
    grid: &SweepGrid,
    base: &IndicatorParams,
    initial_capital: f64,
) -> Vec<SweepResult> {
    let combinations = grid.combinations();
    let total = combinations.len();
    info!(combinations = total, bars = bars.len(), "running parameter sweep");

    let completed = AtomicUsize::new(0);

    combinations
        .par_iter()
        .map(|&(short_window, long_window)| {
            let params = IndicatorParams {
                short_window,
                long_window,
                ..base.clone()
            };
            let outcome = run_single(bars, &params, initial_capital).map_err(|e| e.to_string());

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(short_window, long_window, done, total, ok = outcome.is_ok(), "sweep run");

            SweepResult {
                short_window,
                long_window,
                outcome,
            }
        })
        .collect()
}

/// Highest finite Sharpe; ties go to the smaller `(short, long)` pair.
pub fn best(results: &[SweepResult]) -> Option<&SweepResult> {
    let mut best: Option<(&SweepResult, f64)> = None;
    for result in results {
        let Ok(outcome) = &result.outcome else {
            continue;
        };
        if !outcome.sharpe.is_finite() {
            continue;
        }
        let key = (result.short_window, result.long_window);
        match best {
            Some((current, sharpe))
                if outcome.sharpe < sharpe
                    || (outcome.sharpe == sharpe
                        && key >= (current.short_window, current.long_window)) => {}
            _ => best = Some((result, outcome.sharpe)),
        }
    }
    best.map(|(r, _)| r)
}

/// Successful runs sorted by Sharpe, best first.
pub fn ranked(results: &[SweepResult]) -> Vec<(&SweepResult, &SweepOutcome)> {
    let mut ok: Vec<_> = results
        .iter()
        .filter_map(|r| r.outcome.as_ref().ok().map(|o| (r, o)))
        .collect();
    ok.sort_by(|a, b| b.1.sharpe.total_cmp(&a.1.sharpe));
    ok
}
