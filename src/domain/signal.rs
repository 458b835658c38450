//! Moving-average crossover signal generation.
//!
//! A bar whose short average is strictly above its long average is an entry
//! signal; anything else with both averages defined (including equality) is
//! an exit signal. Bars missing either average are neutral.

use chrono::NaiveDate;
use std::fmt;

use super::indicator_helpers::IndicatorBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Enter,
    Exit,
    Neutral,
}

impl Signal {
    /// +1 / -1 / 0 encoding used in exported data.
    pub fn code(self) -> i8 {
        match self {
            Signal::Enter => 1,
            Signal::Exit => -1,
            Signal::Neutral => 0,
        }
    }

    /// Any positive code enters, any negative code exits.
    pub fn from_code(code: i8) -> Self {
        match code {
            c if c > 0 => Signal::Enter,
            c if c < 0 => Signal::Exit,
            _ => Signal::Neutral,
        }
    }

    pub fn is_neutral(self) -> bool {
        self == Signal::Neutral
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Enter => write!(f, "ENTER"),
            Signal::Exit => write!(f, "EXIT"),
            Signal::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// The minimal record the backtest engine consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalBar {
    pub date: NaiveDate,
    pub close: f64,
    pub signal: Signal,
}

pub fn signal_from_averages(short: Option<f64>, long: Option<f64>) -> Signal {
    match (short, long) {
        (Some(s), Some(l)) if s > l => Signal::Enter,
        (Some(s), Some(l)) if s <= l => Signal::Exit,
        // NaN on either side compares false both ways
        _ => Signal::Neutral,
    }
}

pub fn generate_signals(bars: &[IndicatorBar]) -> Vec<SignalBar> {
    bars.iter()
        .map(|b| SignalBar {
            date: b.bar.date,
            close: b.bar.close,
            signal: signal_from_averages(b.sma_short, b.sma_long),
        })
        .collect()
}
