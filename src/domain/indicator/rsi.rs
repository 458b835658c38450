//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses simple rolling means (Cutler's RSI) of gains and losses over the
//! last n close-to-close changes:
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, or 50 when avg_gain is also 0.
//!
//! Warmup: first n bars are invalid (need n price changes for one window).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    // changes[i] is the move into bar i; changes[0] is unused.
    let changes: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| if i == 0 { 0.0 } else { bar.close - bars[i - 1].close })
        .collect();

    for (i, bar) in bars.iter().enumerate() {
        if period == 0 || i < period {
            values.push(IndicatorPoint::invalid(bar.date, IndicatorValue::Simple(0.0)));
            continue;
        }

        let window = &changes[i + 1 - period..=i];
        let avg_gain = window.iter().filter(|&&c| c > 0.0).sum::<f64>() / period as f64;
        let avg_loss = window.iter().filter(|&&c| c < 0.0).map(|c| -c).sum::<f64>() / period as f64;

        values.push(IndicatorPoint {
            date: bar.date,
            valid: true,
            value: IndicatorValue::Simple(rsi_from_averages(avg_gain, avg_loss)),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
