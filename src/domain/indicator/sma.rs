//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i])
//! Warmup: first (n-1) bars are invalid. A period of zero yields an
//! all-invalid series.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut window_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        window_sum += bar.close;
        if period > 0 && i >= period {
            window_sum -= bars[i - period].close;
        }

        if period == 0 || i + 1 < period {
            values.push(IndicatorPoint::invalid(bar.date, IndicatorValue::Simple(0.0)));
            continue;
        }

        // Re-summing the window every `period` bars keeps rounding drift
        // from the running sum bounded on long series.
        if i % period == 0 {
            window_sum = bars[i + 1 - period..=i].iter().map(|b| b.close).sum();
        }

        values.push(IndicatorPoint {
            date: bar.date,
            valid: true,
            value: IndicatorValue::Simple(window_sum / period as f64),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
