//! Bar enrichment: attaches computed indicators to each bar and filters the
//! warm-up rows that cannot produce a signal.

use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{BollingerBand, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub short_window: usize,
    pub long_window: usize,
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_stddev_x100: u32,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            short_window: 50,
            long_window: 200,
            rsi_period: 14,
            bollinger_period: 20,
            bollinger_stddev_x100: 200,
        }
    }
}

impl IndicatorParams {
    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Sma(self.short_window),
            IndicatorType::Sma(self.long_window),
            IndicatorType::Rsi(self.rsi_period),
            IndicatorType::Bollinger {
                period: self.bollinger_period,
                stddev_mult_x100: self.bollinger_stddev_x100,
            },
        ]
    }
}

/// A price bar together with the indicators computed up to and including it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorBar {
    pub bar: OhlcvBar,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
    pub bollinger: Option<BollingerBand>,
}

impl IndicatorBar {
    pub fn has_averages(&self) -> bool {
        self.sma_short.is_some() && self.sma_long.is_some()
    }
}

pub fn compute_indicators(bars: &[OhlcvBar], params: &IndicatorParams) -> Vec<IndicatorBar> {
    let short = calculate_sma(bars, params.short_window);
    let long = calculate_sma(bars, params.long_window);
    let rsi = calculate_rsi(bars, params.rsi_period);
    let bollinger = calculate_bollinger(
        bars,
        params.bollinger_period,
        params.bollinger_stddev_x100,
    );

    bars.iter()
        .enumerate()
        .map(|(i, bar)| IndicatorBar {
            bar: bar.clone(),
            sma_short: short.values[i].simple(),
            sma_long: long.values[i].simple(),
            rsi: rsi.values[i].simple(),
            bollinger: bollinger.values[i].bands(),
        })
        .collect()
}

/// Drops bars whose moving averages are still warming up.
pub fn drop_warmup(bars: Vec<IndicatorBar>) -> Vec<IndicatorBar> {
    bars.into_iter().filter(IndicatorBar::has_averages).collect()
}
