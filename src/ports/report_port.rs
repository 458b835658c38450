//! Report generation port trait.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SmacrossError;
use crate::domain::indicator_helpers::{IndicatorBar, IndicatorParams};
use crate::domain::metrics::MetricsSummary;
use crate::domain::sweep::SweepResult;

/// Everything a finished run hands to a report writer.
#[derive(Debug, Clone, Copy)]
pub struct Dashboard<'a> {
    pub symbol: &'a str,
    pub params: &'a IndicatorParams,
    pub bars: &'a [IndicatorBar],
    pub result: &'a BacktestResult,
    pub metrics: &'a MetricsSummary,
    /// Best sweep entry, when an optimisation pass ran.
    pub best: Option<&'a SweepResult>,
}

/// Port for writing the run dashboard.
pub trait ReportPort {
    fn write(&self, dashboard: &Dashboard<'_>, output_path: &Path) -> Result<(), SmacrossError>;
}
