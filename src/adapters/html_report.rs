//! HTML dashboard adapter implementing ReportPort.
//!
//! Renders a single self-contained page through an Askama template with
//! the charts inlined as SVG.

use std::fs;
use std::path::Path;

use askama::Template;

use crate::adapters::chart_svg;
use crate::domain::error::SmacrossError;
use crate::domain::metrics::MetricsSummary;
use crate::domain::position::pair_round_trips;
use crate::ports::report_port::{Dashboard, ReportPort};

struct MetricRow {
    label: &'static str,
    value: String,
    note: String,
}

struct TradeRow {
    entry_date: String,
    exit_date: String,
    shares: String,
    entry_price: String,
    exit_price: String,
    pnl: String,
    return_pct: String,
    days: i64,
    outcome: &'static str,
}

struct BestParams {
    short: usize,
    long: usize,
    sharpe: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate<'a> {
    symbol: &'a str,
    start_date: String,
    end_date: String,
    bar_count: usize,
    initial_capital: String,
    final_value: String,
    suggestion: String,
    latest: Option<String>,
    best: Option<BestParams>,
    metrics: Vec<MetricRow>,
    price_svg: String,
    growth_svg: String,
    drawdown_svg: String,
    trades: Vec<TradeRow>,
    open_position: Option<String>,
}

/// Plain-language readout of a run, naming the windows it recommends.
pub fn suggestion(metrics: &MetricsSummary, short_window: usize, long_window: usize) -> String {
    let win_rate = match &metrics.win_rate {
        Ok(rate) => format!("a {:.2}% win rate", rate),
        Err(_) => "no measurable win rate".to_string(),
    };
    let outlook = if metrics.total_return > 0.0 {
        "The strategy appears to have strong upward momentum based on the current parameters"
    } else {
        "The strategy has not grown the portfolio with the current parameters"
    };
    format!(
        "The model suggests {} with a maximum drawdown of {:.2}%. {}: SMA Short Window = {} and SMA Long Window = {}.",
        win_rate,
        metrics.max_drawdown * 100.0,
        outlook,
        short_window,
        long_window
    )
}

/// Last bar's close with its RSI and Bollinger readings.
fn latest_reading(dashboard: &Dashboard<'_>) -> Option<String> {
    let last = dashboard.bars.last()?;
    let p = dashboard.params;
    let mut text = format!("Last close {:.2} on {}.", last.bar.close, last.bar.date);
    if let Some(rsi) = last.rsi {
        text.push_str(&format!(" RSI({}) {:.1}.", p.rsi_period, rsi));
    }
    if let Some(band) = last.bollinger {
        text.push_str(&format!(
            " Bollinger({}, {}) lower {:.2}, middle {:.2}, upper {:.2}.",
            p.bollinger_period,
            p.bollinger_stddev_x100 as f64 / 100.0,
            band.lower,
            band.middle,
            band.upper
        ));
    }
    Some(text)
}

fn metric_row(label: &'static str, value: &Result<f64, String>, fmt: fn(f64) -> String) -> MetricRow {
    match value {
        Ok(v) => MetricRow {
            label,
            value: fmt(*v),
            note: String::new(),
        },
        Err(reason) => MetricRow {
            label,
            value: "n/a".to_string(),
            note: reason.clone(),
        },
    }
}

fn metric_rows(metrics: &MetricsSummary) -> Vec<MetricRow> {
    vec![
        metric_row("Sharpe ratio", &metrics.sharpe, |v| format!("{:.3}", v)),
        MetricRow {
            label: "Max drawdown",
            value: format!("{:.2}%", metrics.max_drawdown * 100.0),
            note: String::new(),
        },
        metric_row("Win rate", &metrics.win_rate, |v| format!("{:.2}%", v)),
        MetricRow {
            label: "Total return",
            value: format!("{:.2}%", metrics.total_return * 100.0),
            note: String::new(),
        },
    ]
}

fn render(dashboard: &Dashboard<'_>) -> Result<String, SmacrossError> {
    let result = dashboard.result;
    let round_trips = pair_round_trips(&result.trades);

    let trades = round_trips
        .closed
        .iter()
        .map(|t| TradeRow {
            entry_date: t.entry_date.to_string(),
            exit_date: t.exit_date.to_string(),
            shares: format!("{:.4}", t.shares),
            entry_price: format!("{:.2}", t.entry_price),
            exit_price: format!("{:.2}", t.exit_price),
            pnl: format!("{:.2}", t.pnl),
            return_pct: format!("{:.2}%", t.return_pct()),
            days: t.holding_days(),
            outcome: if t.pnl >= 0.0 { "win" } else { "loss" },
        })
        .collect();

    let open_position = round_trips.open.map(|t| {
        format!(
            "Long {:.4} shares since {} at {:.2}",
            t.shares, t.date, t.price
        )
    });

    let best = dashboard.best.and_then(|b| {
        b.outcome.as_ref().ok().map(|o| BestParams {
            short: b.short_window,
            long: b.long_window,
            sharpe: format!("{:.3}", o.sharpe),
        })
    });
    let (short, long) = best
        .as_ref()
        .map(|b| (b.short, b.long))
        .unwrap_or((dashboard.params.short_window, dashboard.params.long_window));

    let fmt_date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();

    let template = DashboardTemplate {
        symbol: dashboard.symbol,
        start_date: fmt_date(result.trajectory.first().map(|p| p.date)),
        end_date: fmt_date(result.trajectory.last().map(|p| p.date)),
        bar_count: result.trajectory.len(),
        initial_capital: format!("{:.2}", result.initial_capital),
        final_value: format!("{:.2}", result.final_value()),
        suggestion: suggestion(dashboard.metrics, short, long),
        latest: latest_reading(dashboard),
        best,
        metrics: metric_rows(dashboard.metrics),
        price_svg: chart_svg::price_chart(
            dashboard.bars,
            &result.trades,
            dashboard.params.short_window,
            dashboard.params.long_window,
        ),
        growth_svg: chart_svg::cumulative_return_chart(&result.derived),
        drawdown_svg: chart_svg::drawdown_chart(&result.derived),
        trades,
        open_position,
    };

    template
        .render()
        .map_err(|e| SmacrossError::Io(std::io::Error::other(e.to_string())))
}

#[derive(Debug, Default)]
pub struct HtmlReportAdapter;

impl HtmlReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(&self, dashboard: &Dashboard<'_>, output_path: &Path) -> Result<(), SmacrossError> {
        let html = render(dashboard)?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, html)?;
        Ok(())
    }
}
