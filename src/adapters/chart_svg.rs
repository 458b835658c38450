//! Inline SVG line charts for the dashboard.

use chrono::NaiveDate;

use crate::domain::backtest::DerivedPoint;
use crate::domain::indicator_helpers::IndicatorBar;
use crate::domain::position::{Trade, TradeAction};

const CHART_WIDTH: f64 = 900.0;
const CHART_HEIGHT: f64 = 320.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 40.0;

struct Line<'a> {
    label: &'a str,
    color: &'a str,
    /// One entry per date; gaps break the path.
    values: Vec<Option<f64>>,
}

struct Marker {
    index: usize,
    value: f64,
    action: TradeAction,
}

struct Frame<'a> {
    dates: &'a [NaiveDate],
    min: f64,
    range: f64,
}

impl Frame<'_> {
    fn plot_width() -> f64 {
        CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height() -> f64 {
        CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn x(&self, i: usize) -> f64 {
        MARGIN_LEFT + (i as f64 / (self.dates.len() - 1).max(1) as f64) * Self::plot_width()
    }

    fn y(&self, v: f64) -> f64 {
        MARGIN_TOP + Self::plot_height() - ((v - self.min) / self.range) * Self::plot_height()
    }
}

fn render(
    title: &str,
    dates: &[NaiveDate],
    lines: &[Line<'_>],
    markers: &[Marker],
    fmt_axis: fn(f64) -> String,
) -> String {
    let finite = lines
        .iter()
        .flat_map(|l| l.values.iter().flatten().copied())
        .filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if dates.is_empty() || !min.is_finite() {
        return String::new();
    }
    let range = if max > min { max - min } else { 1.0 };
    let frame = Frame { dates, min, range };

    let mut svg = format!(
        r##"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg" role="img" aria-label="{title}">"##,
        w = CHART_WIDTH,
        h = CHART_HEIGHT,
    );
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"18\" font-size=\"13\" fill=\"#333\">{}</text>\n",
        MARGIN_LEFT, title
    ));

    let bottom = CHART_HEIGHT - MARGIN_BOTTOM;
    svg.push_str(&format!(
        "  <line x1=\"{l}\" y1=\"{t}\" x2=\"{l}\" y2=\"{b}\" stroke=\"#ccc\"/>\n  <line x1=\"{l}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" stroke=\"#ccc\"/>\n",
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = bottom,
        r = CHART_WIDTH - MARGIN_RIGHT,
    ));

    for (v, y) in [
        (min + range, MARGIN_TOP + 5.0),
        (min + range / 2.0, MARGIN_TOP + Frame::plot_height() / 2.0),
        (min, bottom - 5.0),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            MARGIN_LEFT - 5.0,
            y,
            fmt_axis(v)
        ));
    }

    let last = dates.len() - 1;
    for i in [0, last / 2, last] {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            frame.x(i),
            CHART_HEIGHT - 10.0,
            dates[i]
        ));
    }

    let mut legend_x = CHART_WIDTH - MARGIN_RIGHT;
    for line in lines.iter().rev() {
        svg.push_str(&format!(
            "  <text x=\"{:.1}\" y=\"18\" text-anchor=\"end\" font-size=\"11\" fill=\"{}\">{}</text>\n",
            legend_x, line.color, line.label
        ));
        legend_x -= 12.0 + 7.0 * line.label.len() as f64;
    }

    for line in lines {
        let path = path_data(&frame, &line.values);
        if !path.is_empty() {
            svg.push_str(&format!(
                "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
                path, line.color
            ));
        }
    }

    for m in markers {
        let (x, y) = (frame.x(m.index), frame.y(m.value));
        let (points, color) = match m.action {
            TradeAction::Buy => (
                format!("{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}", x, y - 6.0, x - 5.0, y + 4.0, x + 5.0, y + 4.0),
                "#16a34a",
            ),
            TradeAction::Sell => (
                format!("{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}", x, y + 6.0, x - 5.0, y - 4.0, x + 5.0, y - 4.0),
                "#dc2626",
            ),
        };
        svg.push_str(&format!(
            "  <polygon class=\"{}\" points=\"{}\" fill=\"{}\"/>\n",
            m.action.to_string().to_lowercase(),
            points,
            color
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn path_data(frame: &Frame<'_>, values: &[Option<f64>]) -> String {
    let mut path = String::new();
    let mut pen_down = false;
    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) if v.is_finite() => {
                let cmd = if pen_down { " L" } else { " M" };
                path.push_str(&format!("{} {:.1} {:.1}", cmd, frame.x(i), frame.y(*v)));
                pen_down = true;
            }
            _ => pen_down = false,
        }
    }
    path.trim_start().to_string()
}

fn fmt_price(v: f64) -> String {
    format!("{:.2}", v)
}

fn fmt_percent(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

/// Close with both moving averages, plus a marker at every fill.
pub fn price_chart(bars: &[IndicatorBar], trades: &[Trade], short: usize, long: usize) -> String {
    let dates: Vec<NaiveDate> = bars.iter().map(|b| b.bar.date).collect();
    let short_label = format!("SMA {}", short);
    let long_label = format!("SMA {}", long);

    let lines = [
        Line {
            label: "Close",
            color: "#2563eb",
            values: bars.iter().map(|b| Some(b.bar.close)).collect(),
        },
        Line {
            label: &short_label,
            color: "#f59e0b",
            values: bars.iter().map(|b| b.sma_short).collect(),
        },
        Line {
            label: &long_label,
            color: "#16a34a",
            values: bars.iter().map(|b| b.sma_long).collect(),
        },
    ];

    let markers: Vec<Marker> = trades
        .iter()
        .filter_map(|t| {
            dates.binary_search(&t.date).ok().map(|index| Marker {
                index,
                value: t.price,
                action: t.action,
            })
        })
        .collect();

    render("Price with buy/sell signals", &dates, &lines, &markers, fmt_price)
}

pub fn cumulative_return_chart(derived: &[DerivedPoint]) -> String {
    let dates: Vec<NaiveDate> = derived.iter().map(|p| p.date).collect();
    let lines = [Line {
        label: "Cumulative return",
        color: "#7c3aed",
        values: derived.iter().map(|p| Some(p.cumulative_return)).collect(),
    }];
    render("Portfolio growth", &dates, &lines, &[], fmt_percent)
}

pub fn drawdown_chart(derived: &[DerivedPoint]) -> String {
    let dates: Vec<NaiveDate> = derived.iter().map(|p| p.date).collect();
    let lines = [Line {
        label: "Drawdown",
        color: "#dc2626",
        values: derived.iter().map(|p| Some(p.drawdown)).collect(),
    }];
    render("Portfolio drawdown", &dates, &lines, &[], fmt_percent)
}
