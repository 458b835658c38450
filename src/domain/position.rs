//! Trade log entries and round-trip pairing.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "Buy"),
            TradeAction::Sell => write!(f, "Sell"),
        }
    }
}

/// One fill, recorded when the position flips between flat and long.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub shares: f64,
}

impl Trade {
    pub fn notional(&self) -> f64 {
        self.price * self.shares
    }
}

/// A Buy matched with the Sell that closed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub shares: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
}

impl ClosedTrade {
    pub fn return_pct(&self) -> f64 {
        (self.exit_price / self.entry_price - 1.0) * 100.0
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoundTrips {
    pub closed: Vec<ClosedTrade>,
    /// Buy with no matching Sell by the end of the series.
    pub open: Option<Trade>,
}

pub fn pair_round_trips(trades: &[Trade]) -> RoundTrips {
    let mut out = RoundTrips::default();

    for trade in trades {
        match (trade.action, out.open.take()) {
            (TradeAction::Buy, _) => out.open = Some(trade.clone()),
            (TradeAction::Sell, Some(entry)) => out.closed.push(ClosedTrade {
                shares: entry.shares,
                entry_price: entry.price,
                exit_price: trade.price,
                entry_date: entry.date,
                exit_date: trade.date,
                pnl: trade.notional() - entry.notional(),
            }),
            // a Sell without an entry cannot come out of the engine
            (TradeAction::Sell, None) => {}
        }
    }

    out
}
