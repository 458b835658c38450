//! Portfolio state and equity tracking.
//!
//! The portfolio is all-in or all-out: at most one of `cash` and
//! `shares_held` is non-zero between fills.

use chrono::NaiveDate;

use super::error::SmacrossError;
use super::position::{Trade, TradeAction};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub shares_held: f64,
}

impl PortfolioState {
    pub fn new(initial_capital: f64) -> Self {
        PortfolioState {
            cash: initial_capital,
            shares_held: 0.0,
        }
    }

    pub fn is_long(&self) -> bool {
        self.shares_held > 0.0
    }

    /// Value at `price`. A flat portfolio is worth its cash whatever the close.
    pub fn equity(&self, price: f64) -> f64 {
        if self.is_long() {
            self.cash + self.shares_held * price
        } else {
            self.cash
        }
    }

    /// Converts all cash into shares at `price`.
    pub fn buy(self, date: NaiveDate, price: f64) -> Result<(Self, Trade), SmacrossError> {
        check_price(date, price)?;
        let shares = self.cash / price;
        let next = PortfolioState {
            cash: 0.0,
            shares_held: self.shares_held + shares,
        };
        let trade = Trade {
            date,
            action: TradeAction::Buy,
            price,
            shares,
        };
        Ok((next, trade))
    }

    /// Converts all shares into cash at `price`.
    pub fn sell(self, date: NaiveDate, price: f64) -> Result<(Self, Trade), SmacrossError> {
        check_price(date, price)?;
        let next = PortfolioState {
            cash: self.cash + self.shares_held * price,
            shares_held: 0.0,
        };
        let trade = Trade {
            date,
            action: TradeAction::Sell,
            price,
            shares: self.shares_held,
        };
        Ok((next, trade))
    }
}

/// A fill or mark price must be strictly positive and finite.
pub fn check_price(date: NaiveDate, price: f64) -> Result<(), SmacrossError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(SmacrossError::InvalidPrice { date, price })
    }
}
