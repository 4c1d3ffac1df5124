//! Holdings, portfolio summary and daily portfolio history.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

/// A currently-owned position, keyed by ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub ticker: String,
    pub shares: u64,
    pub price: f64,
    pub value: f64,
    /// Average cost per share.
    pub cost_basis: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Holdings {
    positions: BTreeMap<String, Holding>,
}

impl Holdings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ticker: &str) -> Option<&Holding> {
        self.positions.get(ticker)
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.positions.contains_key(ticker)
    }

    /// Insert or replace the holding for `holding.ticker`. A zero-share
    /// holding removes the position instead.
    pub fn upsert(&mut self, holding: Holding) {
        if holding.shares == 0 {
            self.positions.remove(&holding.ticker);
        } else {
            self.positions.insert(holding.ticker.clone(), holding);
        }
    }

    pub fn remove(&mut self, ticker: &str) -> Option<Holding> {
        self.positions.remove(ticker)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Holding> {
        self.positions.values()
    }

    pub fn total_value(&self) -> f64 {
        self.positions.values().map(|h| h.value).sum()
    }
}

/// CASH / STOCKS / TOTAL.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PortfolioSummary {
    pub cash: f64,
    pub stocks: f64,
    pub total: f64,
}

impl PortfolioSummary {
    pub fn with_cash(cash: f64) -> Self {
        PortfolioSummary {
            cash,
            stocks: 0.0,
            total: cash,
        }
    }

    /// Revalue STOCKS from `holdings` and recompute TOTAL.
    pub fn settle(&mut self, holdings: &Holdings) {
        self.stocks = holdings.total_value();
        self.total = self.cash + self.stocks;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryRow {
    pub timestamp: NaiveDateTime,
    pub summary: PortfolioSummary,
}

/// One summary snapshot per calendar day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioHistory {
    rows: BTreeMap<NaiveDate, HistoryRow>,
}

impl PortfolioHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot, replacing any earlier snapshot of the same day.
    pub fn record(&mut self, timestamp: NaiveDateTime, summary: PortfolioSummary) {
        self.rows
            .insert(timestamp.date(), HistoryRow { timestamp, summary });
    }

    pub fn get(&self, date: NaiveDate) -> Option<&HistoryRow> {
        self.rows.get(&date)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in date order.
    pub fn rows(&self) -> impl Iterator<Item = &HistoryRow> {
        self.rows.values()
    }
}
