//! Watchlist: the tracked tickers and their latest evaluated values.
//!
//! Parses ticker lists from configuration and keeps one row per ticker that
//! is rewritten every run regardless of trade outcome.

use std::cmp::Ordering;
use std::collections::HashSet;

use super::asset::Asset;

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum WatchlistError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, WatchlistError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(WatchlistError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(WatchlistError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WatchlistEntry {
    pub ticker: String,
    pub price: Option<f64>,
    pub trend: Option<f64>,
    pub rsi: Option<f64>,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
}

impl WatchlistEntry {
    pub fn new(ticker: &str) -> Self {
        WatchlistEntry {
            ticker: ticker.to_string(),
            ..Default::default()
        }
    }

    fn refresh(&mut self, asset: &Asset) {
        let readings = &asset.indicators;
        self.price = Some(asset.price);
        self.trend = asset.trend;
        self.rsi = readings.rsi;
        self.sma = readings.sma;
        self.ema = readings.ema;
        self.macd_histogram = readings.macd_histogram;
        self.bb_upper = readings.bollinger.map(|b| b.upper);
        self.bb_lower = readings.bollinger.map(|b| b.lower);
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Watchlist {
    entries: Vec<WatchlistEntry>,
}

impl Watchlist {
    pub fn from_entries(entries: Vec<WatchlistEntry>) -> Self {
        Watchlist { entries }
    }

    pub fn from_tickers<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Watchlist {
            entries: tickers
                .into_iter()
                .map(|t| WatchlistEntry::new(t.as_ref()))
                .collect(),
        }
    }

    pub fn tickers(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.ticker.clone()).collect()
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn get(&self, ticker: &str) -> Option<&WatchlistEntry> {
        self.entries.iter().find(|e| e.ticker == ticker)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite the row for `asset.ticker`, adding it when untracked.
    pub fn update(&mut self, asset: &Asset) {
        match self.entries.iter_mut().find(|e| e.ticker == asset.ticker) {
            Some(entry) => entry.refresh(asset),
            None => {
                let mut entry = WatchlistEntry::new(&asset.ticker);
                entry.refresh(asset);
                self.entries.push(entry);
            }
        }
    }

    /// Stable sort by RSI ascending; rows without an RSI go last.
    pub fn sort_by_rsi(&mut self) {
        self.entries.sort_by(|a, b| match (a.rsi, b.rsi) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
}
