#![allow(dead_code)]

use altrader::domain::error::AlTraderError;
pub use altrader::domain::ohlcv::OhlcvBar;
use altrader::domain::portfolio::PortfolioSummary;
use altrader::domain::summary::TradeSummary;
use altrader::domain::watchlist::Watchlist;
use altrader::ports::data_port::PriceHistoryPort;
use altrader::ports::notify_port::NotificationPort;
use altrader::ports::store_port::{PortfolioStore, StoreSnapshot};
use altrader::ports::sync_port::RemoteSyncPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockPriceProvider {
    pub data: HashMap<String, Vec<OhlcvBar>>,
}

impl MockPriceProvider {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, ticker: &str, closes: &[f64]) -> Self {
        self.data.insert(ticker.to_string(), bars_from_closes(ticker, closes));
        self
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }
}

impl PriceHistoryPort for MockPriceProvider {
    fn fetch_all(&self, ticker: &str) -> Result<Vec<OhlcvBar>, AlTraderError> {
        self.data
            .get(ticker)
            .cloned()
            .ok_or_else(|| AlTraderError::NoData {
                ticker: ticker.to_string(),
            })
    }
}

/// In-memory store that records every save.
#[derive(Default)]
pub struct MemoryStore {
    pub snapshot: RefCell<StoreSnapshot>,
    pub saves: RefCell<usize>,
    pub fail_saves: bool,
}

impl MemoryStore {
    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            snapshot: RefCell::new(snapshot),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Default::default()
        }
    }
}

impl PortfolioStore for MemoryStore {
    fn load(&self) -> Result<StoreSnapshot, AlTraderError> {
        Ok(self.snapshot.borrow().clone())
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<(), AlTraderError> {
        if self.fail_saves {
            return Err(AlTraderError::Store {
                reason: "disk full".into(),
            });
        }
        *self.snapshot.borrow_mut() = snapshot.clone();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSync {
    pub synced: RefCell<Vec<StoreSnapshot>>,
    pub fail: bool,
}

impl RemoteSyncPort for RecordingSync {
    fn sync(&self, snapshot: &StoreSnapshot) -> Result<(), AlTraderError> {
        if self.fail {
            return Err(AlTraderError::Sync {
                reason: "remote unreachable".into(),
            });
        }
        self.synced.borrow_mut().push(snapshot.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: RefCell<Vec<TradeSummary>>,
    pub fail: bool,
}

impl NotificationPort for RecordingNotifier {
    fn send(&self, summary: &TradeSummary) -> Result<(), AlTraderError> {
        if self.fail {
            return Err(AlTraderError::Notify {
                reason: "smtp refused".into(),
            });
        }
        self.sent.borrow_mut().push(summary.clone());
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, hour: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(hour, 0, 0).unwrap()
}

pub fn bars_from_closes(ticker: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            ticker: ticker.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        })
        .collect()
}

/// Twenty strictly falling closes ending at `last`: RSI 0, a buy signal.
pub fn falling_to(last: f64) -> Vec<f64> {
    (0..20).map(|i| last + (19 - i) as f64).collect()
}

/// Twenty strictly rising closes ending at `last`: RSI 100, a sell signal.
pub fn rising_to(last: f64) -> Vec<f64> {
    (0..20).map(|i| last - (19 - i) as f64).collect()
}

/// Alternating closes around `level`: RSI 50, no signal.
pub fn flat_at(level: f64) -> Vec<f64> {
    (0..20)
        .map(|i| if i % 2 == 0 { level + 1.0 } else { level - 1.0 })
        .chain(std::iter::once(level))
        .collect()
}

pub fn snapshot_with_cash(cash: f64, tickers: &[&str]) -> StoreSnapshot {
    StoreSnapshot {
        summary: Some(PortfolioSummary::with_cash(cash)),
        watchlist: Watchlist::from_tickers(tickers.iter().copied()),
        ..Default::default()
    }
}
