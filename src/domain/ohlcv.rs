//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Closing prices of `bars`, oldest first.
pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Percent change between the last two closes, `None` with fewer than two
/// bars or a zero previous close.
pub fn trend_pct(bars: &[OhlcvBar]) -> Option<f64> {
    match bars {
        [.., prev, last] if prev.close != 0.0 => {
            Some((last.close - prev.close) / prev.close * 100.0)
        }
        _ => None,
    }
}
