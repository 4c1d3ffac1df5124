//! CSV price history adapter: one `<TICKER>.csv` of daily bars per ticker.

use crate::domain::error::AlTraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::PriceHistoryPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
struct PriceRow {
    #[serde(alias = "Date")]
    date: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{ticker}.csv"))
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    // exports sometimes carry a time component
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl PriceHistoryPort for CsvPriceAdapter {
    fn fetch_all(&self, ticker: &str) -> Result<Vec<OhlcvBar>, AlTraderError> {
        let path = self.csv_path(ticker);
        let no_data = || AlTraderError::NoData {
            ticker: ticker.to_string(),
        };

        let content = fs::read_to_string(&path).map_err(|e| {
            warn!(ticker, path = %path.display(), error = %e, "failed to read price file");
            no_data()
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.deserialize::<PriceRow>() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!(ticker, error = %e, "malformed price file");
                    return Err(no_data());
                }
            };
            let Some(date) = parse_date(&row.date) else {
                warn!(ticker, date = %row.date, "invalid date in price file");
                return Err(no_data());
            };
            if row.close.is_nan() {
                skipped += 1;
                continue;
            }
            bars.push(OhlcvBar {
                ticker: ticker.to_string(),
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume.round() as i64,
            });
        }

        if skipped > 0 {
            debug!(ticker, skipped, "dropped bars without a close");
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n";
        fs::write(path.join("AAPL.csv"), csv_content).unwrap();

        fs::write(
            path.join("WMT.csv"),
            "Date,Open,High,Low,Close,Volume\n\
             2024-01-15 00:00:00-05:00,50.0,51.0,49.0,50.5,1000.0\n\
             2024-01-16 00:00:00-05:00,50.5,52.0,50.0,NaN,1100.0\n",
        )
        .unwrap();
        fs::write(path.join("BAD.csv"), "date,open,high,low,close,volume\nyesterday,1,1,1,1,1\n")
            .unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_all_returns_sorted_bars() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let bars = adapter.fetch_all("AAPL").unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[2].close, 115.0);
    }

    #[test]
    fn fetch_recent_keeps_latest_bars() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let bars = adapter.fetch_recent("AAPL", 2).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    }

    #[test]
    fn capitalised_headers_and_missing_closes() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let bars = adapter.fetch_all("WMT").unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 50.5);
        assert_eq!(bars[0].volume, 1000);
    }

    #[test]
    fn missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        let err = adapter.fetch_all("XYZ").unwrap_err();
        assert!(matches!(err, AlTraderError::NoData { ticker } if ticker == "XYZ"));
    }

    #[test]
    fn invalid_date_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert!(adapter.fetch_all("BAD").is_err());
    }
}
