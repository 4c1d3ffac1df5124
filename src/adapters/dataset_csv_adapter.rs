//! Training dataset export: `features/<TICKER>.csv` and
//! `labels/<TICKER>.csv` under the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::dataset::TickerDataset;
use crate::domain::error::AlTraderError;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn store_err(path: &Path, e: impl std::fmt::Display) -> AlTraderError {
    AlTraderError::Store {
        reason: format!("failed to write {}: {e}", path.display()),
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Feature whitelist: one column name per line, first field only.
pub fn read_feature_whitelist(path: &Path) -> Result<Vec<String>, AlTraderError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AlTraderError::ConfigInvalid {
            section: "dataset".into(),
            key: "features_file".into(),
            reason: e.to_string(),
        })?;
    let mut names = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| AlTraderError::ConfigInvalid {
            section: "dataset".into(),
            key: "features_file".into(),
            reason: e.to_string(),
        })?;
        if let Some(name) = record.get(0).filter(|n| !n.is_empty()) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

pub struct DatasetCsvWriter {
    output: PathBuf,
}

impl DatasetCsvWriter {
    pub fn new(output: PathBuf) -> Self {
        Self { output }
    }

    pub fn features_path(&self, ticker: &str) -> PathBuf {
        self.output.join("features").join(format!("{ticker}.csv"))
    }

    pub fn labels_path(&self, ticker: &str) -> PathBuf {
        self.output.join("labels").join(format!("{ticker}.csv"))
    }

    pub fn write(&self, dataset: &TickerDataset) -> Result<(), AlTraderError> {
        let features = self.features_path(&dataset.ticker);
        let labels = self.labels_path(&dataset.ticker);
        for path in [&features, &labels] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| store_err(parent, e))?;
            }
        }

        let mut wtr = csv::Writer::from_path(&features).map_err(|e| store_err(&features, e))?;
        let mut header = vec!["Date".to_string(), "sector".to_string()];
        header.extend(dataset.features.column_names().into_iter().map(str::to_string));
        wtr.write_record(&header).map_err(|e| store_err(&features, e))?;
        for i in 0..dataset.features.len() {
            let Some((date, values)) = dataset.features.row(i) else {
                break;
            };
            let mut record = vec![date.format(DATE_FORMAT).to_string(), dataset.sector.clone()];
            record.extend(values.into_iter().map(cell));
            wtr.write_record(&record).map_err(|e| store_err(&features, e))?;
        }
        wtr.flush().map_err(|e| store_err(&features, e))?;

        let mut wtr = csv::Writer::from_path(&labels).map_err(|e| store_err(&labels, e))?;
        let mut header = vec!["Date".to_string(), "Ticker".to_string()];
        header.extend(dataset.labels.column_names().into_iter().map(str::to_string));
        wtr.write_record(&header).map_err(|e| store_err(&labels, e))?;
        for i in 0..dataset.labels.len() {
            let Some((date, values)) = dataset.labels.row(i) else {
                break;
            };
            let mut record = vec![date.format(DATE_FORMAT).to_string(), dataset.ticker.clone()];
            record.extend(values.into_iter().map(cell));
            wtr.write_record(&record).map_err(|e| store_err(&labels, e))?;
        }
        wtr.flush().map_err(|e| store_err(&labels, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Frame;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn dataset() -> TickerDataset {
        let dates = vec![
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        ];
        let mut features = Frame::new(dates.clone());
        features.push("Close", vec![Some(10.0), Some(10.5)]);
        features.push("rsi", vec![Some(40.0), Some(42.5)]);
        let mut labels = Frame::new(dates);
        labels.push("next_close", vec![Some(10.5), Some(11.0)]);
        TickerDataset {
            ticker: "AAPL".into(),
            sector: "No Sector".into(),
            features,
            labels,
        }
    }

    #[test]
    fn writes_features_and_labels() {
        let dir = TempDir::new().unwrap();
        let writer = DatasetCsvWriter::new(dir.path().to_path_buf());
        writer.write(&dataset()).unwrap();

        let features = fs::read_to_string(writer.features_path("AAPL")).unwrap();
        let mut lines = features.lines();
        assert_eq!(lines.next(), Some("Date,sector,Close,rsi"));
        assert_eq!(lines.next(), Some("2024-01-02,No Sector,10,40"));

        let labels = fs::read_to_string(writer.labels_path("AAPL")).unwrap();
        assert!(labels.starts_with("Date,Ticker,next_close\n2024-01-02,AAPL,10.5\n"));
    }

    #[test]
    fn whitelist_reads_first_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("features.csv");
        fs::write(&path, "Close\nrsi\n\nmarket_Close_delta\n").unwrap();
        assert_eq!(
            read_feature_whitelist(&path).unwrap(),
            vec!["Close", "rsi", "market_Close_delta"]
        );
    }
}
