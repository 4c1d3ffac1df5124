//! Feature and label construction for the price-prediction training set.
//!
//! Per ticker: base price columns and close-based indicators, rolling
//! aggregates of each base column, the benchmark's columns joined by date
//! (prefixed `market_`), relative deltas of every column, and forward close
//! labels. Rows with any missing value are dropped.

use chrono::NaiveDate;

use super::frame::Frame;
use super::rolling::{lead, pct_change, RollingFn};
use crate::domain::error::AlTraderError;
use crate::domain::indicator::bollinger::bollinger_series;
use crate::domain::indicator::macd::macd_histogram_series;
use crate::domain::indicator::rsi::rsi_series;
use crate::domain::indicator::IndicatorParams;
use crate::domain::ohlcv::{closes, OhlcvBar};

pub const DEFAULT_BENCHMARK: &str = "VTSMX";
pub const DEFAULT_PERIODS: [usize; 4] = [5, 10, 21, 65];
pub const MARKET_PREFIX: &str = "market_";
pub const NO_SECTOR: &str = "No Sector";

pub const BASE_COLUMNS: [&str; 11] = [
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "rsi",
    "macd_hist",
    "bb_upper_band",
    "bb_upper_diff",
    "bb_lower_band",
    "bb_lower_diff",
];

/// Forward label columns and how many rows ahead each looks.
pub const LABELS: [(&str, usize); 5] = [
    ("next_close", 1),
    ("next_close_2", 2),
    ("next_close_3", 3),
    ("next_close_5", 5),
    ("next_close_10", 10),
];

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    pub benchmark: String,
    pub periods: Vec<usize>,
    pub params: IndicatorParams,
    /// Feature columns to keep, in order. `None` keeps every column.
    pub whitelist: Option<Vec<String>>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            benchmark: DEFAULT_BENCHMARK.to_string(),
            periods: DEFAULT_PERIODS.to_vec(),
            params: IndicatorParams::default(),
            whitelist: None,
        }
    }
}

impl DatasetConfig {
    /// Bars needed before the first complete row can exist.
    pub fn required_bars(&self) -> usize {
        let p = &self.params;
        let indicator_warmup = [
            p.rsi_period,
            (p.macd_slow + p.macd_signal).saturating_sub(2),
            p.bollinger_period.saturating_sub(1),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        let rolling_warmup = self.periods.iter().max().map_or(0, |m| m.saturating_sub(1));
        let max_lead = LABELS.iter().map(|(_, n)| *n).max().unwrap_or(0);
        // one row for the delta, one row to keep
        indicator_warmup + rolling_warmup + 1 + max_lead + 1
    }
}

/// One ticker's finished training rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerDataset {
    pub ticker: String,
    pub sector: String,
    pub features: Frame,
    pub labels: Frame,
}

/// Price columns plus RSI, MACD histogram and Bollinger bands, one row per
/// bar.
pub fn base_frame(bars: &[OhlcvBar], params: &IndicatorParams) -> Frame {
    let close = closes(bars);
    let mut frame = Frame::new(bars.iter().map(|b| b.date).collect());
    frame.push("Open", bars.iter().map(|b| Some(b.open)).collect());
    frame.push("High", bars.iter().map(|b| Some(b.high)).collect());
    frame.push("Low", bars.iter().map(|b| Some(b.low)).collect());
    frame.push("Close", close.iter().copied().map(Some).collect());
    frame.push("Volume", bars.iter().map(|b| Some(b.volume as f64)).collect());
    frame.push("rsi", rsi_series(&close, params.rsi_period));
    frame.push(
        "macd_hist",
        macd_histogram_series(&close, params.macd_fast, params.macd_slow, params.macd_signal),
    );

    let bands = bollinger_series(&close, params.bollinger_period, params.bollinger_mult);
    frame.push("bb_upper_band", bands.iter().map(|b| b.map(|b| b.upper)).collect());
    frame.push(
        "bb_upper_diff",
        bands
            .iter()
            .zip(&close)
            .map(|(b, c)| b.map(|b| b.upper - c))
            .collect(),
    );
    frame.push("bb_lower_band", bands.iter().map(|b| b.map(|b| b.lower)).collect());
    frame.push(
        "bb_lower_diff",
        bands
            .iter()
            .zip(&close)
            .map(|(b, c)| b.map(|b| c - b.lower))
            .collect(),
    );
    frame
}

/// Rolling aggregates of every base column, named `<column>_<fn>_<period>`.
pub fn add_rolling_columns(frame: &mut Frame, periods: &[usize]) {
    for col in BASE_COLUMNS {
        let Some(values) = frame.get(col).map(<[Option<f64>]>::to_vec) else {
            continue;
        };
        for func in RollingFn::ALL {
            for &period in periods {
                frame.push(format!("{col}_{func}_{period}"), func.apply(&values, period));
            }
        }
    }
}

/// Benchmark table ready to join: base, rolling and `next_close` columns,
/// all prefixed with `market_`.
pub fn benchmark_frame(bars: &[OhlcvBar], config: &DatasetConfig) -> Frame {
    let mut frame = base_frame(bars, &config.params);
    add_rolling_columns(&mut frame, &config.periods);
    let next = frame.get("Close").map(|c| lead(c, 1)).unwrap_or_default();
    frame.push("next_close", next);
    frame.with_prefix(MARKET_PREFIX)
}

pub fn build_ticker_dataset(
    ticker: &str,
    bars: &[OhlcvBar],
    benchmark: &Frame,
    config: &DatasetConfig,
) -> Result<TickerDataset, AlTraderError> {
    if bars.is_empty() {
        return Err(AlTraderError::NoData {
            ticker: ticker.to_string(),
        });
    }

    let mut asset = base_frame(bars, &config.params);
    add_rolling_columns(&mut asset, &config.periods);
    let joined = asset.inner_join(benchmark);

    let mut combined = Frame::new(joined.dates().to_vec());
    for col in BASE_COLUMNS {
        if let Some(values) = joined.get(col) {
            combined.push(col, values.to_vec());
        }
    }
    for col in joined.columns() {
        if col.name.contains("z_score") {
            combined.push(col.name.clone(), col.values.clone());
        }
    }
    for col in joined.columns() {
        combined.push(format!("{}_delta", col.name), pct_change(&col.values));
    }

    let close = joined.get("Close").map(<[Option<f64>]>::to_vec).unwrap_or_default();
    for (name, n) in LABELS {
        combined.push(name, lead(&close, n));
    }

    combined.drop_all_missing_columns();
    combined.drop_incomplete_rows();
    if combined.is_empty() {
        return Err(AlTraderError::InsufficientData {
            ticker: ticker.to_string(),
            bars: bars.len(),
            minimum: config.required_bars(),
        });
    }

    let label_names: Vec<&str> = LABELS.iter().map(|(name, _)| *name).collect();
    let labels = combined.select(&label_names);
    let feature_names: Vec<String> = match &config.whitelist {
        Some(list) => list.clone(),
        None => combined
            .column_names()
            .into_iter()
            .filter(|name| !label_names.contains(name))
            .map(str::to_string)
            .collect(),
    };
    let features = combined.select(&feature_names);

    Ok(TickerDataset {
        ticker: ticker.to_string(),
        sector: NO_SECTOR.to_string(),
        features,
        labels,
    })
}

/// First and last date of the kept rows.
pub fn date_span(dataset: &TickerDataset) -> Option<(NaiveDate, NaiveDate)> {
    let dates = dataset.features.dates();
    Some((*dates.first()?, *dates.last()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bars(ticker: &str, n: usize, start: f64) -> Vec<OhlcvBar> {
        (0..n)
            .map(|i| {
                // wobble keeps every rolling stdev non-zero
                let close = start + i as f64 * 0.5 + if i % 2 == 0 { 1.0 } else { -1.0 };
                OhlcvBar {
                    ticker: ticker.to_string(),
                    date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
                        + chrono::Duration::days(i as i64),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000 + (i as i64 % 7) * 10,
                }
            })
            .collect()
    }

    fn small_config() -> DatasetConfig {
        DatasetConfig {
            periods: vec![3, 5],
            ..Default::default()
        }
    }

    #[test]
    fn base_frame_has_all_base_columns() {
        let frame = base_frame(&bars("AAPL", 40, 100.0), &IndicatorParams::default());
        assert_eq!(frame.column_names(), BASE_COLUMNS.to_vec());
        assert_eq!(frame.len(), 40);
        assert_eq!(frame.get("rsi").unwrap()[13], None);
        assert!(frame.get("rsi").unwrap()[14].is_some());
    }

    #[test]
    fn bollinger_diffs_are_distances_from_close() {
        let frame = base_frame(&bars("AAPL", 30, 100.0), &IndicatorParams::default());
        let i = 25;
        let close = frame.get("Close").unwrap()[i].unwrap();
        let upper = frame.get("bb_upper_band").unwrap()[i].unwrap();
        let diff = frame.get("bb_upper_diff").unwrap()[i].unwrap();
        assert_relative_eq!(diff, upper - close, epsilon = 1e-12);
    }

    #[test]
    fn rolling_columns_are_named_by_fn_and_period() {
        let mut frame = base_frame(&bars("AAPL", 30, 100.0), &IndicatorParams::default());
        add_rolling_columns(&mut frame, &[5]);
        assert!(frame.get("Close_rolling_mean_5").is_some());
        assert!(frame.get("Volume_z_score_5").is_some());
        assert!(frame.get("rsi_rolling_stdev_5").is_some());
    }

    #[test]
    fn benchmark_columns_are_prefixed() {
        let frame = benchmark_frame(&bars("VTSMX", 40, 50.0), &small_config());
        assert!(frame.get("market_Close").is_some());
        assert!(frame.get("market_next_close").is_some());
        assert!(frame.column_names().iter().all(|n| n.starts_with(MARKET_PREFIX)));
    }

    #[test]
    fn dataset_rows_are_complete_with_forward_labels() {
        let config = small_config();
        let benchmark = benchmark_frame(&bars("VTSMX", 120, 50.0), &config);
        let asset_bars = bars("AAPL", 120, 100.0);
        let dataset = build_ticker_dataset("AAPL", &asset_bars, &benchmark, &config).unwrap();

        assert!(!dataset.features.is_empty());
        assert_eq!(dataset.features.dates(), dataset.labels.dates());
        assert_eq!(dataset.sector, NO_SECTOR);
        for i in 0..dataset.features.len() {
            let (_, values) = dataset.features.row(i).unwrap();
            assert!(values.iter().all(Option::is_some));
        }

        // next_close is the following bar's close
        let (date, labels) = dataset.labels.row(0).unwrap();
        let idx = asset_bars.iter().position(|b| b.date == date).unwrap();
        assert_relative_eq!(labels[0].unwrap(), asset_bars[idx + 1].close);
        assert_relative_eq!(labels[4].unwrap(), asset_bars[idx + 10].close);

        // the last ten bars cannot carry a 10-day label
        let last = *dataset.labels.dates().last().unwrap();
        assert!(last <= asset_bars[asset_bars.len() - 11].date);
    }

    #[test]
    fn features_include_market_and_delta_columns() {
        let config = small_config();
        let benchmark = benchmark_frame(&bars("VTSMX", 120, 50.0), &config);
        let dataset =
            build_ticker_dataset("AAPL", &bars("AAPL", 120, 100.0), &benchmark, &config).unwrap();
        let names = dataset.features.column_names();
        assert!(names.contains(&"Close"));
        assert!(names.contains(&"Close_z_score_5"));
        assert!(names.contains(&"market_Close_z_score_5"));
        assert!(names.contains(&"Close_delta"));
        assert!(names.contains(&"market_Close_delta"));
        assert!(!names.contains(&"next_close"));
    }

    #[test]
    fn whitelist_restricts_features() {
        let mut config = small_config();
        config.whitelist = Some(vec!["Close".into(), "rsi".into(), "missing".into()]);
        let benchmark = benchmark_frame(&bars("VTSMX", 120, 50.0), &config);
        let dataset =
            build_ticker_dataset("AAPL", &bars("AAPL", 120, 100.0), &benchmark, &config).unwrap();
        assert_eq!(dataset.features.column_names(), vec!["Close", "rsi"]);
    }

    #[test]
    fn short_history_is_insufficient() {
        let config = small_config();
        let benchmark = benchmark_frame(&bars("VTSMX", 20, 50.0), &config);
        let err =
            build_ticker_dataset("AAPL", &bars("AAPL", 20, 100.0), &benchmark, &config).unwrap_err();
        assert!(matches!(err, AlTraderError::InsufficientData { bars: 20, .. }));
    }

    #[test]
    fn disjoint_dates_are_insufficient() {
        let config = small_config();
        let mut bench_bars = bars("VTSMX", 120, 50.0);
        for b in &mut bench_bars {
            b.date = b.date + chrono::Duration::days(1_000);
        }
        let benchmark = benchmark_frame(&bench_bars, &config);
        assert!(build_ticker_dataset("AAPL", &bars("AAPL", 120, 100.0), &benchmark, &config).is_err());
    }

    #[test]
    fn required_bars_covers_warmups() {
        let config = DatasetConfig::default();
        // macd 26+9-2, rolling 65-1, delta, ten-day lead, one kept row
        assert_eq!(config.required_bars(), 33 + 64 + 1 + 10 + 1);
    }
}
