//! Training dataset builder for next-close regression.

pub mod features;
pub mod frame;
pub mod rolling;

use tracing::{info, warn};

use crate::domain::error::AlTraderError;
use crate::ports::data_port::PriceHistoryPort;

pub use features::{DatasetConfig, TickerDataset};
pub use frame::Frame;

/// Build one dataset per ticker against the configured benchmark.
///
/// A missing benchmark aborts; tickers without enough history are logged
/// and left out.
pub fn build_datasets(
    prices: &dyn PriceHistoryPort,
    tickers: &[String],
    config: &DatasetConfig,
) -> Result<Vec<TickerDataset>, AlTraderError> {
    let benchmark_bars = prices.fetch_all(&config.benchmark)?;
    if benchmark_bars.is_empty() {
        return Err(AlTraderError::NoData {
            ticker: config.benchmark.clone(),
        });
    }
    let benchmark = features::benchmark_frame(&benchmark_bars, config);

    let mut datasets = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let result = prices
            .fetch_all(ticker)
            .and_then(|bars| features::build_ticker_dataset(ticker, &bars, &benchmark, config));
        match result {
            Ok(dataset) => {
                info!(
                    ticker = %ticker,
                    rows = dataset.features.len(),
                    columns = dataset.features.columns().len(),
                    "built dataset"
                );
                datasets.push(dataset);
            }
            Err(e) if e.is_ticker_local() => {
                warn!(ticker = %ticker, error = %e, "skipping dataset");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(datasets)
}
