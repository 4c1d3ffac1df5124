//! Price history port trait.

use crate::domain::error::AlTraderError;
use crate::domain::ohlcv::OhlcvBar;

pub trait PriceHistoryPort {
    /// Full daily history for `ticker`, oldest first.
    fn fetch_all(&self, ticker: &str) -> Result<Vec<OhlcvBar>, AlTraderError>;

    /// The most recent `days` bars for `ticker`, oldest first. May return
    /// fewer bars when the history is shorter.
    fn fetch_recent(&self, ticker: &str, days: usize) -> Result<Vec<OhlcvBar>, AlTraderError> {
        let mut bars = self.fetch_all(ticker)?;
        if bars.len() > days {
            bars.drain(..bars.len() - days);
        }
        Ok(bars)
    }
}
