//! Per-run view of one watchlist ticker.

use super::error::AlTraderError;
use super::indicator::{IndicatorParams, IndicatorReadings};
use super::ohlcv::{closes, trend_pct, OhlcvBar};
use super::portfolio::{Holding, Holdings};
use super::signal::{Signal, TradeSide};
use super::trade::TradeLedger;

/// Transient state for one ticker during one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub ticker: String,
    pub price: f64,
    /// Percent change between the last two closes.
    pub trend: Option<f64>,
    pub indicators: IndicatorReadings,
    pub shares: u64,
    pub cost_basis: f64,
    /// Signed cash effect of the trade executed this run: negative for a buy.
    pub cash_change: f64,
    pub last_activity: Signal,
}

impl Asset {
    pub fn new(ticker: &str) -> Self {
        Asset {
            ticker: ticker.to_string(),
            price: 0.0,
            trend: None,
            indicators: IndicatorReadings::default(),
            shares: 0,
            cost_basis: 0.0,
            cash_change: 0.0,
            last_activity: Signal::Neutral,
        }
    }

    /// Build the asset from its price history, current holding and trade
    /// history. `bars` must be sorted oldest first.
    pub fn initialize(
        ticker: &str,
        bars: &[OhlcvBar],
        params: &IndicatorParams,
        holdings: &Holdings,
        ledger: &TradeLedger,
    ) -> Result<Self, AlTraderError> {
        let last = bars.last().ok_or_else(|| AlTraderError::NoData {
            ticker: ticker.to_string(),
        })?;
        if last.close.is_nan() || last.close <= 0.0 {
            return Err(AlTraderError::NoData {
                ticker: ticker.to_string(),
            });
        }

        let (shares, cost_basis) = holdings
            .get(ticker)
            .map_or((0, 0.0), |h| (h.shares, h.cost_basis));

        Ok(Asset {
            ticker: ticker.to_string(),
            price: last.close,
            trend: trend_pct(bars),
            indicators: IndicatorReadings::evaluate(&closes(bars), params),
            shares,
            cost_basis,
            cash_change: 0.0,
            last_activity: ledger.last_activity(ticker),
        })
    }

    pub fn is_priced(&self) -> bool {
        self.price > 0.0
    }

    pub fn market_value(&self) -> f64 {
        self.shares as f64 * self.price
    }

    /// Snapshot for the holdings table.
    pub fn compiled(&self) -> Holding {
        Holding {
            ticker: self.ticker.clone(),
            shares: self.shares,
            price: self.price,
            value: self.market_value(),
            cost_basis: self.cost_basis,
        }
    }

    /// Apply an approved fill. Callers validate `count` against the held
    /// shares before calling.
    pub(crate) fn fill(&mut self, side: TradeSide, count: u64) {
        let notional = self.price * count as f64;
        match side {
            TradeSide::Buy => {
                let held_cost = self.cost_basis * self.shares as f64;
                self.shares += count;
                self.cost_basis = (held_cost + notional) / self.shares as f64;
                self.cash_change = -notional;
            }
            TradeSide::Sell => {
                self.shares -= count;
                if self.shares == 0 {
                    self.cost_basis = 0.0;
                }
                self.cash_change = notional;
            }
        }
        self.last_activity = side.into();
    }
}
