//! Persistent store port trait.

use crate::domain::error::AlTraderError;
use crate::domain::portfolio::{Holdings, PortfolioHistory, PortfolioSummary};
use crate::domain::trade::TradeLedger;
use crate::domain::watchlist::Watchlist;

/// Every table the trader reads at start and writes at end of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    /// `None` when the store has never recorded a portfolio.
    pub summary: Option<PortfolioSummary>,
    pub holdings: Holdings,
    pub watchlist: Watchlist,
    pub ledger: TradeLedger,
    pub history: PortfolioHistory,
}

pub trait PortfolioStore {
    fn load(&self) -> Result<StoreSnapshot, AlTraderError>;
    fn save(&self, snapshot: &StoreSnapshot) -> Result<(), AlTraderError>;
}
