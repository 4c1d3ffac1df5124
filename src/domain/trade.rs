//! Trade records and the append-only trade ledger.

use chrono::{NaiveDate, NaiveDateTime};

use super::signal::{Signal, TradeSide};

/// An executed paper trade. Immutable once appended to a [`TradeLedger`].
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub timestamp: NaiveDateTime,
    pub ticker: String,
    pub side: TradeSide,
    pub shares: u64,
    /// Notional value: price × shares.
    pub value: f64,
}

/// Append-only ledger, ordered by insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLedger {
    records: Vec<TradeRecord>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted records, keeping their stored order.
    pub fn from_records(records: Vec<TradeRecord>) -> Self {
        TradeLedger { records }
    }

    pub fn append(&mut self, record: TradeRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Side of the most recent trade in `ticker`, neutral if it never traded.
    pub fn last_activity(&self, ticker: &str) -> Signal {
        self.records
            .iter()
            .rev()
            .find(|r| r.ticker == ticker)
            .map_or(Signal::Neutral, |r| r.side.into())
    }

    /// Trades executed on `date`.
    pub fn trades_on(&self, date: NaiveDate) -> Vec<&TradeRecord> {
        self.records
            .iter()
            .filter(|r| r.timestamp.date() == date)
            .collect()
    }
}
