//! CSV workbook store: the five tables as `<table>.csv` files in one
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::tables::{
    Tables, PORTFOLIO_TABLE, STOCKS_TABLE, SUMMARY_TABLE, TRADES_TABLE, WATCHLIST_TABLE,
};
use crate::domain::error::AlTraderError;
use crate::ports::store_port::{PortfolioStore, StoreSnapshot};

pub struct CsvWorkbookStore {
    dir: PathBuf,
}

impl CsvWorkbookStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }

    /// Rows of `table`; a missing file is an empty table.
    fn read_table<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>, AlTraderError> {
        let path = self.table_path(table);
        if !path.exists() {
            debug!(table, "table file absent, starting empty");
            return Ok(Vec::new());
        }
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| AlTraderError::Store {
                reason: format!("failed to open {}: {e}", path.display()),
            })?;
        rdr.deserialize()
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| AlTraderError::Integrity {
                reason: format!("{table}: {e}"),
            })
    }

    /// Write through a sibling temp file so a failed write never truncates
    /// the previous table.
    fn write_table<T: Serialize>(
        &self,
        table: &str,
        rows: &[T],
        header: &[&str],
    ) -> Result<(), AlTraderError> {
        let path = self.table_path(table);
        let tmp = self.dir.join(format!(".{table}.csv.tmp"));
        let store_err = |e: &dyn std::fmt::Display| AlTraderError::Store {
            reason: format!("failed to write {}: {e}", path.display()),
        };

        {
            let mut wtr = csv::WriterBuilder::new()
                .has_headers(!rows.is_empty())
                .from_path(&tmp)
                .map_err(|e| store_err(&e))?;
            if rows.is_empty() {
                wtr.write_record(header).map_err(|e| store_err(&e))?;
            }
            for row in rows {
                wtr.serialize(row).map_err(|e| store_err(&e))?;
            }
            wtr.flush().map_err(|e| store_err(&e))?;
        }
        fs::rename(&tmp, &path).map_err(|e| store_err(&e))?;
        Ok(())
    }
}

impl PortfolioStore for CsvWorkbookStore {
    fn load(&self) -> Result<StoreSnapshot, AlTraderError> {
        let tables = Tables {
            watchlist: self.read_table(WATCHLIST_TABLE)?,
            stocks: self.read_table(STOCKS_TABLE)?,
            portfolio: self.read_table(PORTFOLIO_TABLE)?,
            trades: self.read_table(TRADES_TABLE)?,
            summary: self.read_table(SUMMARY_TABLE)?,
        };
        tables.into_snapshot()
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<(), AlTraderError> {
        fs::create_dir_all(&self.dir).map_err(|e| AlTraderError::Store {
            reason: format!("failed to create {}: {e}", self.dir.display()),
        })?;
        let tables = Tables::from_snapshot(snapshot);
        self.write_table(
            WATCHLIST_TABLE,
            &tables.watchlist,
            &[
                "ticker",
                "price",
                "trend",
                "rsi",
                "sma",
                "ema",
                "macd_histogram",
                "bb_upper",
                "bb_lower",
            ],
        )?;
        self.write_table(
            STOCKS_TABLE,
            &tables.stocks,
            &["ticker", "shares", "price", "value", "cost_basis"],
        )?;
        self.write_table(PORTFOLIO_TABLE, &tables.portfolio, &["label", "value"])?;
        self.write_table(
            TRADES_TABLE,
            &tables.trades,
            &["timestamp", "ticker", "side", "shares", "value"],
        )?;
        self.write_table(
            SUMMARY_TABLE,
            &tables.summary,
            &["timestamp", "cash", "stocks", "total"],
        )?;
        debug!(dir = %self.dir.display(), "saved workbook");
        Ok(())
    }
}
