//! SQLite portfolio store.
//!
//! Same five tables as the CSV workbook. A save is one transaction; the
//! trade ledger is append-only at the database level too: only records
//! beyond the stored count are inserted.

use crate::adapters::tables::{PortfolioRow, StockRow, SummaryRow, Tables, TradeRow, WatchlistRow};
use crate::domain::error::AlTraderError;
use crate::domain::signal::TradeSide;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::{PortfolioStore, StoreSnapshot};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::debug;

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> AlTraderError {
    AlTraderError::StoreQuery {
        reason: e.to_string(),
    }
}

fn pool_err(e: r2d2::Error) -> AlTraderError {
    AlTraderError::Store {
        reason: e.to_string(),
    }
}

impl SqliteStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AlTraderError> {
        let db_path = config
            .get_string("store", "path")
            .ok_or_else(|| AlTraderError::ConfigMissing {
                section: "store".into(),
                key: "path".into(),
            })?;
        Self::open(&db_path)
    }

    pub fn open(db_path: &str) -> Result<Self, AlTraderError> {
        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder().max_size(2).build(manager).map_err(pool_err)?;
        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, AlTraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(pool_err)?;
        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, AlTraderError> {
        self.pool.get().map_err(pool_err)
    }

    pub fn initialize_schema(&self) -> Result<(), AlTraderError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS watchlist (
                    position INTEGER PRIMARY KEY,
                    ticker TEXT NOT NULL UNIQUE,
                    price REAL, trend REAL, rsi REAL, sma REAL, ema REAL,
                    macd_histogram REAL, bb_upper REAL, bb_lower REAL
                );
                CREATE TABLE IF NOT EXISTS stocks (
                    ticker TEXT PRIMARY KEY,
                    shares INTEGER NOT NULL CHECK (shares >= 0),
                    price REAL NOT NULL,
                    value REAL NOT NULL,
                    cost_basis REAL NOT NULL DEFAULT 0
                );
                CREATE TABLE IF NOT EXISTS portfolio (
                    label TEXT PRIMARY KEY,
                    value REAL NOT NULL
                );
                CREATE TABLE IF NOT EXISTS trades (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp TEXT NOT NULL,
                    ticker TEXT NOT NULL,
                    side TEXT NOT NULL,
                    shares INTEGER NOT NULL,
                    value REAL NOT NULL
                );
                CREATE TABLE IF NOT EXISTS summary (
                    timestamp TEXT PRIMARY KEY,
                    cash REAL NOT NULL,
                    stocks REAL NOT NULL,
                    total REAL NOT NULL
                );",
            )
            .map_err(query_err)
    }

    fn load_tables(&self) -> Result<Tables, AlTraderError> {
        let conn = self.conn()?;

        let watchlist = conn
            .prepare(
                "SELECT ticker, price, trend, rsi, sma, ema, macd_histogram, bb_upper, bb_lower
                 FROM watchlist ORDER BY position",
            )
            .map_err(query_err)?
            .query_map([], |row| {
                Ok(WatchlistRow {
                    ticker: row.get(0)?,
                    price: row.get(1)?,
                    trend: row.get(2)?,
                    rsi: row.get(3)?,
                    sma: row.get(4)?,
                    ema: row.get(5)?,
                    macd_histogram: row.get(6)?,
                    bb_upper: row.get(7)?,
                    bb_lower: row.get(8)?,
                })
            })
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;

        let stocks = conn
            .prepare("SELECT ticker, shares, price, value, cost_basis FROM stocks ORDER BY ticker")
            .map_err(query_err)?
            .query_map([], |row| {
                let shares: i64 = row.get(1)?;
                Ok(StockRow {
                    ticker: row.get(0)?,
                    shares: shares.max(0) as u64,
                    price: row.get(2)?,
                    value: row.get(3)?,
                    cost_basis: row.get(4)?,
                })
            })
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;

        let portfolio = conn
            .prepare("SELECT label, value FROM portfolio")
            .map_err(query_err)?
            .query_map([], |row| {
                Ok(PortfolioRow {
                    label: row.get(0)?,
                    value: row.get(1)?,
                })
            })
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;

        let raw_trades = conn
            .prepare("SELECT timestamp, ticker, side, shares, value FROM trades ORDER BY id")
            .map_err(query_err)?
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            })
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;
        let mut trades = Vec::with_capacity(raw_trades.len());
        for (timestamp, ticker, side, shares, value) in raw_trades {
            let side: TradeSide = side.parse().map_err(|reason| AlTraderError::Integrity {
                reason: format!("trades: {reason}"),
            })?;
            if shares <= 0 {
                return Err(AlTraderError::Integrity {
                    reason: format!("trades: non-positive share count for {ticker}"),
                });
            }
            trades.push(TradeRow {
                timestamp,
                ticker,
                side,
                shares: shares as u64,
                value,
            });
        }

        let summary = conn
            .prepare("SELECT timestamp, cash, stocks, total FROM summary")
            .map_err(query_err)?
            .query_map([], |row| {
                Ok(SummaryRow {
                    timestamp: row.get(0)?,
                    cash: row.get(1)?,
                    stocks: row.get(2)?,
                    total: row.get(3)?,
                })
            })
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;

        Ok(Tables {
            watchlist,
            stocks,
            portfolio,
            trades,
            summary,
        })
    }
}

impl PortfolioStore for SqliteStore {
    fn load(&self) -> Result<StoreSnapshot, AlTraderError> {
        self.load_tables()?.into_snapshot()
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<(), AlTraderError> {
        let tables = Tables::from_snapshot(snapshot);
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let stored: i64 = tx
            .query_row("SELECT COUNT(*) FROM trades", [], |row| row.get(0))
            .map_err(query_err)?;
        let stored = stored.max(0) as usize;
        if stored > tables.trades.len() {
            return Err(AlTraderError::Integrity {
                reason: format!(
                    "trade ledger shrank from {stored} to {} records",
                    tables.trades.len()
                ),
            });
        }

        tx.execute_batch(
            "DELETE FROM watchlist; DELETE FROM stocks; DELETE FROM portfolio; DELETE FROM summary;",
        )
        .map_err(query_err)?;

        for (i, row) in tables.watchlist.iter().enumerate() {
            tx.execute(
                "INSERT INTO watchlist (position, ticker, price, trend, rsi, sma, ema,
                                        macd_histogram, bb_upper, bb_lower)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    i as i64,
                    row.ticker,
                    row.price,
                    row.trend,
                    row.rsi,
                    row.sma,
                    row.ema,
                    row.macd_histogram,
                    row.bb_upper,
                    row.bb_lower
                ],
            )
            .map_err(query_err)?;
        }
        for row in &tables.stocks {
            tx.execute(
                "INSERT INTO stocks (ticker, shares, price, value, cost_basis)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.ticker, row.shares as i64, row.price, row.value, row.cost_basis],
            )
            .map_err(query_err)?;
        }
        for row in &tables.portfolio {
            tx.execute(
                "INSERT INTO portfolio (label, value) VALUES (?1, ?2)",
                params![row.label, row.value],
            )
            .map_err(query_err)?;
        }
        for row in &tables.trades[stored..] {
            tx.execute(
                "INSERT INTO trades (timestamp, ticker, side, shares, value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.timestamp,
                    row.ticker,
                    row.side.as_str(),
                    row.shares as i64,
                    row.value
                ],
            )
            .map_err(query_err)?;
        }
        for row in &tables.summary {
            tx.execute(
                "INSERT INTO summary (timestamp, cash, stocks, total) VALUES (?1, ?2, ?3, ?4)",
                params![row.timestamp, row.cash, row.stocks, row.total],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        debug!(
            new_trades = tables.trades.len() - stored,
            "saved portfolio to sqlite"
        );
        Ok(())
    }
}
