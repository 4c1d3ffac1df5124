//! Tabular representation of the five store tables.
//!
//! The domain keeps keyed maps; every store adapter translates to and from
//! these flat rows at the boundary. Table names and row shapes are shared
//! by the CSV workbook, the SQLite store and the mirror sync.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::error::AlTraderError;
use crate::domain::portfolio::{Holding, Holdings, PortfolioHistory, PortfolioSummary};
use crate::domain::signal::TradeSide;
use crate::domain::trade::{TradeLedger, TradeRecord};
use crate::domain::watchlist::{Watchlist, WatchlistEntry};
use crate::ports::store_port::StoreSnapshot;

pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

pub const WATCHLIST_TABLE: &str = "watchlist";
pub const STOCKS_TABLE: &str = "stocks";
pub const PORTFOLIO_TABLE: &str = "portfolio";
pub const TRADES_TABLE: &str = "trades";
pub const SUMMARY_TABLE: &str = "summary";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistRow {
    pub ticker: String,
    pub price: Option<f64>,
    pub trend: Option<f64>,
    pub rsi: Option<f64>,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRow {
    pub ticker: String,
    pub shares: u64,
    pub price: f64,
    pub value: f64,
    #[serde(default)]
    pub cost_basis: f64,
}

/// `CASH`, `STOCKS` and `TOTAL` rows of the current portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRow {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub timestamp: String,
    pub ticker: String,
    pub side: TradeSide,
    pub shares: u64,
    pub value: f64,
}

/// One portfolio history row per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub timestamp: String,
    pub cash: f64,
    pub stocks: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub watchlist: Vec<WatchlistRow>,
    pub stocks: Vec<StockRow>,
    pub portfolio: Vec<PortfolioRow>,
    pub trades: Vec<TradeRow>,
    pub summary: Vec<SummaryRow>,
}

fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_ts(table: &str, raw: &str) -> Result<NaiveDateTime, AlTraderError> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(|e| {
        AlTraderError::Integrity {
            reason: format!("{table}: bad timestamp '{raw}': {e}"),
        }
    })
}

impl Tables {
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Self {
        let watchlist = snapshot
            .watchlist
            .entries()
            .iter()
            .map(|e| WatchlistRow {
                ticker: e.ticker.clone(),
                price: e.price,
                trend: e.trend,
                rsi: e.rsi,
                sma: e.sma,
                ema: e.ema,
                macd_histogram: e.macd_histogram,
                bb_upper: e.bb_upper,
                bb_lower: e.bb_lower,
            })
            .collect();

        let stocks = snapshot
            .holdings
            .iter()
            .map(|h| StockRow {
                ticker: h.ticker.clone(),
                shares: h.shares,
                price: h.price,
                value: h.value,
                cost_basis: h.cost_basis,
            })
            .collect();

        let portfolio = snapshot
            .summary
            .map(|s| {
                vec![
                    PortfolioRow {
                        label: "CASH".into(),
                        value: s.cash,
                    },
                    PortfolioRow {
                        label: "STOCKS".into(),
                        value: s.stocks,
                    },
                    PortfolioRow {
                        label: "TOTAL".into(),
                        value: s.total,
                    },
                ]
            })
            .unwrap_or_default();

        let trades = snapshot
            .ledger
            .records()
            .iter()
            .map(|r| TradeRow {
                timestamp: format_ts(&r.timestamp),
                ticker: r.ticker.clone(),
                side: r.side,
                shares: r.shares,
                value: r.value,
            })
            .collect();

        let summary = snapshot
            .history
            .rows()
            .map(|row| SummaryRow {
                timestamp: format_ts(&row.timestamp),
                cash: row.summary.cash,
                stocks: row.summary.stocks,
                total: row.summary.total,
            })
            .collect();

        Tables {
            watchlist,
            stocks,
            portfolio,
            trades,
            summary,
        }
    }

    /// Rebuild the keyed domain tables, rejecting rows that would break
    /// their invariants.
    pub fn into_snapshot(self) -> Result<StoreSnapshot, AlTraderError> {
        let watchlist = Watchlist::from_entries(
            self.watchlist
                .into_iter()
                .map(|r| WatchlistEntry {
                    ticker: r.ticker,
                    price: r.price,
                    trend: r.trend,
                    rsi: r.rsi,
                    sma: r.sma,
                    ema: r.ema,
                    macd_histogram: r.macd_histogram,
                    bb_upper: r.bb_upper,
                    bb_lower: r.bb_lower,
                })
                .collect(),
        );

        let mut holdings = Holdings::new();
        for row in self.stocks {
            if holdings.contains(&row.ticker) {
                return Err(AlTraderError::Integrity {
                    reason: format!("{STOCKS_TABLE}: duplicate holding {}", row.ticker),
                });
            }
            if row.shares == 0 {
                continue;
            }
            holdings.upsert(Holding {
                ticker: row.ticker,
                shares: row.shares,
                price: row.price,
                value: row.value,
                cost_basis: row.cost_basis,
            });
        }

        let summary = if self.portfolio.is_empty() {
            None
        } else {
            let lookup = |label: &str| {
                self.portfolio
                    .iter()
                    .find(|r| r.label.eq_ignore_ascii_case(label))
                    .map(|r| r.value)
            };
            let cash = lookup("CASH").ok_or_else(|| AlTraderError::Integrity {
                reason: format!("{PORTFOLIO_TABLE}: missing CASH row"),
            })?;
            let stocks = lookup("STOCKS").unwrap_or(0.0);
            Some(PortfolioSummary {
                cash,
                stocks,
                total: lookup("TOTAL").unwrap_or(cash + stocks),
            })
        };

        let mut records = Vec::with_capacity(self.trades.len());
        for row in self.trades {
            records.push(TradeRecord {
                timestamp: parse_ts(TRADES_TABLE, &row.timestamp)?,
                ticker: row.ticker,
                side: row.side,
                shares: row.shares,
                value: row.value,
            });
        }

        let mut history = PortfolioHistory::new();
        for row in self.summary {
            history.record(
                parse_ts(SUMMARY_TABLE, &row.timestamp)?,
                PortfolioSummary {
                    cash: row.cash,
                    stocks: row.stocks,
                    total: row.total,
                },
            );
        }

        Ok(StoreSnapshot {
            summary,
            holdings,
            watchlist,
            ledger: TradeLedger::from_records(records),
            history,
        })
    }
}
