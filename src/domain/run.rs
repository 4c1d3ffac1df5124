//! Watchlist run loop.
//!
//! Per ticker: evaluate → decide → {tradable? → execute → update holding : hold}.
//! Tickers are processed one at a time against an explicit [`RunContext`]
//! that owns every table for the duration of the run. Failures confined to a
//! single ticker are logged and the ticker is held; integrity failures abort
//! the run before anything is persisted.

use chrono::{NaiveDateTime, Timelike};
use tracing::{debug, info, warn};

use super::asset::Asset;
use super::decision::check_indicators;
use super::error::AlTraderError;
use super::execution::execute_trade;
use super::gate::{buyable_shares, is_tradable, GateConfig};
use super::indicator::{IndicatorKind, IndicatorParams};
use super::portfolio::{Holdings, PortfolioHistory, PortfolioSummary};
use super::signal::{RsiThresholds, Signal, TradeSide};
use super::summary::TradeSummary;
use super::trade::{TradeLedger, TradeRecord};
use super::watchlist::Watchlist;
use crate::ports::data_port::PriceHistoryPort;
use crate::ports::notify_port::NotificationPort;
use crate::ports::store_port::{PortfolioStore, StoreSnapshot};
use crate::ports::sync_port::RemoteSyncPort;

pub const DEFAULT_HISTORY_DAYS: usize = 30;
pub const DEFAULT_INITIAL_CASH: f64 = 100_000.0;
pub const DEFAULT_NOTIFY_AFTER_HOUR: u32 = 16;

/// Trading parameters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub indicators: Vec<IndicatorKind>,
    pub params: IndicatorParams,
    pub thresholds: RsiThresholds,
    pub gate: GateConfig,
    pub history_days: usize,
    pub initial_cash: f64,
}

impl RunConfig {
    /// Bars requested per ticker: `history_days`, raised to the longest
    /// warm-up of the configured indicators.
    pub fn bars_needed(&self) -> usize {
        self.history_days.max(self.params.lookback(&self.indicators))
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            indicators: vec![IndicatorKind::Rsi],
            params: IndicatorParams::default(),
            thresholds: RsiThresholds::default(),
            gate: GateConfig::default(),
            history_days: DEFAULT_HISTORY_DAYS,
            initial_cash: DEFAULT_INITIAL_CASH,
        }
    }
}

/// Mutable state shared by every step of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub summary: PortfolioSummary,
    pub holdings: Holdings,
    pub ledger: TradeLedger,
    pub history: PortfolioHistory,
    pub watchlist: Watchlist,
    /// Cash at the start of the run; buy sizing is based on it.
    start_cash: f64,
}

impl RunContext {
    /// Build the context from a loaded snapshot, validating the shared
    /// tables. A store without a portfolio starts with `initial_cash`.
    pub fn from_snapshot(snapshot: StoreSnapshot, initial_cash: f64) -> Result<Self, AlTraderError> {
        let summary = snapshot
            .summary
            .unwrap_or_else(|| PortfolioSummary::with_cash(initial_cash));
        check_integrity(&summary, &snapshot.holdings, &snapshot.ledger)?;

        Ok(RunContext {
            start_cash: summary.cash,
            summary,
            holdings: snapshot.holdings,
            ledger: snapshot.ledger,
            history: snapshot.history,
            watchlist: snapshot.watchlist,
        })
    }

    pub fn start_cash(&self) -> f64 {
        self.start_cash
    }

    pub fn cash(&self) -> f64 {
        self.summary.cash
    }

    pub fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            summary: Some(self.summary),
            holdings: self.holdings.clone(),
            watchlist: self.watchlist.clone(),
            ledger: self.ledger.clone(),
            history: self.history.clone(),
        }
    }

    fn record_trade(&mut self, asset: &Asset, record: TradeRecord) {
        self.summary.cash += asset.cash_change;
        self.ledger.append(record);
    }

    /// Mirror the asset's position into the holdings table.
    fn sync_holding(&mut self, asset: &Asset) {
        if asset.shares == 0 {
            self.holdings.remove(&asset.ticker);
        } else {
            self.holdings.upsert(asset.compiled());
        }
    }
}

fn check_integrity(
    summary: &PortfolioSummary,
    holdings: &Holdings,
    ledger: &TradeLedger,
) -> Result<(), AlTraderError> {
    if !summary.cash.is_finite() {
        return Err(AlTraderError::Integrity {
            reason: format!("cash balance is not a number: {}", summary.cash),
        });
    }
    for h in holdings.iter() {
        if h.ticker.trim().is_empty() {
            return Err(AlTraderError::Integrity {
                reason: "holding without ticker".into(),
            });
        }
        if !h.value.is_finite() || !h.price.is_finite() {
            return Err(AlTraderError::Integrity {
                reason: format!("holding {} has a non-finite valuation", h.ticker),
            });
        }
    }
    for (i, r) in ledger.records().iter().enumerate() {
        if r.ticker.trim().is_empty() || r.shares == 0 {
            return Err(AlTraderError::Integrity {
                reason: format!("malformed trade record at row {}", i + 1),
            });
        }
    }
    Ok(())
}

/// What happened to one ticker this run.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome {
    Traded(TradeRecord),
    Hold { decision: Signal },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<(String, TickerOutcome)>,
    pub summary: PortfolioSummary,
}

impl RunReport {
    pub fn trades(&self) -> impl Iterator<Item = &TradeRecord> {
        self.outcomes.iter().filter_map(|(_, o)| match o {
            TickerOutcome::Traded(record) => Some(record),
            _ => None,
        })
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, TickerOutcome::Skipped { .. }))
            .count()
    }
}

/// Evaluate, decide, gate and (maybe) execute for a single ticker.
pub fn process_ticker(
    ctx: &mut RunContext,
    ticker: &str,
    prices: &dyn PriceHistoryPort,
    config: &RunConfig,
    now: NaiveDateTime,
) -> Result<TickerOutcome, AlTraderError> {
    let bars = prices.fetch_recent(ticker, config.bars_needed())?;
    let mut asset = Asset::initialize(ticker, &bars, &config.params, &ctx.holdings, &ctx.ledger)?;
    debug!(
        ticker,
        price = asset.price,
        rsi = ?asset.indicators.rsi,
        "evaluated indicators"
    );

    let order = check_indicators(&asset, &config.indicators, &config.thresholds);
    let num_shares = buyable_shares(asset.price, ctx.start_cash);

    ctx.watchlist.update(&asset);

    // Sells liquidate the whole position.
    let count = match order.side() {
        Some(TradeSide::Sell) => asset.shares,
        Some(TradeSide::Buy) => num_shares,
        None => 0,
    };

    let outcome = match order.side() {
        Some(side)
            if count > 0 && is_tradable(&asset, order, num_shares, ctx.cash(), &config.gate) =>
        {
            let record = execute_trade(&mut asset, side, count, now)?;
            info!(
                ticker,
                side = %record.side,
                shares = record.shares,
                price = asset.price,
                value = record.value,
                "executed trade"
            );
            ctx.record_trade(&asset, record.clone());
            TickerOutcome::Traded(record)
        }
        _ => {
            info!(ticker, decision = %order, "hold at {:.2}", asset.price);
            TickerOutcome::Hold { decision: order }
        }
    };

    ctx.sync_holding(&asset);
    Ok(outcome)
}

/// Process every watchlist ticker in order, then close the run.
pub fn run_watchlist(
    ctx: &mut RunContext,
    prices: &dyn PriceHistoryPort,
    config: &RunConfig,
    now: NaiveDateTime,
) -> Result<RunReport, AlTraderError> {
    let tickers = ctx.watchlist.tickers();
    info!(tickers = tickers.len(), cash = ctx.cash(), "starting watchlist run");

    let mut outcomes = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let outcome = match process_ticker(ctx, &ticker, prices, config, now) {
            Ok(outcome) => outcome,
            Err(e) if e.is_ticker_local() => {
                warn!(ticker = %ticker, error = %e, "skipping ticker");
                TickerOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };
        outcomes.push((ticker, outcome));
    }

    close_run(ctx, now);
    Ok(RunReport {
        outcomes,
        summary: ctx.summary,
    })
}

/// Force-sell the full position of each ticker, bypassing the decision
/// policy and the gate. Tickers without shares are skipped.
pub fn run_manual_sells(
    ctx: &mut RunContext,
    tickers: &[String],
    prices: &dyn PriceHistoryPort,
    config: &RunConfig,
    now: NaiveDateTime,
) -> Result<RunReport, AlTraderError> {
    let mut outcomes = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let outcome = match manual_sell(ctx, ticker, prices, config, now) {
            Ok(outcome) => outcome,
            Err(e) if e.is_ticker_local() => {
                warn!(ticker = %ticker, error = %e, "manual sell failed");
                TickerOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };
        outcomes.push((ticker.clone(), outcome));
    }

    close_run(ctx, now);
    Ok(RunReport {
        outcomes,
        summary: ctx.summary,
    })
}

fn manual_sell(
    ctx: &mut RunContext,
    ticker: &str,
    prices: &dyn PriceHistoryPort,
    config: &RunConfig,
    now: NaiveDateTime,
) -> Result<TickerOutcome, AlTraderError> {
    let bars = prices.fetch_recent(ticker, config.bars_needed())?;
    let mut asset = Asset::initialize(ticker, &bars, &config.params, &ctx.holdings, &ctx.ledger)?;
    ctx.watchlist.update(&asset);

    if asset.shares == 0 {
        return Ok(TickerOutcome::Skipped {
            reason: format!("no shares of {ticker} held"),
        });
    }

    let count = asset.shares;
    let record = execute_trade(&mut asset, TradeSide::Sell, count, now)?;
    info!(ticker, shares = record.shares, value = record.value, "manual sell");
    ctx.record_trade(&asset, record.clone());
    ctx.sync_holding(&asset);
    Ok(TickerOutcome::Traded(record))
}

/// End-of-run ledger update: revalue STOCKS, recompute TOTAL, replace
/// today's history row and sort the watchlist by RSI.
pub fn close_run(ctx: &mut RunContext, now: NaiveDateTime) {
    ctx.summary.settle(&ctx.holdings);
    ctx.history.record(now, ctx.summary);
    ctx.watchlist.sort_by_rsi();
    info!(
        cash = ctx.summary.cash,
        stocks = ctx.summary.stocks,
        total = ctx.summary.total,
        "portfolio updated"
    );
}

/// Persistence and delivery switches for [`publish`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublishOptions {
    pub dry_run: bool,
    pub notify_after_hour: u32,
}

impl Default for PublishOptions {
    fn default() -> Self {
        PublishOptions {
            dry_run: false,
            notify_after_hour: DEFAULT_NOTIFY_AFTER_HOUR,
        }
    }
}

/// What [`publish`] managed to deliver.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PublishReport {
    pub saved: bool,
    pub synced: bool,
    pub notified: bool,
}

/// Write the run's tables to the store, then mirror and notify on a
/// best-effort basis. Only a failing store write is an error.
pub fn publish(
    ctx: &RunContext,
    store: &dyn PortfolioStore,
    sync: Option<&dyn RemoteSyncPort>,
    notifier: Option<&dyn NotificationPort>,
    now: NaiveDateTime,
    options: &PublishOptions,
) -> Result<PublishReport, AlTraderError> {
    let mut report = PublishReport::default();
    if options.dry_run {
        info!("dry run: skipping persistence, sync and notification");
        return Ok(report);
    }

    let snapshot = ctx.to_snapshot();
    store.save(&snapshot)?;
    report.saved = true;

    if let Some(sync) = sync {
        match sync.sync(&snapshot) {
            Ok(()) => report.synced = true,
            Err(e) => warn!(error = %e, "failed to update remote sheet"),
        }
    }

    if let Some(notifier) = notifier {
        if now.hour() >= options.notify_after_hour {
            let summary = TradeSummary::build(now, &ctx.ledger, &ctx.holdings, ctx.summary);
            match notifier.send(&summary) {
                Ok(()) => report.notified = true,
                Err(e) => warn!(error = %e, "failed to send summary"),
            }
        } else {
            debug!(hour = now.hour(), "too early for summary notification");
        }
    }

    Ok(report)
}
