//! CLI definition and dispatch.

use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::csv_store_adapter::CsvWorkbookStore;
use crate::adapters::dataset_csv_adapter::{read_feature_whitelist, DatasetCsvWriter};
use crate::adapters::email_outbox_adapter::EmailOutboxAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::mirror_sync_adapter::MirrorSyncAdapter;
use crate::domain::config_validation::{
    parse_periods, validate_dataset_config, validate_notify_config, validate_store_config,
    validate_trader_config,
};
use crate::domain::dataset::{self, DatasetConfig};
use crate::domain::error::AlTraderError;
use crate::domain::gate::GateConfig;
use crate::domain::indicator::{parse_indicator_list, IndicatorKind, IndicatorParams};
use crate::domain::run::{
    self, PublishOptions, RunConfig, RunContext, RunReport, TickerOutcome,
    DEFAULT_HISTORY_DAYS, DEFAULT_INITIAL_CASH, DEFAULT_NOTIFY_AFTER_HOUR,
};
use crate::domain::signal::RsiThresholds;
use crate::domain::watchlist::{parse_tickers, Watchlist};
use crate::ports::config_port::ConfigPort;
use crate::ports::notify_port::NotificationPort;
use crate::ports::store_port::PortfolioStore;
use crate::ports::sync_port::RemoteSyncPort;

#[derive(Parser, Debug)]
#[command(name = "altrader", about = "Paper-trading assistant for an equity watchlist")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the watchlist and paper-trade on the signals
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Run the full loop without writing, syncing or notifying
        #[arg(long)]
        dry_run: bool,
    },
    /// Sell the whole position of the given tickers
    Sell {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long = "ticker", required = true, num_args = 1..)]
        tickers: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Build the next-close training dataset
    Dataset {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run { config, dry_run } => run_trader(&config, dry_run),
        Command::Sell {
            config,
            tickers,
            dry_run,
        } => run_sell(&config, &tickers, dry_run),
        Command::Dataset { config, output } => run_dataset(&config, output),
        Command::Validate { config } => run_validate(&config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, AlTraderError> {
    FileConfigAdapter::from_file(path)
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn config_int<T: TryFrom<i64>>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<T, AlTraderError> {
    T::try_from(config.get_int(section, key, default)).map_err(|_| AlTraderError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: "value out of range".into(),
    })
}

pub fn build_indicator_params(config: &dyn ConfigPort) -> Result<IndicatorParams, AlTraderError> {
    let defaults = IndicatorParams::default();
    Ok(IndicatorParams {
        rsi_period: config_int(config, "trader", "rsi_period", defaults.rsi_period as i64)?,
        ..defaults
    })
}

pub fn build_run_config(config: &dyn ConfigPort) -> Result<RunConfig, AlTraderError> {
    let indicators = match config.get_string("trader", "indicators") {
        Some(raw) => {
            parse_indicator_list(&raw).map_err(|e| AlTraderError::ConfigInvalid {
                section: "trader".into(),
                key: "indicators".into(),
                reason: e.to_string(),
            })?
        }
        None => vec![IndicatorKind::Rsi],
    };
    let defaults = RsiThresholds::default();

    Ok(RunConfig {
        indicators,
        params: build_indicator_params(config)?,
        thresholds: RsiThresholds {
            buy_below: config.get_double("trader", "rsi_buy_below", defaults.buy_below),
            sell_above: config.get_double("trader", "rsi_sell_above", defaults.sell_above),
        },
        gate: GateConfig {
            strict_cash_check: config.get_bool("trader", "strict_cash_check", false),
        },
        history_days: config_int(config, "trader", "history_days", DEFAULT_HISTORY_DAYS as i64)?,
        initial_cash: config.get_double("trader", "initial_cash", DEFAULT_INITIAL_CASH),
    })
}

pub fn build_publish_options(
    config: &dyn ConfigPort,
    dry_run: bool,
) -> Result<PublishOptions, AlTraderError> {
    Ok(PublishOptions {
        dry_run,
        notify_after_hour: config_int(
            config,
            "trader",
            "notify_after_hour",
            DEFAULT_NOTIFY_AFTER_HOUR as i64,
        )?,
    })
}

pub fn build_dataset_config(config: &dyn ConfigPort) -> Result<DatasetConfig, AlTraderError> {
    let defaults = DatasetConfig::default();
    let periods = match config.get_string("dataset", "periods") {
        Some(raw) => parse_periods(&raw)?,
        None => defaults.periods,
    };
    let whitelist = match config.get_string("dataset", "features_file") {
        Some(path) if !path.is_empty() => Some(read_feature_whitelist(Path::new(&path))?),
        _ => None,
    };
    Ok(DatasetConfig {
        benchmark: config
            .get_string("dataset", "benchmark")
            .map(|b| b.trim().to_uppercase())
            .unwrap_or(defaults.benchmark),
        periods,
        params: build_indicator_params(config)?,
        whitelist,
    })
}

/// The store's watchlist wins; an empty store is seeded from
/// `[trader] watchlist`.
pub fn resolve_watchlist(
    stored: Watchlist,
    config: &dyn ConfigPort,
) -> Result<Watchlist, AlTraderError> {
    if !stored.is_empty() {
        return Ok(stored);
    }
    match config.get_string("trader", "watchlist") {
        Some(raw) if !raw.trim().is_empty() => {
            let tickers = parse_tickers(&raw).map_err(|e| AlTraderError::ConfigInvalid {
                section: "trader".into(),
                key: "watchlist".into(),
                reason: e.to_string(),
            })?;
            Ok(Watchlist::from_tickers(tickers))
        }
        _ => Ok(stored),
    }
}

pub fn open_store(config: &dyn ConfigPort) -> Result<Box<dyn PortfolioStore>, AlTraderError> {
    let backend = config
        .get_string("store", "backend")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();
    match backend.as_str() {
        "csv" => {
            let path = config
                .get_string("store", "path")
                .unwrap_or_else(|| "portfolio".to_string());
            Ok(Box::new(CsvWorkbookStore::new(PathBuf::from(path))))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(
            crate::adapters::sqlite_adapter::SqliteStore::from_config(config)?,
        )),
        other => Err(AlTraderError::ConfigInvalid {
            section: "store".into(),
            key: "backend".into(),
            reason: format!("backend '{other}' is not available in this build"),
        }),
    }
}

fn open_prices(config: &dyn ConfigPort) -> CsvPriceAdapter {
    let path = config
        .get_string("prices", "path")
        .unwrap_or_else(|| "prices".to_string());
    CsvPriceAdapter::new(PathBuf::from(path))
}

fn open_sync(config: &dyn ConfigPort) -> Option<MirrorSyncAdapter> {
    if !config.get_bool("sync", "enabled", false) {
        return None;
    }
    let path = config
        .get_string("sync", "path")
        .unwrap_or_else(|| "mirror".to_string());
    Some(MirrorSyncAdapter::new(PathBuf::from(path)))
}

fn open_notifier(config: &dyn ConfigPort) -> Result<Option<EmailOutboxAdapter>, AlTraderError> {
    if !config.get_bool("notify", "enabled", false) {
        return Ok(None);
    }
    EmailOutboxAdapter::from_config(config).map(Some)
}

fn validate_all(config: &dyn ConfigPort) -> Result<(), AlTraderError> {
    validate_trader_config(config)?;
    validate_store_config(config)?;
    validate_notify_config(config)?;
    validate_dataset_config(config)?;
    Ok(())
}

/// Everything a trading run needs, loaded and validated.
struct Session {
    config: FileConfigAdapter,
    run_config: RunConfig,
    store: Box<dyn PortfolioStore>,
    ctx: RunContext,
}

fn open_session(config_path: &Path) -> Result<Session, AlTraderError> {
    info!(path = %config_path.display(), "loading config");
    let config = load_config(config_path)?;
    validate_all(&config)?;
    let run_config = build_run_config(&config)?;

    let store = open_store(&config)?;
    let mut snapshot = store.load()?;
    snapshot.watchlist = resolve_watchlist(snapshot.watchlist, &config)?;
    let ctx = RunContext::from_snapshot(snapshot, run_config.initial_cash)?;

    Ok(Session {
        config,
        run_config,
        store,
        ctx,
    })
}

fn finish_session(session: &Session, dry_run: bool, at: NaiveDateTime) -> Result<(), AlTraderError> {
    let options = build_publish_options(&session.config, dry_run)?;
    let sync = open_sync(&session.config);
    let notifier = open_notifier(&session.config)?;
    let report = run::publish(
        &session.ctx,
        session.store.as_ref(),
        sync.as_ref().map(|s| s as &dyn RemoteSyncPort),
        notifier.as_ref().map(|n| n as &dyn NotificationPort),
        at,
        &options,
    )?;
    info!(
        saved = report.saved,
        synced = report.synced,
        notified = report.notified,
        "run published"
    );
    Ok(())
}

fn print_report(report: &RunReport) {
    for (ticker, outcome) in &report.outcomes {
        match outcome {
            TickerOutcome::Traded(record) => println!(
                "{:<6} {:<4} {:>6} shares  ${:.2}",
                ticker, record.side, record.shares, record.value
            ),
            TickerOutcome::Hold { decision } => println!("{:<6} hold ({decision})", ticker),
            TickerOutcome::Skipped { reason } => println!("{:<6} skipped: {reason}", ticker),
        }
    }
    println!();
    println!("CASH    ${:.2}", report.summary.cash);
    println!("STOCKS  ${:.2}", report.summary.stocks);
    println!("TOTAL   ${:.2}", report.summary.total);
}

fn run_trader(config_path: &Path, dry_run: bool) -> Result<(), AlTraderError> {
    let mut session = open_session(config_path)?;
    if session.ctx.watchlist.is_empty() {
        warn!("watchlist is empty, nothing to evaluate");
    }
    let prices = open_prices(&session.config);
    let at = now();

    let report = run::run_watchlist(&mut session.ctx, &prices, &session.run_config, at)?;
    print_report(&report);
    finish_session(&session, dry_run, at)
}

fn run_sell(config_path: &Path, tickers: &[String], dry_run: bool) -> Result<(), AlTraderError> {
    let tickers: Vec<String> = tickers.iter().map(|t| t.trim().to_uppercase()).collect();
    let mut session = open_session(config_path)?;
    let prices = open_prices(&session.config);
    let at = now();

    let report = run::run_manual_sells(&mut session.ctx, &tickers, &prices, &session.run_config, at)?;
    print_report(&report);
    finish_session(&session, dry_run, at)
}

fn run_dataset(config_path: &Path, output: Option<PathBuf>) -> Result<(), AlTraderError> {
    let config = load_config(config_path)?;
    validate_trader_config(&config)?;
    validate_dataset_config(&config)?;
    let dataset_config = build_dataset_config(&config)?;

    let store = open_store(&config)?;
    let watchlist = resolve_watchlist(store.load()?.watchlist, &config)?;
    let prices = open_prices(&config);

    let output = output.unwrap_or_else(|| {
        PathBuf::from(
            config
                .get_string("dataset", "output")
                .unwrap_or_else(|| "dataset".to_string()),
        )
    });
    let writer = DatasetCsvWriter::new(output);

    let datasets = dataset::build_datasets(&prices, &watchlist.tickers(), &dataset_config)?;
    for ds in &datasets {
        writer.write(ds)?;
        println!(
            "{:<6} {} rows x {} features",
            ds.ticker,
            ds.features.len(),
            ds.features.columns().len()
        );
    }
    info!(tickers = datasets.len(), "dataset written");
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), AlTraderError> {
    let config = load_config(config_path)?;
    validate_all(&config)?;
    let run_config = build_run_config(&config)?;
    let dataset_config = build_dataset_config(&config)?;

    let indicators: Vec<&str> = run_config.indicators.iter().map(IndicatorKind::name).collect();
    println!("Configuration is valid.");
    println!("  indicators:  {}", indicators.join(","));
    println!(
        "  rsi:         period {}, buy < {}, sell > {}",
        run_config.params.rsi_period,
        run_config.thresholds.buy_below,
        run_config.thresholds.sell_above
    );
    println!("  history:     {} days", run_config.history_days);
    println!("  strict cash: {}", run_config.gate.strict_cash_check);
    println!(
        "  dataset:     benchmark {}, periods {:?}",
        dataset_config.benchmark, dataset_config.periods
    );
    Ok(())
}
