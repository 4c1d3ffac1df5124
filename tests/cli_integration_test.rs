//! CLI integration tests.
//!
//! Tests cover:
//! - Config file loading and conversion into run, publish and dataset settings
//! - Validation errors surfaced as config exit codes
//! - `run`, `sell`, `dataset` and `validate` end to end against temp files
//! - Dry runs leaving the store untouched

mod common;

use altrader::adapters::csv_store_adapter::CsvWorkbookStore;
use altrader::cli::{self, Cli};
use altrader::domain::error::AlTraderError;
use altrader::domain::indicator::IndicatorKind;
use altrader::domain::portfolio::Holding;
use altrader::domain::signal::TradeSide;
use altrader::ports::config_port::ConfigPort;
use altrader::ports::store_port::PortfolioStore;
use clap::Parser;
use common::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("altrader.ini");
    fs::write(&path, content).unwrap();
    path
}

fn write_prices(dir: &Path, ticker: &str, closes: &[f64]) {
    fs::create_dir_all(dir).unwrap();
    let mut body = String::from("Date,Open,High,Low,Close,Volume\n");
    for (i, bar) in bars_from_closes(ticker, closes).iter().enumerate() {
        body.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date.format("%Y-%m-%d"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            1_000 + (i % 7) * 10
        ));
    }
    fs::write(dir.join(format!("{ticker}.csv")), body).unwrap();
}

/// Wavy closes with drift so no rolling window is ever flat.
fn wave(len: usize, phase: f64) -> Vec<f64> {
    (0..len)
        .map(|i| 100.0 + 10.0 * (i as f64 * 0.3 + phase).sin() + i as f64 * 0.1)
        .collect()
}

fn base_config(dir: &Path, extra: &str) -> String {
    format!(
        "[trader]\n\
         watchlist = AAPL\n\
         initial_cash = 1000\n\
         \n\
         [store]\n\
         backend = csv\n\
         path = {store}\n\
         \n\
         [prices]\n\
         path = {prices}\n\
         {extra}",
        store = dir.join("portfolio").display(),
        prices = dir.join("prices").display(),
    )
}

fn invoke(args: &[&str]) -> ExitCode {
    cli::run(Cli::parse_from(args))
}

mod config_loading {
    use super::*;

    #[test]
    fn full_trader_section() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            "[trader]\n\
             watchlist = AAPL, msft\n\
             indicators = rsi,macd\n\
             rsi_period = 10\n\
             rsi_buy_below = 30\n\
             rsi_sell_above = 70\n\
             strict_cash_check = yes\n\
             history_days = 60\n\
             initial_cash = 2500.5\n\
             notify_after_hour = 18\n",
        );
        let config = cli::load_config(&path).unwrap();

        let run = cli::build_run_config(&config).unwrap();
        assert_eq!(run.indicators, vec![IndicatorKind::Rsi, IndicatorKind::Macd]);
        assert_eq!(run.params.rsi_period, 10);
        assert_eq!(run.thresholds.buy_below, 30.0);
        assert_eq!(run.thresholds.sell_above, 70.0);
        assert!(run.gate.strict_cash_check);
        assert_eq!(run.history_days, 60);
        assert_eq!(run.initial_cash, 2500.5);

        let publish = cli::build_publish_options(&config, true).unwrap();
        assert!(publish.dry_run);
        assert_eq!(publish.notify_after_hour, 18);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "");
        let config = cli::load_config(&path).unwrap();

        let run = cli::build_run_config(&config).unwrap();
        assert_eq!(run.indicators, vec![IndicatorKind::Rsi]);
        assert_eq!(run.thresholds.buy_below, 45.0);
        assert_eq!(run.thresholds.sell_above, 55.0);
        assert!(!run.gate.strict_cash_check);

        let dataset = cli::build_dataset_config(&config).unwrap();
        assert_eq!(dataset.benchmark, "VTSMX");
        assert_eq!(dataset.periods, vec![5, 10, 21, 65]);
        assert!(dataset.whitelist.is_none());
    }

    #[test]
    fn dataset_section_with_whitelist() {
        let dir = TempDir::new().unwrap();
        let features = dir.path().join("features.csv");
        fs::write(&features, "rsi\nClose\n").unwrap();
        let path = write_config(
            dir.path(),
            &format!(
                "[dataset]\nbenchmark = spy\nperiods = 5, 10\nfeatures_file = {}\n",
                features.display()
            ),
        );
        let config = cli::load_config(&path).unwrap();

        let dataset = cli::build_dataset_config(&config).unwrap();
        assert_eq!(dataset.benchmark, "SPY");
        assert_eq!(dataset.periods, vec![5, 10]);
        assert_eq!(
            dataset.whitelist,
            Some(vec!["rsi".to_string(), "Close".to_string()])
        );
    }

    #[test]
    fn unknown_indicator_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), "[trader]\nindicators = rsi,stochastic\n");
        let config = cli::load_config(&path).unwrap();
        let err = cli::build_run_config(&config).unwrap_err();
        assert!(matches!(err, AlTraderError::ConfigInvalid { key, .. } if key == "indicators"));
    }

    #[test]
    fn config_seeds_empty_store_watchlist() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), &base_config(dir.path(), ""));
        let config = cli::load_config(&path).unwrap();
        assert_eq!(config.get_string("trader", "watchlist"), Some("AAPL".into()));

        let store = cli::open_store(&config).unwrap();
        let watchlist = cli::resolve_watchlist(store.load().unwrap().watchlist, &config).unwrap();
        assert_eq!(watchlist.tickers(), vec!["AAPL"]);
    }
}

mod commands {
    use super::*;

    #[test]
    fn validate_accepts_good_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), &base_config(dir.path(), ""));
        assert_eq!(
            invoke(&["altrader", "validate", "-c", path.to_str().unwrap()]),
            ExitCode::SUCCESS
        );
    }

    #[test]
    fn validate_rejects_inverted_thresholds() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            "[trader]\nrsi_buy_below = 60\nrsi_sell_above = 40\n",
        );
        assert_eq!(
            invoke(&["altrader", "validate", "-c", path.to_str().unwrap()]),
            ExitCode::from(2)
        );
    }

    #[test]
    fn notify_without_recipient_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            "[notify]\nenabled = true\nsender = al@example.com\n",
        );
        assert_eq!(
            invoke(&["altrader", "validate", "-c", path.to_str().unwrap()]),
            ExitCode::from(2)
        );
    }

    #[test]
    fn missing_config_file_is_config_error() {
        assert_eq!(
            invoke(&["altrader", "run", "-c", "/nonexistent/altrader.ini"]),
            ExitCode::from(2)
        );
    }

    #[test]
    fn run_buys_and_persists_tables() {
        let dir = TempDir::new().unwrap();
        write_prices(&dir.path().join("prices"), "AAPL", &falling_to(81.0));
        let mirror = dir.path().join("mirror");
        let path = write_config(
            dir.path(),
            &base_config(
                dir.path(),
                &format!("\n[sync]\nenabled = true\npath = {}\n", mirror.display()),
            ),
        );

        assert_eq!(
            invoke(&["altrader", "run", "-c", path.to_str().unwrap()]),
            ExitCode::SUCCESS
        );

        let snapshot = CsvWorkbookStore::new(dir.path().join("portfolio"))
            .load()
            .unwrap();
        let trades = snapshot.ledger.records();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, TradeSide::Buy);
        assert_eq!(trades[0].shares, 12);
        assert_eq!(snapshot.holdings.get("AAPL").unwrap().shares, 12);
        let summary = snapshot.summary.unwrap();
        assert_eq!(summary.cash, 1000.0 - 12.0 * 81.0);
        assert_eq!(summary.total, summary.cash + summary.stocks);
        assert_eq!(snapshot.history.len(), 1);

        let mirrored = CsvWorkbookStore::new(mirror).load().unwrap();
        assert_eq!(mirrored, snapshot);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        write_prices(&dir.path().join("prices"), "AAPL", &falling_to(81.0));
        let path = write_config(dir.path(), &base_config(dir.path(), ""));

        assert_eq!(
            invoke(&["altrader", "run", "-c", path.to_str().unwrap(), "--dry-run"]),
            ExitCode::SUCCESS
        );
        assert!(!dir.path().join("portfolio").join("trades.csv").exists());
    }

    #[test]
    fn missing_price_file_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("prices")).unwrap();
        let path = write_config(dir.path(), &base_config(dir.path(), ""));

        assert_eq!(
            invoke(&["altrader", "run", "-c", path.to_str().unwrap()]),
            ExitCode::SUCCESS
        );
        let snapshot = CsvWorkbookStore::new(dir.path().join("portfolio"))
            .load()
            .unwrap();
        assert!(snapshot.ledger.is_empty());
        assert_eq!(snapshot.summary.unwrap().cash, 1000.0);
    }

    #[test]
    fn sell_liquidates_named_ticker() {
        let dir = TempDir::new().unwrap();
        write_prices(&dir.path().join("prices"), "WMT", &flat_at(50.0));
        let store = CsvWorkbookStore::new(dir.path().join("portfolio"));
        let mut seed = snapshot_with_cash(0.0, &["WMT"]);
        seed.holdings.upsert(Holding {
            ticker: "WMT".into(),
            shares: 6,
            price: 48.0,
            value: 288.0,
            cost_basis: 48.0,
        });
        store.save(&seed).unwrap();
        let path = write_config(dir.path(), &base_config(dir.path(), ""));

        assert_eq!(
            invoke(&["altrader", "sell", "-c", path.to_str().unwrap(), "-t", "wmt"]),
            ExitCode::SUCCESS
        );

        let snapshot = store.load().unwrap();
        assert!(snapshot.holdings.is_empty());
        assert_eq!(snapshot.ledger.records()[0].shares, 6);
        assert_eq!(snapshot.summary.unwrap().cash, 300.0);
    }

    #[test]
    fn dataset_writes_features_and_labels() {
        let dir = TempDir::new().unwrap();
        let prices = dir.path().join("prices");
        write_prices(&prices, "AAPL", &wave(150, 0.0));
        write_prices(&prices, "VTSMX", &wave(150, 1.3));
        let output = dir.path().join("dataset");
        let path = write_config(
            dir.path(),
            &base_config(dir.path(), "\n[dataset]\nperiods = 5,10\n"),
        );

        assert_eq!(
            invoke(&[
                "altrader",
                "dataset",
                "-c",
                path.to_str().unwrap(),
                "-o",
                output.to_str().unwrap(),
            ]),
            ExitCode::SUCCESS
        );

        let features = fs::read_to_string(output.join("features").join("AAPL.csv")).unwrap();
        let header = features.lines().next().unwrap();
        assert!(header.starts_with("Date,sector,Open,High,Low,Close,Volume,rsi"));
        assert!(header.contains("market_Close"));
        assert!(features.lines().nth(1).unwrap().contains("No Sector"));

        let labels = fs::read_to_string(output.join("labels").join("AAPL.csv")).unwrap();
        assert_eq!(
            labels.lines().next().unwrap(),
            "Date,Ticker,next_close,next_close_2,next_close_3,next_close_5,next_close_10"
        );
        assert_eq!(features.lines().count(), labels.lines().count());
    }

    #[test]
    fn dataset_without_benchmark_fails() {
        let dir = TempDir::new().unwrap();
        write_prices(&dir.path().join("prices"), "AAPL", &wave(150, 0.0));
        let path = write_config(dir.path(), &base_config(dir.path(), ""));

        assert_eq!(
            invoke(&["altrader", "dataset", "-c", path.to_str().unwrap()]),
            ExitCode::from(5)
        );
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn run_against_sqlite_store() {
        use altrader::adapters::sqlite_adapter::SqliteStore;

        let dir = TempDir::new().unwrap();
        write_prices(&dir.path().join("prices"), "AAPL", &falling_to(81.0));
        let db = dir.path().join("portfolio.db");
        let path = write_config(
            dir.path(),
            &format!(
                "[trader]\nwatchlist = AAPL\ninitial_cash = 1000\n\n\
                 [store]\nbackend = sqlite\npath = {}\n\n\
                 [prices]\npath = {}\n",
                db.display(),
                dir.path().join("prices").display()
            ),
        );

        assert_eq!(
            invoke(&["altrader", "run", "-c", path.to_str().unwrap()]),
            ExitCode::SUCCESS
        );

        let snapshot = SqliteStore::open(db.to_str().unwrap())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(snapshot.ledger.len(), 1);
        assert_eq!(snapshot.watchlist.tickers(), vec!["AAPL"]);
    }
}
