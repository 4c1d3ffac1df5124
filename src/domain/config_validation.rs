//! Configuration validation.
//!
//! Validates every `[trader]`, `[store]`, `[notify]` and `[dataset]` field
//! before a run starts, so a bad file fails fast with exit code 2.

use crate::domain::error::AlTraderError;
use crate::domain::indicator::parse_indicator_list;
use crate::domain::watchlist::parse_tickers;
use crate::ports::config_port::ConfigPort;

pub const STORE_BACKENDS: [&str; 2] = ["csv", "sqlite"];

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> AlTraderError {
    AlTraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_trader_config(config: &dyn ConfigPort) -> Result<(), AlTraderError> {
    validate_watchlist(config)?;
    validate_indicators(config)?;
    validate_rsi(config)?;
    validate_history_days(config)?;
    validate_initial_cash(config)?;
    validate_notify_hour(config)?;
    Ok(())
}

pub fn validate_store_config(config: &dyn ConfigPort) -> Result<(), AlTraderError> {
    let backend = config
        .get_string("store", "backend")
        .unwrap_or_else(|| "csv".to_string());
    if !STORE_BACKENDS.contains(&backend.trim().to_lowercase().as_str()) {
        return Err(invalid(
            "store",
            "backend",
            format!("unknown backend '{backend}', expected csv or sqlite"),
        ));
    }
    Ok(())
}

pub fn validate_notify_config(config: &dyn ConfigPort) -> Result<(), AlTraderError> {
    if !config.get_bool("notify", "enabled", false) {
        return Ok(());
    }
    for key in ["sender", "recipient"] {
        match config.get_string("notify", key) {
            Some(s) if s.contains('@') => {}
            Some(_) => return Err(invalid("notify", key, "not an email address")),
            None => {
                return Err(AlTraderError::ConfigMissing {
                    section: "notify".to_string(),
                    key: key.to_string(),
                })
            }
        }
    }
    Ok(())
}

pub fn validate_dataset_config(config: &dyn ConfigPort) -> Result<(), AlTraderError> {
    if let Some(benchmark) = config.get_string("dataset", "benchmark") {
        if benchmark.trim().is_empty() {
            return Err(invalid("dataset", "benchmark", "benchmark ticker is empty"));
        }
    }
    if let Some(raw) = config.get_string("dataset", "periods") {
        parse_periods(&raw)?;
    }
    Ok(())
}

/// Parse a comma separated list of positive window lengths.
pub fn parse_periods(raw: &str) -> Result<Vec<usize>, AlTraderError> {
    let periods = raw
        .split(',')
        .map(|token| match token.trim().parse::<usize>() {
            Ok(0) => Err(invalid("dataset", "periods", "periods must be positive")),
            Ok(p) => Ok(p),
            Err(_) => Err(invalid(
                "dataset",
                "periods",
                format!("'{}' is not a window length", token.trim()),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if periods.is_empty() {
        return Err(invalid("dataset", "periods", "no periods given"));
    }
    Ok(periods)
}

fn validate_watchlist(config: &dyn ConfigPort) -> Result<(), AlTraderError> {
    if let Some(raw) = config.get_string("trader", "watchlist") {
        if !raw.trim().is_empty() {
            parse_tickers(&raw).map_err(|e| invalid("trader", "watchlist", e.to_string()))?;
        }
    }
    Ok(())
}

fn validate_indicators(config: &dyn ConfigPort) -> Result<(), AlTraderError> {
    if let Some(raw) = config.get_string("trader", "indicators") {
        let kinds =
            parse_indicator_list(&raw).map_err(|e| invalid("trader", "indicators", e.to_string()))?;
        if kinds.is_empty() {
            return Err(invalid("trader", "indicators", "no indicators given"));
        }
    }
    Ok(())
}

fn validate_rsi(config: &dyn ConfigPort) -> Result<(), AlTraderError> {
    if config.get_int("trader", "rsi_period", 14) < 1 {
        return Err(invalid("trader", "rsi_period", "rsi_period must be at least 1"));
    }

    let buy = config.get_double("trader", "rsi_buy_below", 45.0);
    let sell = config.get_double("trader", "rsi_sell_above", 55.0);
    for (key, value) in [("rsi_buy_below", buy), ("rsi_sell_above", sell)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid("trader", key, "threshold must be between 0 and 100"));
        }
    }
    if buy >= sell {
        return Err(invalid(
            "trader",
            "rsi_buy_below",
            "rsi_buy_below must be less than rsi_sell_above",
        ));
    }
    Ok(())
}

fn validate_history_days(config: &dyn ConfigPort) -> Result<(), AlTraderError> {
    if config.get_int("trader", "history_days", 30) < 1 {
        return Err(invalid("trader", "history_days", "history_days must be at least 1"));
    }
    Ok(())
}

fn validate_initial_cash(config: &dyn ConfigPort) -> Result<(), AlTraderError> {
    let value = config.get_double("trader", "initial_cash", 100_000.0);
    if value < 0.0 || !value.is_finite() {
        return Err(invalid("trader", "initial_cash", "initial_cash must be non-negative"));
    }
    Ok(())
}

fn validate_notify_hour(config: &dyn ConfigPort) -> Result<(), AlTraderError> {
    let hour = config.get_int("trader", "notify_after_hour", 16);
    if !(0..=23).contains(&hour) {
        return Err(invalid(
            "trader",
            "notify_after_hour",
            "notify_after_hour must be between 0 and 23",
        ));
    }
    Ok(())
}
