//! Core domain types and logic.

pub mod asset;
pub mod config_validation;
pub mod dataset;
pub mod decision;
pub mod error;
pub mod execution;
pub mod gate;
pub mod indicator;
pub mod ohlcv;
pub mod portfolio;
pub mod run;
pub mod signal;
pub mod summary;
pub mod trade;
pub mod watchlist;
