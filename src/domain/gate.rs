//! Tradability gate: account and position constraints checked before an
//! order is executed.
//!
//! The gate is a pure predicate over its inputs.

use super::asset::Asset;
use super::signal::Signal;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GateConfig {
    /// Compare cash against the full order cost (price × shares) instead of
    /// the unit price. Off by default: the unit-price comparison is the
    /// established behaviour and lets a buy overdraw cash.
    pub strict_cash_check: bool,
}

/// Whole shares affordable with `cash` at `price`.
pub fn buyable_shares(price: f64, cash: f64) -> u64 {
    if price <= 0.0 || cash <= 0.0 || !price.is_finite() || !cash.is_finite() {
        return 0;
    }
    (cash / price).floor() as u64
}

/// Whether `order` for `num_shares` of `asset` may be executed.
///
/// - buy: cash strictly exceeds the unit price (or the full cost under
///   `strict_cash_check`) and the last trade in the ticker was not a buy;
/// - sell: held shares strictly exceed `num_shares` and the last trade in the
///   ticker was not a sell;
/// - neutral: never.
pub fn is_tradable(
    asset: &Asset,
    order: Signal,
    num_shares: u64,
    cash: f64,
    config: &GateConfig,
) -> bool {
    match order {
        Signal::Buy => {
            let required = if config.strict_cash_check {
                asset.price * num_shares as f64
            } else {
                asset.price
            };
            asset.is_priced() && cash > required && asset.last_activity != Signal::Buy
        }
        Signal::Sell => asset.shares > num_shares && asset.last_activity != Signal::Sell,
        Signal::Neutral => false,
    }
}
