//! Paper trade execution.
//!
//! Applies a gate-approved order to an asset and produces the ledger record.
//! All validation happens before the asset is touched, so a rejected order
//! leaves no partial state behind.

use chrono::NaiveDateTime;

use super::asset::Asset;
use super::error::AlTraderError;
use super::signal::TradeSide;
use super::trade::TradeRecord;

/// Execute `count` shares of `side` for `asset` at its current price.
///
/// On success the asset's shares and `cash_change` are updated and the
/// immutable trade record is returned for the ledger.
pub fn execute_trade(
    asset: &mut Asset,
    side: TradeSide,
    count: u64,
    timestamp: NaiveDateTime,
) -> Result<TradeRecord, AlTraderError> {
    let reject = |reason: String| AlTraderError::Trade {
        ticker: asset.ticker.clone(),
        reason,
    };

    if !asset.is_priced() || !asset.price.is_finite() {
        return Err(reject(format!("invalid price {}", asset.price)));
    }
    if count == 0 {
        return Err(reject("zero share order".to_string()));
    }
    if side == TradeSide::Sell && count > asset.shares {
        return Err(reject(format!(
            "cannot sell {} shares, holding {}",
            count, asset.shares
        )));
    }

    asset.fill(side, count);

    Ok(TradeRecord {
        timestamp,
        ticker: asset.ticker.clone(),
        side,
        shares: count,
        value: asset.price * count as f64,
    })
}
