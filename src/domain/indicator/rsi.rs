//! RSI (Relative Strength Index).
//!
//! Stateless: each call re-derives the value from the trailing window of
//! `period + 1` closes (`period` price changes), no smoothing carried over
//! from earlier calls.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100
//! If both are 0 (flat window): RSI = 50

pub const DEFAULT_PERIOD: usize = 14;

/// RSI over the last `period` changes of `closes`. `None` when fewer than
/// `period + 1` closes are available or `period == 0`.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let window = &closes[closes.len() - (period + 1)..];
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gain_sum += change;
        } else {
            loss_sum -= change;
        }
    }

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    let rsi = if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    };
    Some(rsi.clamp(0.0, 100.0))
}

/// RSI at every position of `closes`, each computed from its own trailing
/// window.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    (1..=closes.len())
        .map(|end| calculate_rsi(&closes[..end], period))
        .collect()
}
