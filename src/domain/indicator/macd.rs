//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line, seeded with the SMA of the first
//! `signal` MACD values
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: slow - 1 + signal - 1 positions are `None`.

use super::ema::ema_series;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn macd_histogram_series(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];
    if fast == 0 || slow == 0 || signal_period == 0 {
        return values;
    }

    let ema_fast = ema_series(closes, fast);
    let ema_slow = ema_series(closes, slow);
    let macd_line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let Some(first) = macd_line.iter().position(Option::is_some) else {
        return values;
    };
    if closes.len() < first + signal_period {
        return values;
    }

    let k = 2.0 / (signal_period as f64 + 1.0);
    let seed_end = first + signal_period;
    let mut signal = macd_line[first..seed_end]
        .iter()
        .flatten()
        .sum::<f64>()
        / signal_period as f64;

    for i in (seed_end - 1)..closes.len() {
        let Some(line) = macd_line[i] else {
            continue;
        };
        if i >= seed_end {
            signal = line * k + signal * (1.0 - k);
        }
        values[i] = Some(line - signal);
    }
    values
}

pub fn calculate_macd_histogram(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Option<f64> {
    macd_histogram_series(closes, fast, slow, signal_period)
        .last()
        .copied()
        .flatten()
}
