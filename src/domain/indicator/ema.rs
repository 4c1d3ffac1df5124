//! EMA (Exponential Moving Average).
//!
//! Seeded with the SMA of the first `period` closes, then
//! ema = close * k + prev_ema * (1 - k), with k = 2 / (period + 1).
//! Warmup: first (period - 1) positions are `None`.

pub fn ema_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return values;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = closes[..period].iter().sum::<f64>() / period as f64;
    values[period - 1] = Some(ema);

    for (i, &close) in closes.iter().enumerate().skip(period) {
        ema = close * k + ema * (1.0 - k);
        values[i] = Some(ema);
    }
    values
}

pub fn calculate_ema(closes: &[f64], period: usize) -> Option<f64> {
    ema_series(closes, period).last().copied().flatten()
}
