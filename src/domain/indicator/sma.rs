//! Simple moving average of closes.

pub fn calculate_sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

pub fn sma_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    (1..=closes.len())
        .map(|end| calculate_sma(&closes[..end], period))
        .collect()
}
