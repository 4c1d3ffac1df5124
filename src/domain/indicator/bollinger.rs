//! Bollinger Bands.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the population standard deviation (divides by N).
//! Default parameters: period=20, multiplier=2.0

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn calculate_bollinger(closes: &[f64], period: usize, mult: f64) -> Option<Bands> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let variance = window
        .iter()
        .map(|c| {
            let diff = c - middle;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;
    let stddev = variance.sqrt();

    Some(Bands {
        upper: middle + mult * stddev,
        middle,
        lower: middle - mult * stddev,
    })
}

pub fn bollinger_series(closes: &[f64], period: usize, mult: f64) -> Vec<Option<Bands>> {
    (1..=closes.len())
        .map(|end| calculate_bollinger(&closes[..end], period, mult))
        .collect()
}
