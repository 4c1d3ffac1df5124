//! Rolling-window aggregates over gappy series.
//!
//! A position is `Some` only when its full trailing window of `period`
//! values is present, so warmup rows and rows near a gap stay `None`.
//! Standard deviation is the sample deviation (divides by N - 1).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingFn {
    Mean,
    Max,
    Min,
    Stdev,
    ZScore,
}

impl RollingFn {
    pub const ALL: [RollingFn; 5] = [
        RollingFn::Mean,
        RollingFn::Max,
        RollingFn::Min,
        RollingFn::Stdev,
        RollingFn::ZScore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RollingFn::Mean => "rolling_mean",
            RollingFn::Max => "rolling_max",
            RollingFn::Min => "rolling_min",
            RollingFn::Stdev => "rolling_stdev",
            RollingFn::ZScore => "z_score",
        }
    }

    pub fn apply(&self, values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
        match self {
            RollingFn::Mean => rolling_mean(values, period),
            RollingFn::Max => rolling_max(values, period),
            RollingFn::Min => rolling_min(values, period),
            RollingFn::Stdev => rolling_stdev(values, period),
            RollingFn::ZScore => z_score(values, period),
        }
    }
}

impl fmt::Display for RollingFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn rolling<F>(values: &[Option<f64>], period: usize, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    let mut window = Vec::with_capacity(period);
    for end in period..=values.len() {
        window.clear();
        window.extend(values[end - period..end].iter().map_while(|v| *v));
        if window.len() == period {
            out[end - 1] = reduce(&window);
        }
    }
    out
}

fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

fn sample_stdev(window: &[f64]) -> Option<f64> {
    if window.len() < 2 {
        return None;
    }
    let m = mean(window);
    let var = window.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (window.len() - 1) as f64;
    Some(var.sqrt())
}

pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| Some(mean(w)))
}

pub fn rolling_max(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().copied().reduce(f64::max))
}

pub fn rolling_min(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().copied().reduce(f64::min))
}

pub fn rolling_stdev(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, sample_stdev)
}

/// Distance of the newest value from the window mean, in sample standard
/// deviations. `None` for a flat window.
pub fn z_score(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| {
        let sd = sample_stdev(w)?;
        if sd == 0.0 {
            return None;
        }
        let last = *w.last()?;
        Some((last - mean(w)) / sd)
    })
}

/// Relative change from the previous position; `None` when either side is
/// missing or the previous value is zero.
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    for i in 1..values.len() {
        if let (Some(prev), Some(cur)) = (values[i - 1], values[i]) {
            if prev != 0.0 {
                out[i] = Some((cur - prev) / prev);
            }
        }
    }
    out
}

/// Value `n` positions ahead; the last `n` positions are `None`.
pub fn lead(values: &[Option<f64>], n: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| values.get(i + n).copied().flatten())
        .collect()
}
