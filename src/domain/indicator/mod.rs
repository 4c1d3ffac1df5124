//! Technical indicators computed from closing prices.
//!
//! Every indicator comes in two shapes:
//! - a `calculate_*` function returning the latest value over the trailing
//!   window, `None` when the window cannot be filled;
//! - a `*_series` function returning one `Option` per input close, used by
//!   the dataset builder.
//!
//! `IndicatorKind` names the indicators that can be consulted by the decision
//! policy; `IndicatorReadings` holds one asset's evaluated values.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

use std::fmt;
use std::str::FromStr;

pub use bollinger::Bands;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Rsi,
    Sma,
    Ema,
    Macd,
    Bollinger,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 5] = [
        IndicatorKind::Rsi,
        IndicatorKind::Sma,
        IndicatorKind::Ema,
        IndicatorKind::Macd,
        IndicatorKind::Bollinger,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Sma => "sma",
            IndicatorKind::Ema => "ema",
            IndicatorKind::Macd => "macd",
            IndicatorKind::Bollinger => "bb",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown indicator: {0}")]
pub struct UnknownIndicator(pub String);

impl FromStr for IndicatorKind {
    type Err = UnknownIndicator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rsi" => Ok(IndicatorKind::Rsi),
            "sma" => Ok(IndicatorKind::Sma),
            "ema" => Ok(IndicatorKind::Ema),
            "macd" => Ok(IndicatorKind::Macd),
            "bb" | "bollinger" => Ok(IndicatorKind::Bollinger),
            other => Err(UnknownIndicator(other.to_string())),
        }
    }
}

/// Parse a comma separated, ordered indicator list such as `"rsi,macd"`.
pub fn parse_indicator_list(input: &str) -> Result<Vec<IndicatorKind>, UnknownIndicator> {
    input
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Lookback parameters for every indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub sma_period: usize,
    pub ema_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_mult: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            rsi_period: rsi::DEFAULT_PERIOD,
            sma_period: 10,
            ema_period: 10,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            bollinger_period: bollinger::DEFAULT_PERIOD,
            bollinger_mult: bollinger::DEFAULT_MULT,
        }
    }
}

impl IndicatorParams {
    /// Closes needed before `kind` yields a reading.
    pub fn min_closes(&self, kind: IndicatorKind) -> usize {
        match kind {
            IndicatorKind::Rsi => self.rsi_period + 1,
            IndicatorKind::Sma => self.sma_period,
            IndicatorKind::Ema => self.ema_period,
            IndicatorKind::Macd => {
                (self.macd_fast.max(self.macd_slow) + self.macd_signal).saturating_sub(1)
            }
            IndicatorKind::Bollinger => self.bollinger_period,
        }
    }

    /// Closes needed for RSI (always shown on the watchlist) and every
    /// indicator in `kinds`. Never less than two, for the trend.
    pub fn lookback(&self, kinds: &[IndicatorKind]) -> usize {
        kinds
            .iter()
            .map(|&kind| self.min_closes(kind))
            .chain([self.min_closes(IndicatorKind::Rsi), 2])
            .max()
            .unwrap_or(2)
    }
}

/// Latest indicator values for one asset. `None` means "no signal".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorReadings {
    pub rsi: Option<f64>,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bollinger: Option<Bands>,
}

impl IndicatorReadings {
    /// Evaluate every indicator over the trailing window of `closes`.
    pub fn evaluate(closes: &[f64], params: &IndicatorParams) -> Self {
        IndicatorReadings {
            rsi: rsi::calculate_rsi(closes, params.rsi_period),
            sma: sma::calculate_sma(closes, params.sma_period),
            ema: ema::calculate_ema(closes, params.ema_period),
            macd_histogram: macd::calculate_macd_histogram(
                closes,
                params.macd_fast,
                params.macd_slow,
                params.macd_signal,
            ),
            bollinger: bollinger::calculate_bollinger(
                closes,
                params.bollinger_period,
                params.bollinger_mult,
            ),
        }
    }
}
