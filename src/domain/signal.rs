//! Directional signals and per-indicator classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::indicator::{IndicatorKind, IndicatorReadings};

/// Direction suggested by an indicator, a decision, or the most recent trade
/// of a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Neutral,
}

/// Side of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
            Signal::Neutral => "neutral",
        }
    }

    /// The trade side this signal asks for, `None` for neutral.
    pub fn side(&self) -> Option<TradeSide> {
        match self {
            Signal::Buy => Some(TradeSide::Buy),
            Signal::Sell => Some(TradeSide::Sell),
            Signal::Neutral => None,
        }
    }
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }
}

impl From<TradeSide> for Signal {
    fn from(side: TradeSide) -> Self {
        match side {
            TradeSide::Buy => Signal::Buy,
            TradeSide::Sell => Signal::Sell,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TradeSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(TradeSide::Buy),
            "sell" => Ok(TradeSide::Sell),
            other => Err(format!("invalid trade side: {other}")),
        }
    }
}

/// Symmetric RSI threshold pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiThresholds {
    pub buy_below: f64,
    pub sell_above: f64,
}

impl Default for RsiThresholds {
    fn default() -> Self {
        RsiThresholds {
            buy_below: 45.0,
            sell_above: 55.0,
        }
    }
}

/// RSI below `buy_below` buys, above `sell_above` sells, otherwise neutral.
pub fn classify_rsi(rsi: f64, thresholds: &RsiThresholds) -> Signal {
    if rsi < thresholds.buy_below {
        Signal::Buy
    } else if rsi > thresholds.sell_above {
        Signal::Sell
    } else {
        Signal::Neutral
    }
}

/// Price below the average reads as a dip to buy, above as a stretch to sell.
fn classify_average(price: f64, average: f64) -> Signal {
    if price < average {
        Signal::Buy
    } else if price > average {
        Signal::Sell
    } else {
        Signal::Neutral
    }
}

/// Classify one indicator for an asset. Missing readings are "no signal".
pub fn classify(
    kind: IndicatorKind,
    readings: &IndicatorReadings,
    price: f64,
    thresholds: &RsiThresholds,
) -> Signal {
    match kind {
        IndicatorKind::Rsi => readings
            .rsi
            .map_or(Signal::Neutral, |rsi| classify_rsi(rsi, thresholds)),
        IndicatorKind::Sma => readings
            .sma
            .map_or(Signal::Neutral, |avg| classify_average(price, avg)),
        IndicatorKind::Ema => readings
            .ema
            .map_or(Signal::Neutral, |avg| classify_average(price, avg)),
        IndicatorKind::Macd => match readings.macd_histogram {
            Some(h) if h > 0.0 => Signal::Buy,
            Some(h) if h < 0.0 => Signal::Sell,
            _ => Signal::Neutral,
        },
        IndicatorKind::Bollinger => match readings.bollinger {
            Some(bands) if price < bands.lower => Signal::Buy,
            Some(bands) if price > bands.upper => Signal::Sell,
            _ => Signal::Neutral,
        },
    }
}
