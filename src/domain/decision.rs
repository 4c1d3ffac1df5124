//! Decision policy: plurality vote across the consulted indicators.

use super::asset::Asset;
use super::indicator::IndicatorKind;
use super::signal::{classify, RsiThresholds, Signal};

/// Plurality vote over `votes`. Ties go to the signal encountered first;
/// an empty vote is neutral.
pub fn plurality(votes: &[Signal]) -> Signal {
    let mut tally: Vec<(Signal, usize)> = Vec::with_capacity(3);
    for &vote in votes {
        match tally.iter_mut().find(|(signal, _)| *signal == vote) {
            Some((_, count)) => *count += 1,
            None => tally.push((vote, 1)),
        }
    }

    let mut winner: Option<(Signal, usize)> = None;
    for (signal, count) in tally {
        match winner {
            Some((_, best)) if count <= best => {}
            _ => winner = Some((signal, count)),
        }
    }
    winner.map_or(Signal::Neutral, |(signal, _)| signal)
}

/// Classify each of `indicators` for `asset` in order and return the
/// plurality decision.
pub fn check_indicators(
    asset: &Asset,
    indicators: &[IndicatorKind],
    thresholds: &RsiThresholds,
) -> Signal {
    let votes: Vec<Signal> = indicators
        .iter()
        .map(|&kind| classify(kind, &asset.indicators, asset.price, thresholds))
        .collect();
    plurality(&votes)
}
