//! Zigzag pivot detection from rolling-window extremes.
//!
//! A candle at position `i >= window` is a raw candidate when its high equals
//! the highest high (peak) or its low equals the lowest low (valley) of the
//! trailing `window` candles ending at `i`. A candle setting both resolves by
//! color: green probably printed its low first, so the high wins (peak); red
//! resolves to a valley.
//!
//! Consecutive candidates of the same type collapse onto the last one, which
//! is confirmed when the first candidate of the opposite type appears. The
//! trailing run never sees that confirmation and is not reported.

use tracing::debug;

use crate::domain::{Candle, CandleColor, Pivot, PivotType};

/// Rolling highest high and lowest low over `window` candles ending at each index.
///
/// Indices before the first full window are `NaN`.
pub fn rolling_extremes(candles: &[Candle], window: usize) -> (Vec<f64>, Vec<f64>) {
    let n = candles.len();
    let mut highs = vec![f64::NAN; n];
    let mut lows = vec![f64::NAN; n];

    if window == 0 || n < window {
        return (highs, lows);
    }

    for i in (window - 1)..n {
        let start = i + 1 - window;
        let slice = &candles[start..=i];
        highs[i] = slice.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        lows[i] = slice.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    }

    (highs, lows)
}

/// Raw, uncollapsed pivot candidates as `(pdi, type)` in index order.
pub fn raw_candidates(candles: &[Candle], window: usize) -> Vec<(usize, PivotType)> {
    if window == 0 || candles.len() <= window {
        return Vec::new();
    }

    let (max_high, min_low) = rolling_extremes(candles, window);

    (window..candles.len())
        .filter_map(|i| {
            let candle = &candles[i];
            let sets_high = candle.high >= max_high[i];
            let sets_low = candle.low <= min_low[i];

            match (sets_high, sets_low) {
                (true, false) => Some((i, PivotType::Peak)),
                (false, true) => Some((i, PivotType::Valley)),
                (true, true) => match candle.color() {
                    CandleColor::Green => Some((i, PivotType::Peak)),
                    CandleColor::Red => Some((i, PivotType::Valley)),
                },
                (false, false) => None,
            }
        })
        .collect()
}

/// Confirmed, strictly alternating pivots.
pub fn find_pivots(candles: &[Candle], window: usize) -> Vec<Pivot> {
    let candidates = raw_candidates(candles, window);

    let pivots: Vec<Pivot> = candidates
        .windows(2)
        .filter(|pair| pair[0].1 != pair[1].1)
        .map(|pair| {
            let (pdi, pivot_type) = pair[0];
            let (next_pdi, _) = pair[1];
            let candle = &candles[pdi];
            Pivot {
                pdi,
                time: candle.time,
                pivot_type,
                value: match pivot_type {
                    PivotType::Peak => candle.high,
                    PivotType::Valley => candle.low,
                },
                formation_time: candles[next_pdi].time,
            }
        })
        .collect();

    debug!(
        window,
        candidates = candidates.len(),
        pivots = pivots.len(),
        "zigzag computed"
    );

    pivots
}

/// Position in `pivots` of the pivot at candle `pdi`.
pub fn pivot_position(pivots: &[Pivot], pdi: usize) -> Option<usize> {
    pivots.binary_search_by_key(&pdi, |p| p.pdi).ok()
}

/// The pivot `delta` places after the one at candle `pdi`.
pub fn relative_pivot(pivots: &[Pivot], pdi: usize, delta: usize) -> Option<&Pivot> {
    pivot_position(pivots, pdi).and_then(|pos| pivots.get(pos + delta))
}
