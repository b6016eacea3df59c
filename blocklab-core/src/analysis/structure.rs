//! Market-structure breaks over consecutive pivot triples.
//!
//! For pivots `P, N, M` in sequence, a valley `P` that `M` undercuts forms a
//! short break; a peak `P` that `M` exceeds forms a long break. The break
//! is dated by the first candle between `N` and `M` (inclusive) that crosses
//! the retracement threshold derived from `P` and `N`.

use tracing::debug;

use crate::domain::{Candle, MsbPoint, Pivot, PivotType};

/// Retracement threshold for the triple `(source, next)`.
///
/// valley: `N − (N − P)·(1 + k)`; peak: `N + (P − N)·(1 + k)`.
/// With `k = 0` both collapse onto the source pivot's value.
pub fn break_threshold(source: &Pivot, next: &Pivot, fib_coeff: f64) -> f64 {
    let scale = 1.0 + fib_coeff;
    match source.pivot_type {
        PivotType::Valley => next.value - (next.value - source.value) * scale,
        PivotType::Peak => next.value + (source.value - next.value) * scale,
    }
}

fn crosses(candle: &Candle, pivot_type: PivotType, threshold: f64) -> bool {
    match pivot_type {
        PivotType::Valley => candle.low < threshold,
        PivotType::Peak => candle.high > threshold,
    }
}

/// The break anchored on `pivots[pos]`, if the triple starting there forms one.
pub fn msb_at(candles: &[Candle], pivots: &[Pivot], pos: usize, fib_coeff: f64) -> Option<MsbPoint> {
    let source = pivots.get(pos)?;
    let next = pivots.get(pos + 1)?;
    let confirm = pivots.get(pos + 2)?;

    let broken = match source.pivot_type {
        PivotType::Valley => confirm.value < source.value,
        PivotType::Peak => confirm.value > source.value,
    };
    if !broken {
        return None;
    }

    let threshold = break_threshold(source, next, fib_coeff);
    let last = confirm.pdi.min(candles.len().checked_sub(1)?);
    let formation_pdi = (next.pdi..=last).find(|&i| crosses(&candles[i], source.pivot_type, threshold))?;

    Some(MsbPoint {
        pdi: source.pdi,
        msb_value: source.value,
        side: source.pivot_type.break_side(),
        formation_pdi,
    })
}

/// All structure breaks, in pivot order.
pub fn find_msb_points(candles: &[Candle], pivots: &[Pivot], fib_coeff: f64) -> Vec<MsbPoint> {
    let points: Vec<MsbPoint> = (0..pivots.len().saturating_sub(2))
        .filter_map(|pos| msb_at(candles, pivots, pos, fib_coeff))
        .collect();

    debug!(pivots = pivots.len(), msb_points = points.len(), "structure breaks found");
    points
}
