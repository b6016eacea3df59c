//! Detection stages: pivots, structure breaks, order blocks, concurrency.

pub mod concurrency;
pub mod order_blocks;
pub mod structure;
pub mod zigzag;

pub use concurrency::{active_count, limit_concurrent};
pub use order_blocks::{base_candle_pdi, find_order_blocks};
pub use structure::{break_threshold, find_msb_points, msb_at};
pub use zigzag::{find_pivots, pivot_position, raw_candidates, relative_pivot, rolling_extremes};

/// Candles from closes: open is the previous close, high/low pad the body by 1.
#[cfg(test)]
pub(crate) fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use chrono::{Duration, NaiveDate};

    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();

    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            crate::domain::Candle::new(
                start + Duration::minutes(15 * i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
            )
        })
        .collect()
}
