//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use blocklab_core::domain::Candle;
use chrono::{Duration, NaiveDate, NaiveDateTime};

pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Candles from closes, 15 minutes apart: open is the previous close,
/// high/low pad the body by 1.
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle::new(
                start_time() + Duration::minutes(15 * i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
            )
        })
        .collect()
}

/// Candles from explicit `(high, low)` pairs, one hour apart.
pub fn make_ranges(bars: &[(f64, f64)]) -> Vec<Candle> {
    bars.iter()
        .enumerate()
        .map(|(i, &(high, low))| {
            Candle::new(start_time() + Duration::hours(i as i64), low, high, low, high)
        })
        .collect()
}

/// `100 + 8·sin(0.6·i)` on a 0.3-per-candle trend that reverses at candle 60,
/// rounded to cents.
pub const WAVE_CLOSES: [f64; 120] = [
    100.0, 104.82, 108.06, 108.69, 106.6, 102.63, 98.26, 95.13, 94.43, 96.52, //
    100.76, 105.79, 109.95, 111.89, 111.04, 107.8, 103.41, 99.5, 97.55, 98.35, //
    101.71, 106.57, 111.34, 114.45, 114.93, 112.7, 108.66, 104.32, 101.3, 100.76, //
    102.99, 107.32, 112.35, 116.41, 118.2, 117.19, 113.85, 109.44, 105.61, 103.8, //
    104.76, 108.24, 113.14, 117.85, 120.83, 121.15, 118.8, 114.69, 110.39, 107.48, //
    107.1, 109.47, 113.89, 118.9, 122.86, 124.5, 123.34, 119.9, 115.48, 111.73, //
    110.07, 110.57, 113.57, 117.91, 121.96, 124.21, 123.77, 120.68, 115.93, 111.06, //
    107.67, 106.84, 108.76, 112.65, 117.05, 120.31, 121.19, 119.28, 115.15, 110.12, //
    105.85, 103.74, 104.4, 107.51, 111.87, 115.86, 117.98, 117.38, 114.16, 109.36, //
    104.53, 101.26, 100.6, 102.65, 106.62, 110.99, 114.14, 114.87, 112.82, 108.59, //
    103.56, 99.39, 97.41, 98.23, 101.45, 105.84, 109.76, 111.74, 110.98, 107.64, //
    102.79, 98.01, 94.87, 94.36, 96.55, 100.58, 104.93, 107.97, 108.55, 106.35, //
];

pub fn wave_candles() -> Vec<Candle> {
    make_candles(&WAVE_CLOSES)
}

pub fn assert_approx(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() < tol,
        "expected {expected}, got {actual} (tol {tol})"
    );
}
