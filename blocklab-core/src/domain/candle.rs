//! Candle — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLC candle for a single symbol.
///
/// Candles live in an ordered slice; a candle's position in that slice is its
/// PDI (price data index). Every index stored by the detectors refers back to
/// this position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Body color of a candle. Doji candles (close == open) count as red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleColor {
    Green,
    Red,
}

impl Candle {
    pub fn new(time: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
        }
    }

    pub fn color(&self) -> CandleColor {
        if self.close > self.open {
            CandleColor::Green
        } else {
            CandleColor::Red
        }
    }

    pub fn height(&self) -> f64 {
        (self.high - self.low).abs()
    }

    /// Candle height as a percentage of its high/low midpoint.
    pub fn height_percentage(&self) -> f64 {
        self.height() / (self.high + self.low) * 2.0 * 100.0
    }

    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
    }
}

/// Series-level validation failures.
#[derive(Debug, Error, PartialEq)]
pub enum CandleError {
    #[error("candle {pdi} failed the OHLC sanity check")]
    Insane { pdi: usize },

    #[error("candle {pdi} is not later than its predecessor ({time})")]
    NonIncreasingTime { pdi: usize, time: NaiveDateTime },
}

/// Validate a candle series: every candle sane, times strictly increasing.
pub fn validate_series(candles: &[Candle]) -> Result<(), CandleError> {
    for (pdi, candle) in candles.iter().enumerate() {
        if !candle.is_sane() {
            return Err(CandleError::Insane { pdi });
        }
        if pdi > 0 && candle.time <= candles[pdi - 1].time {
            return Err(CandleError::NonIncreasingTime {
                pdi,
                time: candle.time,
            });
        }
    }
    Ok(())
}
