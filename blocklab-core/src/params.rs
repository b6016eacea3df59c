//! Strategy parameters — the immutable configuration value every stage reads.
//!
//! - `StrategyParams`: detection and simulation coefficients for one run.
//! - `TradingMode`: which zone directions are traded.
//! - `SizeBounds`: optional `[lower, upper)` filter on zone height percentage.
//! - `params_hash()`: BLAKE3 over canonical JSON, for sweep bookkeeping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ParamsHash, Side};

/// Configuration errors, surfaced when a pipeline is constructed.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("zigzag window size must be >= 2 (got {0})")]
    WindowTooSmall(usize),

    #[error("{name} must be finite (got {value})")]
    NonFinite { name: &'static str, value: f64 },

    #[error("{name} must be > 0 (got {value})")]
    NonPositive { name: &'static str, value: f64 },

    #[error("fib retracement coefficient must be >= 0 (got {0})")]
    NegativeFibCoeff(f64),

    #[error("target count must be >= 1")]
    NoTargets,

    #[error("max concurrent zones must be >= 1")]
    NoConcurrency,

    #[error("trailing stop target id {id} exceeds target count {n_targets}")]
    TrailingTargetOutOfRange { id: usize, n_targets: usize },

    #[error("zone size bounds are inverted: lower {lower} >= upper {upper}")]
    InvertedSizeBounds { lower: f64, upper: f64 },
}

/// Which directions are allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradingMode {
    LongOnly,
    ShortOnly,
    #[default]
    LongShort,
}

impl TradingMode {
    pub fn allows(self, side: Side) -> bool {
        match self {
            TradingMode::LongOnly => side == Side::Long,
            TradingMode::ShortOnly => side == Side::Short,
            TradingMode::LongShort => true,
        }
    }
}

/// Optional zone-size filter on `height_percentage`, lower inclusive, upper exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeBounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl SizeBounds {
    pub fn contains(&self, height_percentage: f64) -> bool {
        self.lower.map_or(true, |lo| height_percentage >= lo)
            && self.upper.map_or(true, |hi| height_percentage < hi)
    }
}

/// Parameters of one pipeline run.
///
/// Constructed once, validated by `Pipeline::new`, and shared read-only by
/// every stage. Sweeps clone and override it per combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Trailing window (candles) for the rolling high/low of the zigzag.
    pub zigzag_window_size: usize,
    /// Extra retracement beyond the source pivot required to break structure.
    pub fib_retracement_coeff: f64,
    /// Stop distance from entry, in zone heights.
    pub stoploss_coeff: f64,
    /// Spacing between consecutive targets, in zone heights.
    pub target_coeff: f64,
    pub n_targets: usize,
    /// Entry attempts allowed per zone.
    pub max_bounces: u32,
    /// Zones per direction that may be open at once.
    pub max_concurrent: usize,
    /// Target whose hit moves the stop to breakeven. 0 disables trailing.
    pub trailing_sl_target_id: usize,
    /// Capital committed per entry.
    pub used_capital: f64,
    pub size_bounds: SizeBounds,
    pub trading_mode: TradingMode,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            zigzag_window_size: 10,
            fib_retracement_coeff: 0.0,
            stoploss_coeff: 1.0,
            target_coeff: 1.0,
            n_targets: 4,
            max_bounces: 1,
            max_concurrent: 3,
            trailing_sl_target_id: 0,
            used_capital: 100.0,
            size_bounds: SizeBounds::default(),
            trading_mode: TradingMode::LongShort,
        }
    }
}

impl StrategyParams {
    /// Check every parameter; the first violation wins.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.zigzag_window_size < 2 {
            return Err(ParamsError::WindowTooSmall(self.zigzag_window_size));
        }

        let finite = [
            ("fib_retracement_coeff", self.fib_retracement_coeff),
            ("stoploss_coeff", self.stoploss_coeff),
            ("target_coeff", self.target_coeff),
            ("used_capital", self.used_capital),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ParamsError::NonFinite { name, value });
            }
        }
        if self.fib_retracement_coeff < 0.0 {
            return Err(ParamsError::NegativeFibCoeff(self.fib_retracement_coeff));
        }

        let positive = [
            ("stoploss_coeff", self.stoploss_coeff),
            ("target_coeff", self.target_coeff),
            ("used_capital", self.used_capital),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(ParamsError::NonPositive { name, value });
            }
        }

        if self.n_targets == 0 {
            return Err(ParamsError::NoTargets);
        }
        if self.max_concurrent == 0 {
            return Err(ParamsError::NoConcurrency);
        }
        if self.trailing_sl_target_id > self.n_targets {
            return Err(ParamsError::TrailingTargetOutOfRange {
                id: self.trailing_sl_target_id,
                n_targets: self.n_targets,
            });
        }
        if let (Some(lower), Some(upper)) = (self.size_bounds.lower, self.size_bounds.upper) {
            if lower >= upper {
                return Err(ParamsError::InvertedSizeBounds { lower, upper });
            }
        }
        Ok(())
    }

    /// Trailing stop target, `None` when disabled.
    pub fn trailing_target(&self) -> Option<usize> {
        (self.trailing_sl_target_id > 0).then_some(self.trailing_sl_target_id)
    }

    /// Exact identity of this parameter set.
    pub fn params_hash(&self) -> ParamsHash {
        // Field order is fixed by the struct definition, so the JSON is canonical.
        let json = serde_json::to_string(self).unwrap_or_default();
        ParamsHash::from_bytes(json.as_bytes())
    }
}
