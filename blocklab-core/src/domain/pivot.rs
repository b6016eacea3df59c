//! Zigzag pivots — confirmed local highs and lows.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotType {
    Peak,
    Valley,
}

impl PivotType {
    pub fn opposite(self) -> Self {
        match self {
            PivotType::Peak => PivotType::Valley,
            PivotType::Valley => PivotType::Peak,
        }
    }

    /// Direction of the structure break a pivot of this type can produce.
    ///
    /// A broken valley yields a short setup, a broken peak a long one.
    pub fn break_side(self) -> Side {
        match self {
            PivotType::Peak => Side::Long,
            PivotType::Valley => Side::Short,
        }
    }
}

/// A confirmed turning point of the zigzag.
///
/// `value` is the high of the candle at `pdi` for a peak and its low for a
/// valley. `formation_time` is when the pivot became confirmed: the time of
/// the first opposite-type candidate after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    pub pdi: usize,
    pub time: NaiveDateTime,
    pub pivot_type: PivotType,
    pub value: f64,
    pub formation_time: NaiveDateTime,
}

impl Pivot {
    pub fn is_peak(&self) -> bool {
        self.pivot_type == PivotType::Peak
    }

    pub fn is_valley(&self) -> bool {
        self.pivot_type == PivotType::Valley
    }
}
