//! Structure breaks (MSB points) and trade direction.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::CandleColor;

/// Trade direction of a structure break, order block, or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Color of the order block's base candle: the last opposing candle
    /// before the impulsive move.
    pub fn base_candle_color(self) -> CandleColor {
        match self {
            Side::Long => CandleColor::Red,
            Side::Short => CandleColor::Green,
        }
    }

    pub fn is_long(self) -> bool {
        self == Side::Long
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// A structure break anchored on a source pivot.
///
/// `formation_pdi` is the first candle that crossed the retracement
/// threshold derived from the source pivot and the pivot after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsbPoint {
    /// PDI of the source pivot.
    pub pdi: usize,
    /// Value of the source pivot.
    pub msb_value: f64,
    pub side: Side,
    pub formation_pdi: usize,
}
