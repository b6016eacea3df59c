//! Per-candle event tags produced by the event classifier.

use serde::{Deserialize, Serialize};

/// What a candle does to a zone's position, after precedence is applied.
///
/// Precedence within one candle: `Stoploss` > `Entry` > `Target` > `NoEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTag {
    NoEvent,
    Stoploss,
    Entry,
    /// Highest target level (1-indexed) touched on this candle.
    Target(usize),
}

impl EventTag {
    /// Numeric code of the no-event sentinel.
    pub const NO_EVENT_CODE: f64 = 0.5;

    /// Numeric encoding: `-1` stoploss, `0` entry, `k` target k, `0.5` nothing.
    pub fn code(self) -> f64 {
        match self {
            EventTag::NoEvent => Self::NO_EVENT_CODE,
            EventTag::Stoploss => -1.0,
            EventTag::Entry => 0.0,
            EventTag::Target(k) => k as f64,
        }
    }
}
