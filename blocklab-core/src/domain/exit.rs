//! ExitRecord — one realized trade outcome of an order block.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Side, ZoneId};

/// How a position was closed.
///
/// Serialized as `STOPLOSS`, `TARGET_k` or `FULL_TARGET_n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ExitStatus {
    /// Stopped out before any target was reached.
    Stoploss,
    /// Closed by the stop (or the breakeven stop) after reaching target k.
    Target(usize),
    /// Every target reached; k is the target count.
    FullTarget(usize),
}

impl ExitStatus {
    pub fn is_full_target(self) -> bool {
        matches!(self, ExitStatus::FullTarget(_))
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Stoploss => write!(f, "STOPLOSS"),
            ExitStatus::Target(k) => write!(f, "TARGET_{k}"),
            ExitStatus::FullTarget(k) => write!(f, "FULL_TARGET_{k}"),
        }
    }
}

impl FromStr for ExitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "STOPLOSS" {
            return Ok(ExitStatus::Stoploss);
        }
        let parse = |digits: &str| {
            digits
                .parse::<usize>()
                .map_err(|_| format!("invalid exit status: {s}"))
        };
        if let Some(k) = s.strip_prefix("FULL_TARGET_") {
            return parse(k).map(ExitStatus::FullTarget);
        }
        if let Some(k) = s.strip_prefix("TARGET_") {
            return parse(k).map(ExitStatus::Target);
        }
        Err(format!("invalid exit status: {s}"))
    }
}

impl From<ExitStatus> for String {
    fn from(status: ExitStatus) -> Self {
        status.to_string()
    }
}

impl TryFrom<String> for ExitStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A completed entry → exit of one order block's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRecord {
    // ── Identification ──
    pub symbol: String,
    pub zone_id: ZoneId,
    pub side: Side,
    pub capital_used: f64,

    // ── Outcome ──
    pub status: ExitStatus,
    pub net_profit: f64,
    pub quantity: f64,

    // ── Entry ──
    pub entry_pdi: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_pdi: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub target_hit_times: Vec<NaiveDateTime>,

    // ── Levels ──
    pub stoploss: f64,
    pub target_list: Vec<f64>,
}

impl ExitRecord {
    pub fn is_winner(&self) -> bool {
        self.net_profit > 0.0
    }

    pub fn targets_hit(&self) -> usize {
        self.target_hit_times.len()
    }

    /// Net profit as a fraction of the capital committed.
    pub fn return_pct(&self) -> f64 {
        if self.capital_used == 0.0 {
            return 0.0;
        }
        self.net_profit / self.capital_used
    }
}
