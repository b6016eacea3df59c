//! Order block — a reactive price zone anchored on a base candle.

use serde::{Deserialize, Serialize};

use super::{Candle, EventTag, ExitRecord, Position, Side, ZoneId};
use crate::params::StrategyParams;

/// A price zone created from a structure break.
///
/// Mutated only by the later pipeline stages: `end_pdi` by the concurrency
/// limiter, `events`, `remaining_bounces` and `exits` by the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub id: ZoneId,
    pub base_candle_pdi: usize,
    pub side: Side,
    /// First candle at which the zone can be traded.
    pub formation_pdi: usize,
    /// Last candle at which the zone accepts an entry; `None` while open-ended.
    pub end_pdi: Option<usize>,

    // ── Geometry ──
    pub top: f64,
    pub bottom: f64,
    pub height: f64,
    pub height_percentage: f64,

    // ── Simulation ──
    pub remaining_bounces: u32,
    pub position: Position,
    #[serde(skip)]
    pub events: Vec<EventTag>,
    pub exits: Vec<ExitRecord>,
}

impl OrderBlock {
    pub fn new(
        base_candle_pdi: usize,
        base_candle: &Candle,
        side: Side,
        formation_pdi: usize,
        params: &StrategyParams,
    ) -> Self {
        let top = base_candle.high;
        let bottom = base_candle.low;
        let height = base_candle.height();
        let entry_price = match side {
            Side::Long => top,
            Side::Short => bottom,
        };

        Self {
            id: ZoneId::new(base_candle_pdi, base_candle.time, side),
            base_candle_pdi,
            side,
            formation_pdi,
            end_pdi: None,
            top,
            bottom,
            height,
            height_percentage: base_candle.height_percentage(),
            remaining_bounces: params.max_bounces,
            position: Position::new(side, entry_price, height, params),
            events: Vec::new(),
            exits: Vec::new(),
        }
    }

    /// Last PDI at which an entry is allowed, given the series length.
    pub fn last_entry_pdi(&self, series_len: usize) -> usize {
        self.end_pdi.unwrap_or_else(|| series_len.saturating_sub(1))
    }

    /// Whether the zone accepts entries at `pdi`.
    pub fn is_active_at(&self, pdi: usize) -> bool {
        pdi >= self.formation_pdi && self.end_pdi.map_or(true, |end| pdi <= end)
    }

    pub fn net_profit(&self) -> f64 {
        self.exits.iter().map(|e| e.net_profit).sum()
    }
}
