//! Position — the trade an order block offers, re-entered once per bounce.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Candle, ExitRecord, ExitStatus, Side, ZoneId};
use crate::params::StrategyParams;

/// Invariant breaches inside a zone's simulation.
///
/// These are distinct from lookup misses, which are plain `None`s: a
/// `SimulationError` means the state machine tried something the zone does
/// not allow, and the zone's results cannot be trusted.
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("entry pdi {entry_pdi} is outside zone {zone_id} window [{formation_pdi}, {end_pdi}]")]
    EntryOutOfBounds {
        zone_id: ZoneId,
        entry_pdi: usize,
        formation_pdi: usize,
        end_pdi: usize,
    },

    #[error("zone {0} tried to exit a position that was never entered")]
    NotEntered(ZoneId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Active,
    Entered,
    Exited,
}

/// Entry, stop and target levels of an order block's trade.
///
/// Levels are fixed at construction. Quantity and entry index are set on
/// every `enter()`; the breakeven stop is a state machine rule, `stoploss`
/// itself never moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub entry_price: f64,
    pub stoploss: f64,
    /// Target prices, nearest first.
    pub target_list: Vec<f64>,
    pub quantity: f64,
    /// Quantity closed at each target.
    pub portioned_qty: Vec<f64>,
    pub capital_used: f64,
    pub entry_pdi: Option<usize>,
    pub status: PositionStatus,
}

impl Position {
    /// Derive stop and targets from the entry price and zone height.
    ///
    /// long: stop = entry − sl·h, target_k = entry + k·tc·h
    /// short: stop = entry + sl·h, target_k = entry − k·tc·h
    pub fn new(side: Side, entry_price: f64, zone_height: f64, params: &StrategyParams) -> Self {
        let stop_distance = params.stoploss_coeff * zone_height;
        let (stoploss, target_list) = match side {
            Side::Long => (
                entry_price - stop_distance,
                (1..=params.n_targets)
                    .map(|k| entry_price + k as f64 * params.target_coeff * zone_height)
                    .collect(),
            ),
            Side::Short => (
                entry_price + stop_distance,
                (1..=params.n_targets)
                    .map(|k| entry_price - k as f64 * params.target_coeff * zone_height)
                    .collect(),
            ),
        };

        Self {
            side,
            entry_price,
            stoploss,
            target_list,
            quantity: 0.0,
            portioned_qty: Vec::new(),
            capital_used: params.used_capital,
            entry_pdi: None,
            status: PositionStatus::Active,
        }
    }

    pub fn target_count(&self) -> usize {
        self.target_list.len()
    }

    /// Price of target `k` (1-indexed).
    pub fn target(&self, k: usize) -> Option<f64> {
        k.checked_sub(1).and_then(|i| self.target_list.get(i).copied())
    }

    /// Enter at `entry_pdi`, which must lie in `[formation_pdi, end_pdi]`.
    pub fn enter(
        &mut self,
        zone_id: &ZoneId,
        entry_pdi: usize,
        formation_pdi: usize,
        end_pdi: usize,
    ) -> Result<(), SimulationError> {
        if entry_pdi < formation_pdi || entry_pdi > end_pdi {
            return Err(SimulationError::EntryOutOfBounds {
                zone_id: zone_id.clone(),
                entry_pdi,
                formation_pdi,
                end_pdi,
            });
        }

        let target_count = self.target_count();
        self.entry_pdi = Some(entry_pdi);
        self.quantity = self.capital_used / self.entry_price;
        self.portioned_qty = vec![self.quantity / target_count as f64; target_count];
        self.status = PositionStatus::Entered;
        Ok(())
    }

    /// Net profit of an exit after `targets_hit` targets.
    ///
    /// Hit targets close their portions at the target prices; the rest
    /// settles at `exit_price`, except on a full-target exit where nothing
    /// is left over.
    pub fn net_profit(&self, targets_hit: usize, exit_price: f64, full_target: bool) -> f64 {
        let hit = targets_hit.min(self.portioned_qty.len());
        let target_value: f64 = self.portioned_qty[..hit]
            .iter()
            .zip(&self.target_list[..hit])
            .map(|(qty, price)| qty * price)
            .sum();
        let hit_qty: f64 = self.portioned_qty[..hit].iter().sum();
        let remainder_value = if full_target {
            0.0
        } else {
            (self.quantity - hit_qty) * exit_price
        };
        let entry_value = self.quantity * self.entry_price;

        match self.side {
            Side::Long => target_value + remainder_value - entry_value,
            Side::Short => entry_value - target_value - remainder_value,
        }
    }

    /// Close the position and produce its exit record.
    #[allow(clippy::too_many_arguments)]
    pub fn exit(
        &mut self,
        symbol: &str,
        zone_id: &ZoneId,
        candles: &[Candle],
        status: ExitStatus,
        exit_pdi: usize,
        target_hit_pdis: &[usize],
        exit_price: f64,
    ) -> Result<ExitRecord, SimulationError> {
        let entry_pdi = self
            .entry_pdi
            .ok_or_else(|| SimulationError::NotEntered(zone_id.clone()))?;

        let net_profit =
            self.net_profit(target_hit_pdis.len(), exit_price, status.is_full_target());
        self.status = PositionStatus::Exited;

        Ok(ExitRecord {
            symbol: symbol.to_string(),
            zone_id: zone_id.clone(),
            side: self.side,
            capital_used: self.capital_used,
            status,
            net_profit,
            quantity: self.quantity,
            entry_pdi,
            entry_time: candles[entry_pdi].time,
            entry_price: self.entry_price,
            exit_pdi,
            exit_time: candles[exit_pdi].time,
            exit_price,
            target_hit_times: target_hit_pdis.iter().map(|&pdi| candles[pdi].time).collect(),
            stoploss: self.stoploss,
            target_list: self.target_list.clone(),
        })
    }
}
