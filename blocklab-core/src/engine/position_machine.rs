//! Per-zone position lifecycle over the event tags.
//!
//! ```text
//!   SeekingEntry ──entry──▶ InPosition ──full target / breakeven──▶ SeekingEntry
//!        │                      │                                 (bounces left)
//!        │ stop                 │ stop / end of series
//!        ▼                      ▼
//!       Done ◀──────────────────┘
//! ```
//!
//! Each zone runs independently; the machine only mutates the zone it is
//! given.

use tracing::trace;

use super::events::classify_events;
use crate::domain::{Candle, EventTag, ExitStatus, OrderBlock, SimulationError};

/// Progress of the trade currently held by a zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub entry_pdi: usize,
    /// Highest target hit so far, 0 for none.
    pub highest_hit: usize,
    /// Candle of each hit target, nearest target first.
    pub target_hit_pdis: Vec<usize>,
    /// Stop promoted to the entry price.
    pub trailing_armed: bool,
}

impl Attempt {
    fn new(entry_pdi: usize) -> Self {
        Self {
            entry_pdi,
            highest_hit: 0,
            target_hit_pdis: Vec::new(),
            trailing_armed: false,
        }
    }

    /// Record target `k` hit at `pdi`, along with any skipped lower targets.
    fn hit_up_to(&mut self, k: usize, pdi: usize) {
        if k > self.highest_hit {
            let skipped = k - self.highest_hit;
            self.target_hit_pdis.extend(std::iter::repeat(pdi).take(skipped));
            self.highest_hit = k;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MachineState {
    SeekingEntry,
    InPosition(Attempt),
    Done,
}

/// Drives one zone's position through its event tags, one tag per transition.
pub struct PositionMachine<'a> {
    symbol: &'a str,
    candles: &'a [Candle],
    trailing_target: Option<usize>,
}

impl<'a> PositionMachine<'a> {
    pub fn new(symbol: &'a str, candles: &'a [Candle], trailing_target: Option<usize>) -> Self {
        Self {
            symbol,
            candles,
            trailing_target,
        }
    }

    /// Classify the zone's candles and run the machine to completion.
    ///
    /// Exits accumulate in `zone.exits`; `zone.remaining_bounces` reflects
    /// the attempts left when the machine stopped.
    pub fn run(&self, zone: &mut OrderBlock) -> Result<(), SimulationError> {
        zone.events = classify_events(self.candles, zone);

        let mut state = Self::ready(zone);
        for offset in 0..zone.events.len() {
            if state == MachineState::Done {
                return Ok(());
            }
            state = self.transition(zone, state, offset)?;
        }

        if let MachineState::InPosition(attempt) = state {
            trace!(zone = %zone.id, entry_pdi = attempt.entry_pdi, "position open at end of series");
        }
        Ok(())
    }

    /// State after an exit (or before the first entry).
    fn ready(zone: &OrderBlock) -> MachineState {
        if zone.remaining_bounces > 0 {
            MachineState::SeekingEntry
        } else {
            MachineState::Done
        }
    }

    /// Consume the tag at `offset` (candle `formation_pdi + offset`).
    pub fn transition(
        &self,
        zone: &mut OrderBlock,
        state: MachineState,
        offset: usize,
    ) -> Result<MachineState, SimulationError> {
        let Some(&tag) = zone.events.get(offset) else {
            return Ok(MachineState::Done);
        };
        let pdi = zone.formation_pdi + offset;

        match state {
            MachineState::Done => Ok(MachineState::Done),
            MachineState::SeekingEntry => self.seek(zone, tag, pdi),
            MachineState::InPosition(attempt) => self.hold(zone, attempt, tag, pdi),
        }
    }

    /// An entry tag past `end_pdi` is still taken: `Position::enter` rejects
    /// it and the error aborts the zone.
    fn seek(&self, zone: &mut OrderBlock, tag: EventTag, pdi: usize) -> Result<MachineState, SimulationError> {
        match tag {
            EventTag::Stoploss => {
                // Stop traded through before an entry: the zone is void.
                trace!(zone = %zone.id, pdi, "stopped before entry");
                zone.remaining_bounces = 0;
                Ok(MachineState::Done)
            }
            EventTag::Entry => {
                let last_entry_pdi = zone.last_entry_pdi(self.candles.len());
                zone.position.enter(&zone.id, pdi, zone.formation_pdi, last_entry_pdi)?;
                Ok(MachineState::InPosition(Attempt::new(pdi)))
            }
            EventTag::NoEvent | EventTag::Target(_) => Ok(MachineState::SeekingEntry),
        }
    }

    fn hold(
        &self,
        zone: &mut OrderBlock,
        mut attempt: Attempt,
        tag: EventTag,
        pdi: usize,
    ) -> Result<MachineState, SimulationError> {
        let n_targets = zone.position.target_count();

        match tag {
            EventTag::Target(k) if k >= n_targets => {
                attempt.hit_up_to(n_targets, pdi);
                let price = zone.position.target(n_targets).unwrap_or(zone.position.entry_price);
                self.close(zone, &attempt, ExitStatus::FullTarget(n_targets), pdi, price)?;
                zone.remaining_bounces = zone.remaining_bounces.saturating_sub(1);
                Ok(Self::ready(zone))
            }
            EventTag::Stoploss => {
                let status = match attempt.highest_hit {
                    0 => ExitStatus::Stoploss,
                    k => ExitStatus::Target(k),
                };
                let price = zone.position.stoploss;
                self.close(zone, &attempt, status, pdi, price)?;
                zone.remaining_bounces = 0;
                Ok(MachineState::Done)
            }
            EventTag::Target(k) if k > attempt.highest_hit => {
                attempt.hit_up_to(k, pdi);
                // Only a tag naming the trailing target arms it; jumping past does not.
                if self.trailing_target == Some(k) {
                    attempt.trailing_armed = true;
                }
                Ok(MachineState::InPosition(attempt))
            }
            EventTag::Entry if attempt.trailing_armed => {
                let price = zone.position.entry_price;
                self.close(zone, &attempt, ExitStatus::Target(attempt.highest_hit), pdi, price)?;
                zone.remaining_bounces = zone.remaining_bounces.saturating_sub(1);
                Ok(Self::ready(zone))
            }
            EventTag::Entry | EventTag::Target(_) | EventTag::NoEvent => {
                Ok(MachineState::InPosition(attempt))
            }
        }
    }

    fn close(
        &self,
        zone: &mut OrderBlock,
        attempt: &Attempt,
        status: ExitStatus,
        exit_pdi: usize,
        exit_price: f64,
    ) -> Result<(), SimulationError> {
        let record = zone.position.exit(
            self.symbol,
            &zone.id,
            self.candles,
            status,
            exit_pdi,
            &attempt.target_hit_pdis,
            exit_price,
        )?;
        trace!(zone = %zone.id, status = %record.status, profit = record.net_profit, "exit");
        zone.exits.push(record);
        Ok(())
    }
}

/// Run one zone's simulation.
pub fn simulate_zone(
    symbol: &str,
    candles: &[Candle],
    zone: &mut OrderBlock,
    trailing_target: Option<usize>,
) -> Result<(), SimulationError> {
    PositionMachine::new(symbol, candles, trailing_target).run(zone)
}
