//! The detection and simulation pipeline over one candle series.
//!
//! Stages, in order:
//! 1. Zigzag pivots
//! 2. Structure breaks
//! 3. Order-block location
//! 4. Per-side concurrency limit
//! 5. Event classification
//! 6. Position simulation (zones in parallel)

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::position_machine::simulate_zone;
use crate::analysis::{find_msb_points, find_order_blocks, find_pivots, limit_concurrent};
use crate::domain::{Candle, ExitRecord, MsbPoint, OrderBlock, Pivot, SimulationError, ZoneId};
use crate::params::{ParamsError, StrategyParams};

/// Everything one run produces, in detection order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOutput {
    pub symbol: String,
    pub pivots: Vec<Pivot>,
    pub msb_points: Vec<MsbPoint>,
    pub order_blocks: Vec<OrderBlock>,
    /// Exits of every zone, zones in detection order.
    pub exits: Vec<ExitRecord>,
    /// Zones whose simulation was aborted. They carry no exits.
    pub aborted: Vec<ZoneId>,
}

impl RunOutput {
    pub fn net_profit(&self) -> f64 {
        self.exits.iter().map(|e| e.net_profit).sum()
    }
}

/// Detection output without simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detection {
    pub pivots: Vec<Pivot>,
    pub msb_points: Vec<MsbPoint>,
    pub order_blocks: Vec<OrderBlock>,
}

/// A validated parameter set bound to the pipeline stages.
#[derive(Debug, Clone)]
pub struct Pipeline {
    params: StrategyParams,
}

impl Pipeline {
    /// Validate `params`; an invalid configuration never yields a pipeline.
    pub fn new(params: StrategyParams) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Stages 1 to 4.
    pub fn detect(&self, candles: &[Candle]) -> Detection {
        let pivots = find_pivots(candles, self.params.zigzag_window_size);
        let msb_points = find_msb_points(candles, &pivots, self.params.fib_retracement_coeff);
        let mut order_blocks = find_order_blocks(candles, &pivots, &msb_points, &self.params);
        limit_concurrent(&mut order_blocks, self.params.max_concurrent);

        Detection {
            pivots,
            msb_points,
            order_blocks,
        }
    }

    /// All stages over one symbol's candles.
    pub fn run(&self, symbol: &str, candles: &[Candle]) -> RunOutput {
        let Detection {
            pivots,
            msb_points,
            mut order_blocks,
        } = self.detect(candles);

        let trailing_target = self.params.trailing_target();
        let results: Vec<Result<(), SimulationError>> = order_blocks
            .par_iter_mut()
            .map(|zone| simulate_zone(symbol, candles, zone, trailing_target))
            .collect();

        let mut aborted = Vec::new();
        for (zone, result) in order_blocks.iter_mut().zip(results) {
            if let Err(err) = result {
                warn!(symbol, zone = %zone.id, error = %err, "zone simulation aborted");
                zone.exits.clear();
                aborted.push(zone.id.clone());
            }
        }

        let exits: Vec<ExitRecord> = order_blocks
            .iter()
            .flat_map(|zone| zone.exits.iter().cloned())
            .collect();

        debug!(
            symbol,
            candles = candles.len(),
            pivots = pivots.len(),
            msb_points = msb_points.len(),
            zones = order_blocks.len(),
            exits = exits.len(),
            aborted = aborted.len(),
            "pipeline run complete"
        );

        RunOutput {
            symbol: symbol.to_string(),
            pivots,
            msb_points,
            order_blocks,
            exits,
            aborted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_params() {
        let params = StrategyParams {
            n_targets: 0,
            ..Default::default()
        };
        assert_eq!(Pipeline::new(params).unwrap_err(), ParamsError::NoTargets);
    }

    #[test]
    fn empty_series_runs_clean() {
        let pipeline = Pipeline::new(StrategyParams::default()).unwrap();
        let output = pipeline.run("EMPTY", &[]);
        assert!(output.pivots.is_empty());
        assert!(output.order_blocks.is_empty());
        assert!(output.exits.is_empty());
        assert_eq!(output.net_profit(), 0.0);
    }
}
