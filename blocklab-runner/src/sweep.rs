//! Parameter sweep — cartesian grid over the strategy coefficients, run in
//! parallel with rayon, ranked by a fitness metric.

use std::collections::HashMap;

use blocklab_core::domain::ParamsHash;
use blocklab_core::{Pipeline, StrategyParams};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ConfigError;
use crate::data_loader::LoadedData;
use crate::fitness::{FitnessMetric, FitnessSummary};
use crate::runner::{run_pipeline, RunError};

/// Value lists swept per parameter. Every other field comes from the base
/// parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub zigzag_window_size: Vec<usize>,
    pub stoploss_coeff: Vec<f64>,
    pub target_coeff: Vec<f64>,
    pub max_bounces: Vec<u32>,
    pub max_concurrent: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            zigzag_window_size: (9..=15).collect(),
            stoploss_coeff: stepped(1.0, 2.0, 0.2),
            target_coeff: stepped(0.6, 2.0, 0.2),
            max_bounces: (1..=3).collect(),
            max_concurrent: (1..=5).collect(),
        }
    }
}

/// Inclusive float range, rounded so `0.6 + 7 * 0.2` is exactly `2.0`.
pub fn stepped(start: f64, end: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || end < start {
        return vec![start];
    }
    let count = ((end - start) / step + 1e-9).floor() as usize;
    (0..=count)
        .map(|i| ((start + i as f64 * step) * 1e9).round() / 1e9)
        .collect()
}

impl ParamGrid {
    /// A grid holding exactly the values of `params`.
    pub fn single(params: &StrategyParams) -> Self {
        Self {
            zigzag_window_size: vec![params.zigzag_window_size],
            stoploss_coeff: vec![params.stoploss_coeff],
            target_coeff: vec![params.target_coeff],
            max_bounces: vec![params.max_bounces],
            max_concurrent: vec![params.max_concurrent],
        }
    }

    /// Number of combinations.
    pub fn size(&self) -> usize {
        self.zigzag_window_size.len()
            * self.stoploss_coeff.len()
            * self.target_coeff.len()
            * self.max_bounces.len()
            * self.max_concurrent.len()
    }

    pub(crate) fn check_non_empty(&self) -> Result<(), ConfigError> {
        let axes = [
            ("zigzag_window_size", self.zigzag_window_size.is_empty()),
            ("stoploss_coeff", self.stoploss_coeff.is_empty()),
            ("target_coeff", self.target_coeff.is_empty()),
            ("max_bounces", self.max_bounces.is_empty()),
            ("max_concurrent", self.max_concurrent.is_empty()),
        ];
        match axes.iter().find(|(_, empty)| *empty) {
            Some((name, _)) => Err(ConfigError::EmptyGrid(*name)),
            None => Ok(()),
        }
    }

    /// Every combination applied to `base`, window-major order.
    pub fn generate_params(&self, base: &StrategyParams) -> Vec<StrategyParams> {
        let mut out = Vec::with_capacity(self.size());
        for &window in &self.zigzag_window_size {
            for &stoploss in &self.stoploss_coeff {
                for &target in &self.target_coeff {
                    for &bounces in &self.max_bounces {
                        for &concurrent in &self.max_concurrent {
                            out.push(StrategyParams {
                                zigzag_window_size: window,
                                stoploss_coeff: stoploss,
                                target_coeff: target,
                                max_bounces: bounces,
                                max_concurrent: concurrent,
                                ..base.clone()
                            });
                        }
                    }
                }
            }
        }
        out
    }
}

/// One evaluated parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub params_hash: ParamsHash,
    pub params: StrategyParams,
    pub fitness: FitnessSummary,
    /// Zones aborted by a simulation error, over all symbols.
    pub aborted_zones: usize,
}

/// Runs every grid combination over the same loaded data.
pub struct ParamSweep<'a> {
    data: &'a LoadedData,
    metric: FitnessMetric,
    parallel: bool,
}

impl<'a> ParamSweep<'a> {
    pub fn new(data: &'a LoadedData) -> Self {
        Self {
            data,
            metric: FitnessMetric::default(),
            parallel: true,
        }
    }

    pub fn with_metric(mut self, metric: FitnessMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Evaluate the whole grid. Any invalid combination fails the sweep.
    pub fn sweep(&self, grid: &ParamGrid, base: &StrategyParams) -> Result<SweepResults, RunError> {
        self.sweep_with_progress(grid, base, |_, _, _| {})
    }

    /// Evaluate the whole grid, calling `progress(index, total, row)` after
    /// each combination. Under parallel execution the calls arrive out of
    /// index order.
    pub fn sweep_with_progress<F>(
        &self,
        grid: &ParamGrid,
        base: &StrategyParams,
        progress: F,
    ) -> Result<SweepResults, RunError>
    where
        F: Fn(usize, usize, &SweepRow) + Send + Sync,
    {
        let combos = grid.generate_params(base);
        let total = combos.len();

        let evaluate = |(idx, params): (usize, &StrategyParams)| -> Result<SweepRow, RunError> {
            let row = self.evaluate(params)?;
            progress(idx, total, &row);
            Ok(row)
        };

        let rows = if self.parallel {
            combos
                .par_iter()
                .enumerate()
                .map(evaluate)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            combos
                .iter()
                .enumerate()
                .map(evaluate)
                .collect::<Result<Vec<_>, _>>()?
        };

        let results = SweepResults::new(rows, self.metric);
        if let Some(best) = results.best() {
            info!(
                combinations = total,
                metric = self.metric.name(),
                best = self.metric.extract(&best.fitness),
                best_hash = best.params_hash.short(),
                "sweep complete"
            );
        }
        Ok(results)
    }

    fn evaluate(&self, params: &StrategyParams) -> Result<SweepRow, RunError> {
        let pipeline = Pipeline::new(params.clone())?;
        let result = run_pipeline(&pipeline, self.data);
        Ok(SweepRow {
            params_hash: result.params_hash,
            params: result.params,
            aborted_zones: result.symbols.iter().map(|s| s.aborted.len()).sum(),
            fitness: result.fitness,
        })
    }
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug, Clone)]
pub struct SweepResults {
    rows: Vec<SweepRow>,
    by_hash: HashMap<ParamsHash, usize>,
    metric: FitnessMetric,
}

impl SweepResults {
    pub fn new(rows: Vec<SweepRow>, metric: FitnessMetric) -> Self {
        let by_hash = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.params_hash.clone(), i))
            .collect();
        Self {
            rows,
            by_hash,
            metric,
        }
    }

    pub fn all(&self) -> &[SweepRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn metric(&self) -> FitnessMetric {
        self.metric
    }

    pub fn get(&self, hash: &ParamsHash) -> Option<&SweepRow> {
        self.by_hash.get(hash).map(|&i| &self.rows[i])
    }

    /// Rows best-first under the sweep's metric. Ties keep grid order.
    pub fn sorted_by_fitness(&self) -> Vec<&SweepRow> {
        let metric = self.metric;
        let mut sorted: Vec<_> = self.rows.iter().collect();
        sorted.sort_by(|a, b| {
            let (va, vb) = (metric.extract(&a.fitness), metric.extract(&b.fitness));
            let ord = va.partial_cmp(&vb).unwrap_or(std::cmp::Ordering::Equal);
            if metric.is_higher_better() {
                ord.reverse()
            } else {
                ord
            }
        });
        sorted
    }

    pub fn top_n(&self, n: usize) -> Vec<&SweepRow> {
        self.sorted_by_fitness().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&SweepRow> {
        self.sorted_by_fitness().into_iter().next()
    }
}
