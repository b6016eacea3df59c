//! Backtest runner — runs the pipeline over every loaded symbol and scores
//! the pooled exits.
//!
//! Entry points:
//! - `run_single_backtest()`: loads data from the config, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded data and parameters.
//! - `run_pipeline()`: takes an already validated pipeline. Used by sweeps.
//! - `detect_symbol()`: detection only, for one symbol.

use blocklab_core::domain::{DatasetHash, ExitRecord, ParamsHash, ZoneId};
use blocklab_core::{Detection, ParamsError, Pipeline, StrategyParams};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_candles, LoadError, LoadedData};
use crate::fitness::FitnessSummary;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("invalid strategy parameters: {0}")]
    Params(#[from] ParamsError),
    #[error("symbol '{0}' not found in loaded data")]
    SymbolNotFound(String),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Per-symbol outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub candle_count: usize,
    pub synthetic: bool,
    pub pivot_count: usize,
    pub msb_count: usize,
    pub zone_count: usize,
    pub fitness: FitnessSummary,
    /// Zones whose simulation hit a bounds violation.
    pub aborted: Vec<ZoneId>,
}

/// Complete result of one parameter set over all loaded symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub params: StrategyParams,
    pub params_hash: ParamsHash,
    pub dataset_hash: DatasetHash,
    pub has_synthetic: bool,
    pub symbols: Vec<SymbolReport>,
    /// Exits of every symbol, symbols in load order.
    pub exits: Vec<ExitRecord>,
    /// Fitness of the pooled exits.
    pub fitness: FitnessSummary,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn symbol(&self, name: &str) -> Option<&SymbolReport> {
        self.symbols.iter().find(|s| s.symbol == name)
    }

    pub fn aborted_count(&self) -> usize {
        self.symbols.iter().map(|s| s.aborted.len()).sum()
    }
}

/// Load the configured data and run the configured strategy over it.
pub fn run_single_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let data = load_candles(&config.data.symbols, &config.load_options())?;
    let result = run_backtest_from_data(&config.strategy, &data)?;

    info!(
        symbols = result.symbols.len(),
        exits = result.exits.len(),
        net_profit = result.fitness.net_profit,
        win_rate = result.fitness.win_rate,
        params_hash = result.params_hash.short(),
        "backtest complete"
    );
    Ok(result)
}

/// Run `params` over pre-loaded data.
pub fn run_backtest_from_data(
    params: &StrategyParams,
    data: &LoadedData,
) -> Result<BacktestResult, RunError> {
    let pipeline = Pipeline::new(params.clone())?;
    Ok(run_pipeline(&pipeline, data))
}

/// Run a validated pipeline over every symbol. Symbols run in parallel;
/// output keeps load order.
pub fn run_pipeline(pipeline: &Pipeline, data: &LoadedData) -> BacktestResult {
    let outputs: Vec<_> = data
        .series
        .par_iter()
        .map(|series| (series, pipeline.run(&series.symbol, &series.candles)))
        .collect();

    let mut symbols = Vec::with_capacity(outputs.len());
    let mut exits = Vec::new();
    for (series, output) in outputs {
        if !output.aborted.is_empty() {
            warn!(
                symbol = %series.symbol,
                aborted = output.aborted.len(),
                "zones aborted during simulation"
            );
        }
        symbols.push(SymbolReport {
            symbol: output.symbol.clone(),
            candle_count: series.candles.len(),
            synthetic: series.synthetic,
            pivot_count: output.pivots.len(),
            msb_count: output.msb_points.len(),
            zone_count: output.order_blocks.len(),
            fitness: FitnessSummary::compute(&output.exits),
            aborted: output.aborted,
        });
        exits.extend(output.exits);
    }

    let params = pipeline.params().clone();
    let fitness = FitnessSummary::compute(&exits);
    debug!(
        symbols = symbols.len(),
        exits = exits.len(),
        net_profit = fitness.net_profit,
        "pipeline run finished"
    );

    BacktestResult {
        schema_version: SCHEMA_VERSION,
        params_hash: params.params_hash(),
        params,
        dataset_hash: data.dataset_hash.clone(),
        has_synthetic: data.has_synthetic,
        symbols,
        exits,
        fitness,
    }
}

/// Detection stages only (pivots, structure breaks, limited zones) for one symbol.
pub fn detect_symbol(
    params: &StrategyParams,
    data: &LoadedData,
    symbol: &str,
) -> Result<Detection, RunError> {
    let pipeline = Pipeline::new(params.clone())?;
    let series = data
        .get(symbol)
        .ok_or_else(|| RunError::SymbolNotFound(symbol.to_string()))?;
    Ok(pipeline.detect(&series.candles))
}
