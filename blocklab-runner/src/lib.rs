//! BlockLab Runner — data loading, multi-symbol runs, parameter sweeps,
//! fitness scoring, export.
//!
//! This crate builds on `blocklab-core` to provide:
//! - CSV candle ingestion with symbol discovery and synthetic fallback
//! - TOML configuration
//! - Single runs over many symbols with pooled fitness
//! - Rayon-parallel parameter sweeps ranked by a fitness metric
//! - JSON/CSV/Markdown artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod fitness;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, DataConfig, SweepConfig};
pub use data_loader::{load_candles, LoadError, LoadOptions, LoadedData, SymbolSeries};
pub use fitness::{FitnessMetric, FitnessSummary};
pub use runner::{
    detect_symbol, run_backtest_from_data, run_pipeline, run_single_backtest, BacktestResult,
    RunError, SymbolReport,
};
pub use sweep::{ParamGrid, ParamSweep, SweepResults, SweepRow};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn fitness_types_are_send_sync() {
        assert_send::<FitnessSummary>();
        assert_sync::<FitnessSummary>();
        assert_send::<FitnessMetric>();
        assert_sync::<FitnessMetric>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn loaded_data_is_send_sync() {
        assert_send::<LoadedData>();
        assert_sync::<LoadedData>();
    }

    #[test]
    fn sweep_types_are_send_sync() {
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
        assert_send::<SweepRow>();
        assert_sync::<SweepRow>();
        assert_send::<SweepResults>();
        assert_sync::<SweepResults>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
