//! BlockLab Core — order-block detection and trade simulation.
//!
//! This crate contains the analytical pipeline:
//! - Domain types (candles, pivots, structure breaks, zones, positions, exits)
//! - Zigzag pivot detection with color tie-breaks
//! - Structure-break (MSB) detection and order-block location
//! - Per-side concurrency limiting
//! - Event classification and the per-zone position state machine
//!
//! Everything here is a pure function of a candle slice and a validated
//! [`StrategyParams`]; loading, sweeps and export live in `blocklab-runner`.

pub mod analysis;
pub mod domain;
pub mod engine;
pub mod params;
pub mod synthetic;

pub use engine::{Detection, Pipeline, RunOutput};
pub use params::{ParamsError, SizeBounds, StrategyParams, TradingMode};
