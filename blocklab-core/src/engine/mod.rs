//! Trade simulation over detected order blocks.
//!
//! `events` tags every candle after a zone forms, `position_machine` walks
//! those tags, `pipeline` wires detection and simulation together and
//! `accounting` replays the resulting exits into an equity curve.

pub mod accounting;
pub mod events;
pub mod pipeline;
pub mod position_machine;

pub use accounting::{replay_exits, EquityTracker};
pub use events::{classify_candle, classify_events};
pub use pipeline::{Detection, Pipeline, RunOutput};
pub use position_machine::{simulate_zone, Attempt, MachineState, PositionMachine};
