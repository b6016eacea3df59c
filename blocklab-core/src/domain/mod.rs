//! Domain types for BlockLab

pub mod candle;
pub mod event;
pub mod exit;
pub mod ids;
pub mod msb;
pub mod order_block;
pub mod pivot;
pub mod position;

pub use candle::{validate_series, Candle, CandleColor, CandleError};
pub use event::EventTag;
pub use exit::{ExitRecord, ExitStatus};
pub use ids::{DatasetHash, ParamsHash, ZoneId};
pub use msb::{MsbPoint, Side};
pub use order_block::OrderBlock;
pub use pivot::{Pivot, PivotType};
pub use position::{Position, PositionStatus, SimulationError};
