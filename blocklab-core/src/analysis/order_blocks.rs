//! Order-block location: the last opposing candle before the break.

use tracing::{debug, trace};

use super::zigzag::pivot_position;
use crate::domain::{Candle, MsbPoint, OrderBlock, Pivot};
use crate::params::StrategyParams;

/// Base candle for `msb`: the last candle in `[msb.pdi, next_pivot.pdi]`
/// whose color opposes the break direction.
pub fn base_candle_pdi(candles: &[Candle], pivots: &[Pivot], msb: &MsbPoint) -> Option<usize> {
    let pos = pivot_position(pivots, msb.pdi)?;
    let next = pivots.get(pos + 1)?;
    let last = next.pdi.min(candles.len().checked_sub(1)?);
    let want = msb.side.base_candle_color();

    (msb.pdi..=last).rev().find(|&i| candles[i].color() == want)
}

/// One zone per structure break that has a base candle and passes the size
/// and trading-mode filters, in break order.
pub fn find_order_blocks(
    candles: &[Candle],
    pivots: &[Pivot],
    msb_points: &[MsbPoint],
    params: &StrategyParams,
) -> Vec<OrderBlock> {
    let mut zones = Vec::with_capacity(msb_points.len());

    for msb in msb_points {
        let Some(base_pdi) = base_candle_pdi(candles, pivots, msb) else {
            trace!(msb_pdi = msb.pdi, "no base candle");
            continue;
        };

        if !params.trading_mode.allows(msb.side) {
            continue;
        }

        let zone = OrderBlock::new(base_pdi, &candles[base_pdi], msb.side, msb.formation_pdi, params);
        if !params.size_bounds.contains(zone.height_percentage) {
            trace!(zone = %zone.id, pct = zone.height_percentage, "zone outside size bounds");
            continue;
        }

        zones.push(zone);
    }

    debug!(msb_points = msb_points.len(), zones = zones.len(), "order blocks located");
    zones
}
