//! Per-candle event tags for one order block.

use crate::domain::{Candle, EventTag, OrderBlock, Position, Side};

/// Tag for a single candle against a position's levels.
///
/// Precedence: stoploss over entry over the highest target touched.
pub fn classify_candle(candle: &Candle, position: &Position) -> EventTag {
    let (stopped, entered) = match position.side {
        Side::Long => (candle.low <= position.stoploss, candle.low <= position.entry_price),
        Side::Short => (candle.high >= position.stoploss, candle.high >= position.entry_price),
    };
    let touches = |target: f64| match position.side {
        Side::Long => candle.high >= target,
        Side::Short => candle.low <= target,
    };

    if stopped {
        return EventTag::Stoploss;
    }
    if entered {
        return EventTag::Entry;
    }

    position
        .target_list
        .iter()
        .rposition(|&target| touches(target))
        .map_or(EventTag::NoEvent, |i| EventTag::Target(i + 1))
}

/// Tags for every candle from the zone's formation to the end of the series.
///
/// The array is not clipped at `end_pdi`: a position entered before the zone
/// expires keeps running until it exits.
pub fn classify_events(candles: &[Candle], zone: &OrderBlock) -> Vec<EventTag> {
    candles
        .get(zone.formation_pdi..)
        .unwrap_or_default()
        .iter()
        .map(|candle| classify_candle(candle, &zone.position))
        .collect()
}
