//! Per-side cap on simultaneously open zones.
//!
//! Zones of one side are taken in formation order. While `max_concurrent`
//! zones are open, each new zone closes the oldest open one, which gets
//! `end_pdi = new.formation_pdi − 1`. Long and short zones never evict each
//! other. A zone is retired only by eviction, so the newest `max_concurrent`
//! zones of each side stay open-ended.

use std::collections::VecDeque;

use tracing::debug;

use crate::domain::{OrderBlock, Side};

/// Assign `end_pdi` to evicted zones. Zone order in the slice is untouched.
pub fn limit_concurrent(zones: &mut [OrderBlock], max_concurrent: usize) {
    let mut evicted = 0usize;

    for side in [Side::Long, Side::Short] {
        let mut order: Vec<usize> = (0..zones.len()).filter(|&i| zones[i].side == side).collect();
        // Stable: equal formations keep detection order.
        order.sort_by_key(|&i| zones[i].formation_pdi);

        let mut open: VecDeque<usize> = VecDeque::with_capacity(max_concurrent + 1);
        for idx in order {
            if open.len() >= max_concurrent {
                if let Some(oldest) = open.pop_front() {
                    zones[oldest].end_pdi = Some(zones[idx].formation_pdi.saturating_sub(1));
                    evicted += 1;
                }
            }
            open.push_back(idx);
        }
    }

    debug!(zones = zones.len(), max_concurrent, evicted, "concurrency limit applied");
}

/// Number of zones of `side` accepting entries at `pdi`.
pub fn active_count(zones: &[OrderBlock], side: Side, pdi: usize) -> usize {
    zones
        .iter()
        .filter(|z| z.side == side && z.is_active_at(pdi))
        .count()
}
