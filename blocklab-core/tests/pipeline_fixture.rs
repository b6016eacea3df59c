//! End-to-end pipeline run on a fixed wave series with hand-verified results.

mod common;

use blocklab_core::domain::{ExitStatus, PivotType, Side};
use blocklab_core::{Pipeline, RunOutput, StrategyParams};
use common::{assert_approx, wave_candles};

fn wave_params() -> StrategyParams {
    StrategyParams {
        zigzag_window_size: 3,
        fib_retracement_coeff: 0.0,
        stoploss_coeff: 1.0,
        target_coeff: 1.0,
        n_targets: 2,
        max_bounces: 2,
        max_concurrent: 2,
        trailing_sl_target_id: 1,
        used_capital: 1000.0,
        ..Default::default()
    }
}

fn run_wave(params: StrategyParams) -> RunOutput {
    let pipeline = Pipeline::new(params).unwrap();
    pipeline.run("WAVE", &wave_candles())
}

// ── Detection ────────────────────────────────────────────────────────

#[test]
fn wave_pivots() {
    let output = run_wave(wave_params());
    let expected = [
        (4, 109.69),
        (9, 93.43),
        (14, 112.89),
        (19, 96.55),
        (25, 115.93),
        (30, 99.76),
        (35, 119.2),
        (40, 102.8),
        (46, 122.15),
        (51, 106.1),
        (56, 125.5),
        (61, 109.07),
        (66, 125.21),
        (72, 105.84),
        (77, 122.19),
        (82, 102.74),
        (87, 118.98),
        (93, 99.6),
        (98, 115.87),
        (103, 96.41),
        (108, 112.74),
        (114, 93.36),
    ];

    assert_eq!(output.pivots.len(), expected.len());
    for (i, (pivot, &(pdi, value))) in output.pivots.iter().zip(&expected).enumerate() {
        assert_eq!(pivot.pdi, pdi);
        assert_approx(pivot.value, value, 1e-9);
        let want = if i % 2 == 0 { PivotType::Peak } else { PivotType::Valley };
        assert_eq!(pivot.pivot_type, want, "pivot {i}");
    }

    // On this series every pivot is confirmed by the very next candle.
    let candles = wave_candles();
    for pivot in &output.pivots {
        assert_eq!(pivot.formation_time, candles[pivot.pdi + 1].time);
    }
}

#[test]
fn wave_structure_breaks() {
    let output = run_wave(wave_params());
    let summary: Vec<(usize, Side, usize)> = output
        .msb_points
        .iter()
        .map(|m| (m.pdi, m.side, m.formation_pdi))
        .collect();

    assert_eq!(
        summary,
        vec![
            (4, Side::Long, 12),
            (14, Side::Long, 23),
            (25, Side::Long, 33),
            (35, Side::Long, 44),
            (46, Side::Long, 54),
            (61, Side::Short, 70),
            (72, Side::Short, 80),
            (82, Side::Short, 91),
            (93, Side::Short, 101),
            (103, Side::Short, 112),
        ]
    );
}

#[test]
fn wave_zones_and_limits() {
    let output = run_wave(wave_params());
    let zones: Vec<(usize, Side, usize, Option<usize>)> = output
        .order_blocks
        .iter()
        .map(|z| (z.base_candle_pdi, z.side, z.formation_pdi, z.end_pdi))
        .collect();

    assert_eq!(
        zones,
        vec![
            (8, Side::Long, 12, Some(32)),
            (18, Side::Long, 23, Some(43)),
            (29, Side::Long, 33, Some(53)),
            (39, Side::Long, 44, None),
            (50, Side::Long, 54, None),
            (65, Side::Short, 70, Some(90)),
            (76, Side::Short, 80, Some(100)),
            (86, Side::Short, 91, Some(111)),
            (97, Side::Short, 101, None),
            (107, Side::Short, 112, None),
        ]
    );

    let zone = &output.order_blocks[1];
    assert_approx(zone.top, 100.5, 1e-9);
    assert_approx(zone.bottom, 96.55, 1e-9);
    assert_eq!(zone.id.as_str(), "OB18/2024.1.1/04:30:00L");
    assert_eq!(output.order_blocks[5].id.as_str(), "OB65/2024.1.1/16:15:00S");
}

// ── Simulation ───────────────────────────────────────────────────────

#[test]
fn wave_exits() {
    let output = run_wave(wave_params());

    let exits: Vec<(&str, ExitStatus, usize, usize)> = output
        .exits
        .iter()
        .map(|e| (e.zone_id.as_str(), e.status, e.entry_pdi, e.exit_pdi))
        .collect();
    assert_eq!(
        exits,
        vec![
            ("OB39/2024.1.1/09:45:00L", ExitStatus::FullTarget(2), 49, 52),
            ("OB39/2024.1.1/09:45:00L", ExitStatus::FullTarget(2), 71, 74),
            ("OB50/2024.1.1/12:30:00L", ExitStatus::Stoploss, 70, 71),
            ("OB65/2024.1.1/16:15:00S", ExitStatus::FullTarget(2), 75, 79),
            ("OB86/2024.1.1/21:30:00S", ExitStatus::FullTarget(2), 96, 100),
        ]
    );

    let profits = [
        53.60660350811372,
        53.60660350811372,
        -21.939528023598996,
        52.70337301587301,
        53.80463172557904,
    ];
    for (exit, expected) in output.exits.iter().zip(profits) {
        assert_approx(exit.net_profit, expected, 1e-9);
    }
    assert_approx(output.exits[2].exit_price, 106.1, 1e-9);
    assert_approx(output.exits[4].exit_price, 106.62, 1e-9);

    assert_approx(output.net_profit(), 191.7816837340805, 1e-9);
    assert_eq!(output.exits.iter().filter(|e| e.is_winner()).count(), 4);
}

#[test]
fn late_entries_abort_their_zones() {
    let output = run_wave(wave_params());
    let aborted: Vec<&str> = output.aborted.iter().map(|id| id.as_str()).collect();
    assert_eq!(
        aborted,
        vec![
            "OB8/2024.1.1/02:00:00L",
            "OB18/2024.1.1/04:30:00L",
            "OB29/2024.1.1/07:15:00L",
        ]
    );

    // OB18 closed a full target at 32 before re-entering past its end; the
    // abort drops that exit too.
    for zone in &output.order_blocks[..3] {
        assert!(zone.exits.is_empty());
        assert!(!output.exits.iter().any(|e| e.zone_id == zone.id));
    }
}

#[test]
fn wave_remaining_bounces() {
    let output = run_wave(wave_params());
    let bounces: Vec<u32> = output.order_blocks.iter().map(|z| z.remaining_bounces).collect();
    assert_eq!(bounces, vec![2, 1, 2, 0, 0, 1, 2, 1, 2, 2]);
}

#[test]
fn single_slot_concurrency_changes_results() {
    let params = StrategyParams {
        max_concurrent: 1,
        ..wave_params()
    };
    let output = run_wave(params);

    let ends: Vec<Option<usize>> = output.order_blocks.iter().map(|z| z.end_pdi).collect();
    assert_eq!(
        ends,
        vec![
            Some(22),
            Some(32),
            Some(43),
            Some(53),
            None,
            Some(79),
            Some(90),
            Some(100),
            Some(111),
            None,
        ]
    );
    assert_eq!(output.aborted.len(), 4);
    assert_eq!(output.exits.len(), 3);
    assert_approx(output.net_profit(), 84.56847671785306, 1e-9);
}

#[test]
fn window_size_never_adds_pivots() {
    let candles = wave_candles();
    let counts: Vec<usize> = (2..=15)
        .map(|w| blocklab_core::analysis::find_pivots(&candles, w).len())
        .collect();

    assert_eq!(counts, vec![23, 22, 22, 21, 21, 21, 21, 21, 10, 1, 1, 1, 1, 1]);
    assert!(counts.windows(2).all(|pair| pair[1] <= pair[0]));
}

#[test]
fn runs_are_deterministic() {
    let a = run_wave(wave_params());
    let b = run_wave(wave_params());
    assert_eq!(a.exits, b.exits);
    assert_eq!(a.order_blocks, b.order_blocks);
}
