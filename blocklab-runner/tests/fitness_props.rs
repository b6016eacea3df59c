//! Property tests: fitness accounting identities over random synthetic runs.

use blocklab_core::synthetic::{generate_seeded, SyntheticSpec};
use blocklab_core::StrategyParams;
use blocklab_runner::data_loader::{LoadedData, SymbolSeries};
use blocklab_runner::fitness::FitnessSummary;
use blocklab_runner::runner::run_backtest_from_data;
use proptest::prelude::*;

fn seeded_data(seeds: &[u64], count: usize) -> LoadedData {
    let spec = SyntheticSpec {
        count,
        ..SyntheticSpec::default()
    };
    LoadedData::from_series(
        seeds
            .iter()
            .map(|&seed| SymbolSeries {
                symbol: format!("S{seed}"),
                candles: generate_seeded(seed, &spec),
                synthetic: true,
            })
            .collect(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn pooled_fitness_is_consistent(
        seed_a in 0u64..10_000,
        seed_b in 10_000u64..20_000,
        window in 3usize..16,
        max_bounces in 1u32..4,
        max_concurrent in 1usize..5,
    ) {
        let params = StrategyParams {
            zigzag_window_size: window,
            max_bounces,
            max_concurrent,
            ..StrategyParams::default()
        };
        let data = seeded_data(&[seed_a, seed_b], 400);
        let result = run_backtest_from_data(&params, &data).unwrap();
        let f = &result.fitness;

        prop_assert_eq!(f.trade_count, result.exits.len());
        prop_assert!((f.net_profit - (f.gross_profit - f.gross_loss)).abs() < 1e-6);
        prop_assert!((0.0..=100.0).contains(&f.win_rate));
        prop_assert!(f.max_drawdown >= 0.0);
        prop_assert!(f.max_drawdown <= f.gross_loss + 1e-6);
        prop_assert!(f.full_target_count + f.stoploss_count <= f.trade_count);

        let per_symbol: usize = result.symbols.iter().map(|s| s.fitness.trade_count).sum();
        prop_assert_eq!(per_symbol, f.trade_count);
        prop_assert_eq!(&FitnessSummary::compute(&result.exits), f);
    }
}
