//! Property-based tests for the gating engine
//!
//! Small case counts and iteration budgets keep the suite fast enough for a
//! pre-commit hook.
//!
//! Properties covered:
//! 1. Regression classification follows metric direction
//! 2. Bootstrap interval always contains the observed delta
//! 3. Fixed seed gives bit-identical results
//! 4. Permutation p-value is symmetric under label swap and in (0, 1]
//! 5. CI-aware gating never blocks a non-significant result
//! 6. Verdict aggregation is monotonic
//! 7. Linear series fit exactly

use proptest::prelude::*;
use safety_gate::gate::{
    gate_with_significance, samples_for_power, GateAggregator, MetricDiff, MetricDirection,
    SampleRequirement, StatisticalAnalyzer, StatisticalResult, TrendAnalyzer, Verdict,
};

fn direction_strategy() -> impl Strategy<Value = MetricDirection> {
    prop_oneof![
        Just(MetricDirection::HigherIsWorse),
        Just(MetricDirection::LowerIsWorse),
    ]
}

fn verdict_strategy() -> impl Strategy<Value = Verdict> {
    prop_oneof![Just(Verdict::Ok), Just(Verdict::Warn), Just(Verdict::Block)]
}

fn samples_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..1.0, 4..16)
}

fn has_spread(values: &[f64]) -> bool {
    values.iter().any(|v| (v - values[0]).abs() > 1e-9)
}

fn analyzer(seed: u64) -> StatisticalAnalyzer {
    StatisticalAnalyzer::new(seed).with_iterations(200, 200)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_regression_follows_direction(
        baseline in -10.0f64..10.0,
        candidate in -10.0f64..10.0,
        direction in direction_strategy(),
    ) {
        let diff = MetricDiff::new("suite", "metric", Some(baseline), Some(candidate), Some(direction));
        let delta = candidate - baseline;

        let expected = match direction {
            MetricDirection::HigherIsWorse => delta > 0.0,
            MetricDirection::LowerIsWorse => delta < 0.0,
        };
        prop_assert_eq!(diff.is_regression(), expected);

        // Never both, and neither when unchanged
        prop_assert!(!(diff.is_regression() && diff.is_improvement()));
        if delta == 0.0 {
            prop_assert!(!diff.is_regression() && !diff.is_improvement());
        }
    }

    #[test]
    fn prop_missing_direction_never_regresses(
        baseline in -10.0f64..10.0,
        candidate in -10.0f64..10.0,
    ) {
        let diff = MetricDiff::new("suite", "metric", Some(baseline), Some(candidate), None);
        prop_assert!(!diff.is_regression());
        prop_assert!(!diff.is_improvement());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_interval_contains_delta(
        baseline in samples_strategy(),
        candidate in samples_strategy(),
        seed in any::<u64>(),
    ) {
        prop_assume!(has_spread(&baseline) || has_spread(&candidate));

        let (delta, lower, upper) = analyzer(seed).bootstrap_ci(&baseline, &candidate).unwrap();
        prop_assert!(lower <= delta, "{} > {}", lower, delta);
        prop_assert!(delta <= upper, "{} > {}", delta, upper);
    }

    #[test]
    fn prop_fixed_seed_is_reproducible(
        baseline in samples_strategy(),
        candidate in samples_strategy(),
        seed in any::<u64>(),
    ) {
        prop_assume!(has_spread(&baseline) || has_spread(&candidate));

        let first = analyzer(seed).analyze(&baseline, &candidate, 0.05).unwrap();
        let second = analyzer(seed).analyze(&baseline, &candidate, 0.05).unwrap();

        prop_assert_eq!(first.ci_lower.to_bits(), second.ci_lower.to_bits());
        prop_assert_eq!(first.ci_upper.to_bits(), second.ci_upper.to_bits());
        prop_assert_eq!(first.p_value.to_bits(), second.p_value.to_bits());
    }

    #[test]
    fn prop_p_value_symmetric_and_bounded(
        baseline in samples_strategy(),
        candidate in samples_strategy(),
        seed in any::<u64>(),
    ) {
        prop_assume!(has_spread(&baseline) || has_spread(&candidate));

        let analyzer = analyzer(seed);
        let forward = analyzer.permutation_test(&baseline, &candidate).unwrap();
        let reverse = analyzer.permutation_test(&candidate, &baseline).unwrap();

        prop_assert!(forward > 0.0 && forward <= 1.0);
        prop_assert_eq!(forward, reverse);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_not_significant_never_blocks(
        delta in -1.0f64..1.0,
        half_width in 0.0f64..0.5,
        p_value in 0.05f64..1.0,
        threshold in 0.0f64..0.2,
        direction in direction_strategy(),
    ) {
        let result = StatisticalResult {
            delta,
            ci_lower: delta - half_width,
            ci_upper: delta + half_width,
            p_value,
            is_significant: false,
            effect_size: 0.0,
            power: 0.0,
            samples_needed_for_power_80: SampleRequirement::Unbounded,
        };
        prop_assert_ne!(gate_with_significance(&result, threshold, direction), Verdict::Block);
    }

    #[test]
    fn prop_aggregation_is_monotonic(
        verdicts in prop::collection::vec(verdict_strategy(), 0..12),
        extra in verdict_strategy(),
    ) {
        let mut aggregator = GateAggregator::new();
        for verdict in &verdicts {
            aggregator.contribute(*verdict, None, false);
        }
        let before = aggregator.verdict();
        prop_assert_eq!(before, Verdict::aggregate(verdicts.iter().copied()));

        aggregator.contribute(extra, None, false);
        prop_assert!(aggregator.verdict() >= before);
        prop_assert!(aggregator.verdict() >= extra);
    }

    #[test]
    fn prop_required_samples_shrink_with_effect(
        effect in 0.05f64..3.0,
        factor in 1.1f64..4.0,
    ) {
        let small = samples_for_power(effect, 0.8, 0.05).unwrap().as_finite().unwrap();
        let large = samples_for_power(effect * factor, 0.8, 0.05).unwrap().as_finite().unwrap();
        prop_assert!(large <= small);
    }

    #[test]
    fn prop_linear_series_fits_exactly(
        intercept in -5.0f64..5.0,
        slope in 0.01f64..1.0,
        len in 3usize..12,
    ) {
        let values: Vec<f64> = (0..len).map(|i| intercept + slope * i as f64).collect();
        let (fitted, r_squared) = TrendAnalyzer::linear_regression(&values);

        prop_assert!((fitted - slope).abs() < 1e-9);
        prop_assert!((r_squared - 1.0).abs() < 1e-9);
    }
}
