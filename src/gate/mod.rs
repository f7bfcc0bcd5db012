// Regression gating decision engine
//
// Decides whether a candidate release may ship (OK), ships with caution
// (WARN) or must not ship (BLOCK) by comparing its safety metrics against a
// baseline release.
//
// Signals combined, strongest wins:
// - Threshold grading of pairwise metric deltas
// - Statistical significance on per-sample observations (bootstrap CI,
//   permutation test, Cohen's d, power)
// - Business-risk overlay that tightens thresholds for high-risk categories
//   and forces human review where evidence is thin
// - Multi-release erosion trends from recorded history
//
// Implementation:
// - Uses rayon for parallel resampling and per-metric analysis
// - Uses statrs for normal-distribution quantiles in power analysis
// - Uses rand_xoshiro counter-seeded generators for reproducible resampling
// - Uses trueno and aprender for descriptive sample summaries
//
// The engine is synchronous and performs no file I/O.

mod aggregator;
mod business_risk;
mod config;
mod diff;
mod direction;
mod error;
mod grader;
mod pipeline;
mod statistics;
mod summary;
mod trend;
mod verdict;

pub use aggregator::{ExcludedMetric, GateAggregator, GateDecision, SkippedMetric};
pub use business_risk::{
    aggregate_risk_results, assess_business_risk, BusinessRiskResult, CategoryTable,
    RiskAggregate, RiskCategory,
};
pub use config::{default_thresholds, GateConfig, Thresholds, TrendConfig};
pub use diff::{
    compute_diffs, compute_suite_diffs, improvements, regressions, summarize, DiffSummary,
    MetricDiff,
};
pub use direction::{DirectionTable, MetricDirection};
pub use error::{GateError, SampleGroup};
pub use grader::{Regression, RiskGrader, RiskReport};
pub use pipeline::{evaluate, MetricAnalysis};
pub use statistics::{
    cohens_d, counter_rng_seed, gate_with_significance, percentile, power_analysis,
    samples_for_power, SampleRequirement, StatisticalAnalyzer, StatisticalResult, TARGET_POWER,
};
pub use summary::{describe, SampleSummary};
pub use trend::{TrendAnalysis, TrendAnalyzer, TrendTier};
pub use verdict::{Severity, Verdict};

#[cfg(test)]
mod tests;
