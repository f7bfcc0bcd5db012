// Metric diff computation between baseline and candidate runs
//
// Pure function of its inputs: one MetricDiff per metric present in either
// map (union of keys), each carrying the direction resolved from the table.

use crate::gate::direction::{DirectionTable, MetricDirection};
use crate::runner::RunResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Difference between baseline and candidate for a single metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDiff {
    pub suite: String,
    pub metric: String,
    pub baseline_value: Option<f64>,
    pub candidate_value: Option<f64>,
    /// `candidate - baseline`; absent when either value is absent
    pub delta: Option<f64>,
    /// Percent change relative to baseline; also absent when baseline is 0
    pub delta_pct: Option<f64>,
    /// `None` for metrics missing from the direction table (neutral)
    pub direction: Option<MetricDirection>,
}

impl MetricDiff {
    /// Build a diff from raw values
    pub fn new(
        suite: &str,
        metric: &str,
        baseline_value: Option<f64>,
        candidate_value: Option<f64>,
        direction: Option<MetricDirection>,
    ) -> Self {
        let (delta, delta_pct) = match (baseline_value, candidate_value) {
            (Some(baseline), Some(candidate)) => {
                let delta = candidate - baseline;
                let delta_pct = if baseline != 0.0 {
                    Some(delta / baseline * 100.0)
                } else {
                    None
                };
                (Some(delta), delta_pct)
            }
            _ => (None, None),
        };

        Self {
            suite: suite.to_string(),
            metric: metric.to_string(),
            baseline_value,
            candidate_value,
            delta,
            delta_pct,
            direction,
        }
    }

    /// Delta expressed as badness (positive = worse)
    pub fn badness(&self) -> Option<f64> {
        match (self.delta, self.direction) {
            (Some(delta), Some(direction)) => Some(direction.badness(delta)),
            _ => None,
        }
    }

    /// `delta > 0` under higher-is-worse, `delta < 0` under lower-is-worse
    pub fn is_regression(&self) -> bool {
        self.badness().is_some_and(|b| b > 0.0)
    }

    /// A non-zero delta that is not a regression
    pub fn is_improvement(&self) -> bool {
        self.badness().is_some_and(|b| b < 0.0)
    }
}

/// Regression / improvement counts for a set of diffs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub total_metrics: usize,
    pub regressions: usize,
    pub improvements: usize,
    pub neutral: usize,
    pub regressed_metrics: Vec<String>,
    pub improved_metrics: Vec<String>,
}

/// Diff one suite's metric maps
pub fn compute_suite_diffs(
    suite: &str,
    baseline: &BTreeMap<String, f64>,
    candidate: &BTreeMap<String, f64>,
    directions: &DirectionTable,
) -> Vec<MetricDiff> {
    let metrics: BTreeSet<&String> = baseline.keys().chain(candidate.keys()).collect();

    metrics
        .into_iter()
        .map(|metric| {
            MetricDiff::new(
                suite,
                metric,
                baseline.get(metric).copied(),
                candidate.get(metric).copied(),
                directions.get(metric),
            )
        })
        .collect()
}

/// Diff every suite of a run
///
/// Suites present on only one side still produce diffs (with absent deltas)
/// so that nothing silently disappears from the report.
pub fn compute_diffs(run: &RunResult, directions: &DirectionTable) -> Vec<MetricDiff> {
    let empty = BTreeMap::new();
    let mut diffs = Vec::new();

    for suite in &run.suites {
        let baseline = run
            .baseline_results
            .get(suite)
            .map_or(&empty, |r| &r.metrics);
        let candidate = run
            .candidate_results
            .get(suite)
            .map_or(&empty, |r| &r.metrics);
        diffs.extend(compute_suite_diffs(suite, baseline, candidate, directions));
    }

    diffs
}

pub fn regressions(diffs: &[MetricDiff]) -> Vec<&MetricDiff> {
    diffs.iter().filter(|d| d.is_regression()).collect()
}

pub fn improvements(diffs: &[MetricDiff]) -> Vec<&MetricDiff> {
    diffs.iter().filter(|d| d.is_improvement()).collect()
}

pub fn summarize(diffs: &[MetricDiff]) -> DiffSummary {
    let regressed = regressions(diffs);
    let improved = improvements(diffs);

    DiffSummary {
        total_metrics: diffs.len(),
        regressions: regressed.len(),
        improvements: improved.len(),
        neutral: diffs.len() - regressed.len() - improved.len(),
        regressed_metrics: regressed.iter().map(|d| d.metric.clone()).collect(),
        improved_metrics: improved.iter().map(|d| d.metric.clone()).collect(),
    }
}
