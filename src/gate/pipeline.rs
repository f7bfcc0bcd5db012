// Gate pipeline: one synchronous gating request end to end
//
//   RunResult ─┬─ diff ── grader ───────────────────────┐
//              └─ samples ── analyzer ── overlay ───────┤
//   HistoryStore ── trend ──────────────────────────────┴─ aggregator ── GateDecision
//
// Statistical analysis runs in parallel across metrics. A failure in one
// metric is recorded as skipped and never aborts the request.

use crate::gate::aggregator::{ExcludedMetric, GateAggregator, GateDecision};
use crate::gate::business_risk::{assess_business_risk, BusinessRiskResult};
use crate::gate::config::{GateConfig, Thresholds};
use crate::gate::diff::{compute_diffs, summarize};
use crate::gate::direction::{DirectionTable, MetricDirection};
use crate::gate::error::Result;
use crate::gate::grader::RiskGrader;
use crate::gate::statistics::{gate_with_significance, StatisticalAnalyzer, StatisticalResult};
use crate::gate::summary::{describe, SampleSummary};
use crate::gate::trend::TrendAnalyzer;
use crate::gate::verdict::Verdict;
use crate::history::HistoryStore;
use crate::runner::RunResult;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Statistical analysis of one sampled metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAnalysis {
    pub suite: String,
    pub metric: String,
    pub direction: MetricDirection,
    /// Raw orientation: `delta = mean(candidate) - mean(baseline)`
    pub result: StatisticalResult,
    pub baseline_summary: SampleSummary,
    pub candidate_summary: SampleSummary,
    /// Either group exceeds the configured coefficient-of-variation limit
    pub noisy: bool,
    /// CI-aware decision against the metric's block threshold
    pub significance_verdict: Verdict,
}

struct AnalysisTarget<'a> {
    suite: &'a str,
    metric: &'a str,
    direction: MetricDirection,
    thresholds: Thresholds,
    baseline: &'a [f64],
    candidate: &'a [f64],
}

/// Evaluate one gating request
///
/// # Arguments
/// * `run` - Baseline and candidate results, optionally with samples
/// * `config` - Validated gate configuration
/// * `directions` - Metric direction table (built-in plus adapter schemas)
/// * `history` - Optional store for erosion trend analysis
pub fn evaluate(
    run: &RunResult,
    config: &GateConfig,
    directions: &DirectionTable,
    history: Option<&dyn HistoryStore>,
) -> GateDecision {
    let mut aggregator = GateAggregator::new();
    let mut excluded = Exclusions::default();

    // Pairwise diff and threshold grading
    let diffs = compute_diffs(run, directions);
    let diff_summary = summarize(&diffs);
    let grader = RiskGrader::new(config.thresholds.clone());

    for diff in &diffs {
        if diff.direction.is_none() {
            excluded.add(&diff.suite, &diff.metric, "no direction registered");
        } else if !grader.has_threshold(&diff.metric) {
            excluded.add(&diff.suite, &diff.metric, "no threshold configured");
        } else if diff.delta.is_none() {
            let side = if diff.baseline_value.is_none() {
                "baseline"
            } else {
                "candidate"
            };
            excluded.add(&diff.suite, &diff.metric, &format!("missing from {side}"));
        }
    }

    aggregator.add_risk_report(grader.grade(&diffs));

    // Statistical analysis over per-sample observations
    let mut targets = Vec::new();
    for (suite, metric) in run.sampled_metrics() {
        let Some(direction) = directions.get(&metric) else {
            excluded.add(&suite, &metric, "no direction registered");
            continue;
        };
        let Some(thresholds) = config.thresholds.get(&metric).copied() else {
            excluded.add(&suite, &metric, "no threshold configured");
            continue;
        };
        let Some((baseline, candidate)) = run.paired_samples(&suite, &metric) else {
            continue;
        };
        targets.push((suite, metric, direction, thresholds, baseline, candidate));
    }

    let analyzer = config.analyzer();
    let outcomes: Vec<(AnalysisTarget<'_>, Result<MetricAnalysis>)> = targets
        .par_iter()
        .map(|(suite, metric, direction, thresholds, baseline, candidate)| {
            let target = AnalysisTarget {
                suite,
                metric,
                direction: *direction,
                thresholds: *thresholds,
                baseline,
                candidate,
            };
            let outcome = analyze_target(&analyzer, config, &target);
            (target, outcome)
        })
        .collect();

    let table = config.category_table();
    let mut analyses = Vec::new();
    let mut business_risk: Vec<BusinessRiskResult> = Vec::new();

    for (target, outcome) in outcomes {
        match outcome {
            Ok(analysis) => {
                let label = config.category_for(target.metric).unwrap_or_default();
                business_risk.push(assess_business_risk(
                    target.metric,
                    &analysis.result.oriented(target.direction),
                    label,
                    target.thresholds.block,
                    &table,
                ));
                analyses.push(analysis);
            }
            Err(e) => {
                warn!(suite = target.suite, metric = target.metric, "analysis skipped: {}", e);
                aggregator.skip(Some(target.suite), target.metric, &e);
            }
        }
    }

    aggregator.add_business_risk(business_risk);

    // Longitudinal erosion
    if let Some(store) = history {
        let trend = TrendAnalyzer::from_config(&config.trend);
        let (trends, failures) = trend.analyze_all(
            store,
            &config.trend.limits,
            directions,
            config.trend.history_limit,
        );
        aggregator.add_trends(trends);
        for (metric, e) in failures {
            aggregator.skip(None, &metric, &e);
        }
    }

    let decision = aggregator.finish(diff_summary, analyses, excluded.into_vec());

    info!(
        verdict = %decision.verdict,
        review = decision.requires_human_review,
        regressions = decision.risk_report.regressions.len(),
        skipped = decision.skipped.len(),
        "gate decision"
    );

    decision
}

fn analyze_target(
    analyzer: &StatisticalAnalyzer,
    config: &GateConfig,
    target: &AnalysisTarget<'_>,
) -> Result<MetricAnalysis> {
    let result = analyzer.analyze(target.baseline, target.candidate, config.significance_level)?;
    let baseline_summary = describe(target.baseline)?;
    let candidate_summary = describe(target.candidate)?;

    let noisy = config.noise_threshold.is_some_and(|limit| {
        baseline_summary.is_noisy(limit) || candidate_summary.is_noisy(limit)
    });
    let significance_verdict =
        gate_with_significance(&result, target.thresholds.block, target.direction);

    debug!(
        suite = target.suite,
        metric = target.metric,
        delta = result.delta,
        p_value = result.p_value,
        ci_lower = result.ci_lower,
        ci_upper = result.ci_upper,
        effect_size = result.effect_size,
        noisy,
        "metric analyzed"
    );

    Ok(MetricAnalysis {
        suite: target.suite.to_string(),
        metric: target.metric.to_string(),
        direction: target.direction,
        result,
        baseline_summary,
        candidate_summary,
        noisy,
        significance_verdict,
    })
}

/// Excluded metrics, first reason per `(suite, metric)` wins
#[derive(Default)]
struct Exclusions {
    entries: BTreeMap<(String, String), String>,
}

impl Exclusions {
    fn add(&mut self, suite: &str, metric: &str, reason: &str) {
        self.entries
            .entry((suite.to_string(), metric.to_string()))
            .or_insert_with(|| reason.to_string());
    }

    fn into_vec(self) -> Vec<ExcludedMetric> {
        self.entries
            .into_iter()
            .map(|((suite, metric), reason)| ExcludedMetric {
                suite,
                metric,
                reason,
            })
            .collect()
    }
}
