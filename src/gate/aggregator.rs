// Final gate decision assembly
//
// Folds the grader, business-risk and trend contributions into one verdict.
// Every contribution can only raise the verdict (`max` under
// Ok < Warn < Block) and only ever set the review flag, never clear it.

use crate::gate::business_risk::{aggregate_risk_results, BusinessRiskResult};
use crate::gate::diff::DiffSummary;
use crate::gate::grader::RiskReport;
use crate::gate::pipeline::MetricAnalysis;
use crate::gate::trend::TrendAnalysis;
use crate::gate::verdict::Verdict;
use serde::{Deserialize, Serialize};

/// A metric whose computation failed and was left out of the decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedMetric {
    pub suite: Option<String>,
    pub metric: String,
    pub error: String,
}

/// A metric that was not graded because it lacks what grading needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedMetric {
    pub suite: String,
    pub metric: String,
    pub reason: String,
}

/// Complete outcome of one gating request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub verdict: Verdict,
    pub requires_human_review: bool,
    pub reasons: Vec<String>,
    pub risk_report: RiskReport,
    pub diff_summary: DiffSummary,
    pub analyses: Vec<MetricAnalysis>,
    pub business_risk: Vec<BusinessRiskResult>,
    pub trends: Vec<TrendAnalysis>,
    pub skipped: Vec<SkippedMetric>,
    pub excluded: Vec<ExcludedMetric>,
}

impl GateDecision {
    pub fn exit_code(&self) -> i32 {
        self.verdict.exit_code()
    }
}

/// Accumulates contributions in order and produces a [`GateDecision`]
#[derive(Debug, Default)]
pub struct GateAggregator {
    verdict: Verdict,
    requires_human_review: bool,
    reasons: Vec<String>,
    risk_report: RiskReport,
    business_risk: Vec<BusinessRiskResult>,
    trends: Vec<TrendAnalysis>,
    skipped: Vec<SkippedMetric>,
}

impl GateAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn requires_human_review(&self) -> bool {
        self.requires_human_review
    }

    /// Raw contribution: raise the verdict, record a reason, maybe flag review
    pub fn contribute(&mut self, verdict: Verdict, reason: Option<String>, review: bool) {
        self.verdict = self.verdict.max(verdict);
        self.requires_human_review |= review;
        if let Some(reason) = reason {
            self.reasons.push(reason);
        }
    }

    /// Threshold grading contribution
    pub fn add_risk_report(&mut self, report: RiskReport) {
        let messages: Vec<String> = report
            .regressions
            .iter()
            .map(|r| format!("[{}] {}", r.severity.as_str(), r.message))
            .collect();

        self.contribute(report.verdict, None, false);
        self.reasons.extend(messages);
        self.risk_report = report;
    }

    /// Business-risk overlay contribution
    pub fn add_business_risk(&mut self, results: Vec<BusinessRiskResult>) {
        let aggregate = aggregate_risk_results(&results);
        self.contribute(aggregate.verdict, None, aggregate.requires_human_review);
        self.reasons.extend(aggregate.reasons);
        self.business_risk.extend(results);
    }

    /// Erosion trend contribution
    pub fn add_trends(&mut self, trends: Vec<TrendAnalysis>) {
        for trend in &trends {
            let verdict = trend.verdict();
            let reason = (verdict != Verdict::Ok)
                .then(|| format!("{}: {}", trend.metric, trend.recommendation));
            self.contribute(verdict, reason, trend.requires_review());
        }
        self.trends.extend(trends);
    }

    /// Record a metric whose computation failed
    pub fn skip(&mut self, suite: Option<&str>, metric: &str, error: impl ToString) {
        self.skipped.push(SkippedMetric {
            suite: suite.map(str::to_string),
            metric: metric.to_string(),
            error: error.to_string(),
        });
    }

    pub fn finish(
        self,
        diff_summary: DiffSummary,
        analyses: Vec<MetricAnalysis>,
        excluded: Vec<ExcludedMetric>,
    ) -> GateDecision {
        GateDecision {
            verdict: self.verdict,
            requires_human_review: self.requires_human_review,
            reasons: self.reasons,
            risk_report: self.risk_report,
            diff_summary,
            analyses,
            business_risk: self.business_risk,
            trends: self.trends,
            skipped: self.skipped,
            excluded,
        }
    }
}
