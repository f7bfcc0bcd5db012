// Threshold grading of metric diffs
//
// Each regression's badness is compared against its metric's warn / block
// thresholds. Metrics with no direction or no configured threshold are not
// graded; the pipeline reports them as excluded.

use crate::gate::config::Thresholds;
use crate::gate::diff::MetricDiff;
use crate::gate::verdict::{Severity, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A graded regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub metric_diff: MetricDiff,
    pub severity: Severity,
    /// The threshold that was crossed
    pub threshold: f64,
    pub message: String,
}

/// Grading outcome for a whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub verdict: Verdict,
    pub regressions: Vec<Regression>,
    pub summary: String,
}

impl RiskReport {
    pub fn blocks(&self) -> impl Iterator<Item = &Regression> {
        self.regressions
            .iter()
            .filter(|r| r.severity == Severity::Block)
    }

    pub fn warns(&self) -> impl Iterator<Item = &Regression> {
        self.regressions
            .iter()
            .filter(|r| r.severity == Severity::Warn)
    }
}

impl Default for RiskReport {
    fn default() -> Self {
        Self {
            verdict: Verdict::Ok,
            regressions: Vec::new(),
            summary: ok_summary(),
        }
    }
}

/// Grades diffs against per-metric thresholds
#[derive(Debug, Clone)]
pub struct RiskGrader {
    thresholds: BTreeMap<String, Thresholds>,
}

impl RiskGrader {
    pub fn new(thresholds: BTreeMap<String, Thresholds>) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &BTreeMap<String, Thresholds> {
        &self.thresholds
    }

    pub fn has_threshold(&self, metric: &str) -> bool {
        self.thresholds.contains_key(metric)
    }

    /// Classify one diff; `None` if it is not a reportable regression
    pub fn classify(&self, diff: &MetricDiff) -> Option<Regression> {
        if !diff.is_regression() {
            return None;
        }
        let t = self.thresholds.get(&diff.metric)?;
        let magnitude = diff.badness()?;
        let delta = diff.delta?;

        let (severity, threshold) = if magnitude >= t.block {
            (Severity::Block, t.block)
        } else if magnitude >= t.warn {
            (Severity::Warn, t.warn)
        } else {
            return None;
        };

        Some(Regression {
            metric_diff: diff.clone(),
            severity,
            threshold,
            message: format!(
                "{} regressed by {:+.3} (threshold: {})",
                diff.metric, delta, threshold
            ),
        })
    }

    /// Grade every diff and aggregate to a verdict
    pub fn grade(&self, diffs: &[MetricDiff]) -> RiskReport {
        let regressions: Vec<Regression> = diffs.iter().filter_map(|d| self.classify(d)).collect();

        let verdict = Verdict::aggregate(regressions.iter().map(|r| Verdict::from(r.severity)));
        let count = |severity| regressions.iter().filter(|r| r.severity == severity).count();

        let summary = match verdict {
            Verdict::Block => format!(
                "BLOCK: {} severe regression(s) detected. Release NOT recommended.",
                count(Severity::Block)
            ),
            Verdict::Warn => format!(
                "WARN: {} moderate regression(s) detected. Review recommended.",
                count(Severity::Warn)
            ),
            Verdict::Ok => ok_summary(),
        };

        RiskReport {
            verdict,
            regressions,
            summary,
        }
    }
}

fn ok_summary() -> String {
    "OK: No significant regressions detected. Release approved.".to_string()
}
