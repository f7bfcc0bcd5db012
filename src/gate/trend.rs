// Multi-release erosion detection
//
// Pairwise gating compares two releases and can miss a metric that worsens
// by a sub-threshold amount every release. This module fits an ordinary
// least squares line through the recorded history of a metric and projects
// how many releases remain until an absolute limit is crossed.
//
// The fit is closed form on (index, value) pairs; no external solver.

use crate::gate::config::TrendConfig;
use crate::gate::direction::{DirectionTable, MetricDirection};
use crate::gate::verdict::Verdict;
use crate::history::{HistoryError, HistoryStore, MetricSeries};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Absorbs float noise when turning a release count into a whole number
const BREACH_TOLERANCE: f64 = 1e-9;

/// Minimum goodness of fit before an erosion trend is trusted
const MIN_CONFIDENT_R_SQUARED: f64 = 0.7;

/// Floor under the mean level a slope is normalized by
const MIN_RELATIVE_LEVEL: f64 = 0.1;

const CRITICAL_HORIZON: u64 = 3;
const WARNING_HORIZON: u64 = 10;

/// Urgency of a trend, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendTier {
    InsufficientData,
    NoTrend,
    LowConfidence,
    Monitor,
    Warning,
    Critical,
}

impl TrendTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendTier::InsufficientData => "insufficient_data",
            TrendTier::NoTrend => "no_trend",
            TrendTier::LowConfidence => "low_confidence",
            TrendTier::Monitor => "monitor",
            TrendTier::Warning => "warning",
            TrendTier::Critical => "critical",
        }
    }

    /// Contribution of this tier to the release verdict
    pub fn verdict(&self) -> Verdict {
        match self {
            TrendTier::Critical | TrendTier::Warning => Verdict::Warn,
            _ => Verdict::Ok,
        }
    }

    pub fn requires_review(&self) -> bool {
        *self == TrendTier::Critical
    }
}

/// Result of analyzing one metric's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub metric: String,
    pub values: Vec<f64>,
    pub versions: Vec<String>,
    pub direction: MetricDirection,
    /// Absolute metric level whose crossing is a breach
    pub limit: f64,
    /// Change per release
    pub slope: f64,
    /// Slope relative to the mean level of the series (level floored at 0.1)
    pub relative_slope: f64,
    pub r_squared: f64,
    pub is_eroding: bool,
    /// Releases until `limit` is crossed at the current rate (0 = already)
    pub projected_breach_releases: Option<u64>,
    pub tier: TrendTier,
    pub recommendation: String,
}

impl TrendAnalysis {
    pub fn verdict(&self) -> Verdict {
        self.tier.verdict()
    }

    pub fn requires_review(&self) -> bool {
        self.tier.requires_review()
    }
}

/// Erosion detector over historical series
#[derive(Debug, Clone)]
pub struct TrendAnalyzer {
    erosion_threshold: f64,
    min_runs: usize,
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::from_config(&TrendConfig::default())
    }
}

impl TrendAnalyzer {
    pub fn new(erosion_threshold: f64, min_runs: usize) -> Self {
        Self {
            erosion_threshold,
            min_runs,
        }
    }

    pub fn from_config(config: &TrendConfig) -> Self {
        Self::new(config.erosion_threshold, config.min_runs)
    }

    /// Least squares fit over `(index, value)`: returns `(slope, r_squared)`
    ///
    /// Fewer than two points give `(0, 0)`; a flat series has `r_squared` 0.
    pub fn linear_regression(values: &[f64]) -> (f64, f64) {
        let n = values.len();
        if n < 2 {
            return (0.0, 0.0);
        }

        let n_f = n as f64;
        let sum_x: f64 = (0..n).map(|i| i as f64).sum();
        let sum_y: f64 = values.iter().sum();
        let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
        let sum_x2: f64 = (0..n).map(|i| (i as f64).powi(2)).sum();

        let slope = (n_f * sum_xy - sum_x * sum_y) / (n_f * sum_x2 - sum_x.powi(2));
        let intercept = (sum_y - slope * sum_x) / n_f;
        let mean_y = sum_y / n_f;

        let (ss_res, ss_tot) = values
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(res, tot), (i, y)| {
                let predicted = slope * i as f64 + intercept;
                (res + (y - predicted).powi(2), tot + (y - mean_y).powi(2))
            });

        let r_squared = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else {
            0.0
        };

        (slope, r_squared)
    }

    /// Releases until `current` crosses `limit` at `slope` per release
    ///
    /// `Some(0)` when already at or past the limit; `None` when the slope is
    /// flat or points away from the limit.
    pub fn project_breach(
        current: f64,
        slope: f64,
        limit: f64,
        direction: MetricDirection,
    ) -> Option<u64> {
        let gap = direction.badness(limit - current);
        if gap <= 0.0 {
            return Some(0);
        }

        let rate = direction.badness(slope);
        if rate <= 0.0 {
            return None;
        }

        let releases = (gap / rate - BREACH_TOLERANCE).ceil().max(0.0);
        Some(releases as u64)
    }

    /// Analyze one series against an absolute limit
    pub fn analyze_series(
        &self,
        series: &MetricSeries,
        limit: f64,
        direction: MetricDirection,
    ) -> TrendAnalysis {
        let values = &series.values;

        if values.len() < self.min_runs {
            return TrendAnalysis {
                metric: series.metric.clone(),
                values: values.clone(),
                versions: series.versions.clone(),
                direction,
                limit,
                slope: 0.0,
                relative_slope: 0.0,
                r_squared: 0.0,
                is_eroding: false,
                projected_breach_releases: None,
                tier: TrendTier::InsufficientData,
                recommendation: format!("Insufficient data (need {} runs)", self.min_runs),
            };
        }

        let (slope, r_squared) = Self::linear_regression(values);
        let level = (values.iter().sum::<f64>() / values.len() as f64).abs();
        let relative_slope = slope / level.max(MIN_RELATIVE_LEVEL);

        // Either the absolute or the level-relative rate may cross the threshold
        let is_eroding = direction.is_worsening(slope)
            && (slope.abs() > self.erosion_threshold
                || relative_slope.abs() > self.erosion_threshold);

        let current = values[values.len() - 1];
        let breach = Self::project_breach(current, slope, limit, direction);

        let tier = if !is_eroding {
            TrendTier::NoTrend
        } else if r_squared <= MIN_CONFIDENT_R_SQUARED {
            TrendTier::LowConfidence
        } else {
            match breach {
                Some(n) if n <= CRITICAL_HORIZON => TrendTier::Critical,
                Some(n) if n <= WARNING_HORIZON => TrendTier::Warning,
                _ => TrendTier::Monitor,
            }
        };

        let recommendation = match (tier, breach) {
            (TrendTier::Critical, Some(0)) => "CRITICAL: Threshold already breached".to_string(),
            (TrendTier::Critical, Some(n)) => {
                format!("CRITICAL: Threshold breach projected in {n} releases")
            }
            (TrendTier::Warning, Some(n)) => {
                format!("WARNING: Slow erosion detected, breach in ~{n} releases")
            }
            (TrendTier::Monitor, _) => "MONITOR: Erosion trend detected but not urgent".to_string(),
            (TrendTier::LowConfidence, _) => {
                "INVESTIGATE: Possible erosion but low confidence (noisy data)".to_string()
            }
            _ => "OK: No significant erosion trend".to_string(),
        };

        debug!(
            metric = %series.metric,
            slope,
            relative_slope,
            r_squared,
            tier = tier.as_str(),
            "trend analyzed"
        );

        TrendAnalysis {
            metric: series.metric.clone(),
            values: values.clone(),
            versions: series.versions.clone(),
            direction,
            limit,
            slope,
            relative_slope,
            r_squared,
            is_eroding,
            projected_breach_releases: breach,
            tier,
            recommendation,
        }
    }

    /// Analyze a raw value list (versions are numbered `1..=n`)
    pub fn analyze_metric(
        &self,
        metric: &str,
        values: &[f64],
        limit: f64,
        direction: MetricDirection,
    ) -> TrendAnalysis {
        let series = MetricSeries {
            metric: metric.to_string(),
            versions: (1..=values.len()).map(|i| i.to_string()).collect(),
            values: values.to_vec(),
        };
        self.analyze_series(&series, limit, direction)
    }

    /// Analyze every metric with a configured limit and a known direction
    ///
    /// Metrics without a direction or without any history are skipped. A
    /// metric whose history cannot be read is returned alongside its error
    /// so the remaining metrics are still analyzed.
    pub fn analyze_all(
        &self,
        store: &dyn HistoryStore,
        limits: &BTreeMap<String, f64>,
        directions: &DirectionTable,
        history_limit: Option<usize>,
    ) -> (Vec<TrendAnalysis>, Vec<(String, HistoryError)>) {
        let mut analyses = Vec::new();
        let mut failures = Vec::new();

        for (metric, limit) in limits {
            let Some(direction) = directions.get(metric) else {
                debug!(%metric, "trend limit configured for metric without direction");
                continue;
            };

            let series = match store.read(metric, history_limit) {
                Ok(series) => series,
                Err(e) => {
                    warn!(%metric, "history read failed: {}", e);
                    failures.push((metric.clone(), e));
                    continue;
                }
            };
            if series.is_empty() {
                continue;
            }

            analyses.push(self.analyze_series(&series, *limit, direction));
        }

        (analyses, failures)
    }
}
