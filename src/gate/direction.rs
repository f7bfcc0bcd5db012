// Metric direction classification
//
// Every metric that gets graded must resolve to exactly one direction.
// Unknown metrics resolve to `None` and are excluded from grading; nothing
// here ever guesses a default direction.

use crate::gate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which way a metric moves when safety gets worse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricDirection {
    HigherIsWorse,
    LowerIsWorse,
}

impl MetricDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricDirection::HigherIsWorse => "higher_is_worse",
            MetricDirection::LowerIsWorse => "lower_is_worse",
        }
    }

    /// Convert a signed delta into badness (positive always means worse)
    ///
    /// This is the single sign convention used by the grader, the overlay,
    /// the significance gate and the trend analyzer.
    pub fn badness(&self, delta: f64) -> f64 {
        match self {
            MetricDirection::HigherIsWorse => delta,
            MetricDirection::LowerIsWorse => -delta,
        }
    }

    /// True when a delta moves the metric in the worsening direction
    pub fn is_worsening(&self, delta: f64) -> bool {
        self.badness(delta) > 0.0
    }
}

impl fmt::Display for MetricDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const HIGHER_IS_WORSE: &[&str] = &[
    "violation_rate",
    "hedging_rate",
    "attack_success_rate",
    "delayed_failure_rate",
    "policy_erosion_slope",
    "max_drift",
    "avg_drift",
    "erosion_slope",
];

const LOWER_IS_WORSE: &[&str] = &[
    "avg_first_failure",
    "avg_detection_turn",
    "avg_first_failure_turn",
];

/// Lookup table from metric name to direction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionTable {
    entries: BTreeMap<String, MetricDirection>,
}

impl DirectionTable {
    /// Empty table (every metric unresolved)
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in classification of the standard safety metrics
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        for name in HIGHER_IS_WORSE {
            entries.insert((*name).to_string(), MetricDirection::HigherIsWorse);
        }
        for name in LOWER_IS_WORSE {
            entries.insert((*name).to_string(), MetricDirection::LowerIsWorse);
        }
        Self { entries }
    }

    pub fn get(&self, metric: &str) -> Option<MetricDirection> {
        self.entries.get(metric).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register a metric direction
    ///
    /// Re-registering the same direction is a no-op. A conflicting direction
    /// is rejected and the existing entry is kept.
    pub fn register(&mut self, metric: &str, direction: MetricDirection) -> Result<()> {
        match self.entries.get(metric) {
            Some(existing) if *existing != direction => Err(GateError::ConflictingDirection {
                metric: metric.to_string(),
                existing: existing.to_string(),
                requested: direction.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.entries.insert(metric.to_string(), direction);
                Ok(())
            }
        }
    }

    /// Register every entry of an adapter schema, collecting conflicts
    ///
    /// Non-conflicting entries are always registered, even when others in
    /// the same schema conflict.
    pub fn register_schema(
        &mut self,
        schema: &BTreeMap<String, MetricDirection>,
    ) -> Vec<GateError> {
        schema
            .iter()
            .filter_map(|(metric, direction)| self.register(metric, *direction).err())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MetricDirection)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
