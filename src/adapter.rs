//! Evaluation suite adapters
//!
//! An adapter wraps one external evaluation suite (misuse benchmarks,
//! red-team harnesses, trajectory analyzers) behind a uniform interface.
//! The gating core never sees a concrete adapter, only the
//! [`RunResult`](crate::runner::RunResult) the runner assembles from them.

use crate::gate::MetricDirection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("suite {suite} has no recorded results for model {model}")]
    UnknownModel { suite: String, model: String },

    #[error("suite {suite} failed: {message}")]
    Evaluation { suite: String, message: String },

    #[error("failed to read recorded results from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("recorded results are malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Standardized output of one suite run against one model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterResult {
    pub suite_name: String,
    /// Aggregate metric values (metric → value)
    pub metrics: BTreeMap<String, f64>,
    /// Per-sample observations backing the aggregates (metric → samples)
    #[serde(default)]
    pub samples: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Interface every evaluation suite implements
pub trait EvalAdapter: Send + Sync {
    /// Unique identifier of the suite
    fn suite_name(&self) -> &str;

    /// Direction of every metric this suite reports
    fn metrics_schema(&self) -> BTreeMap<String, MetricDirection>;

    /// Evaluate one model
    fn run(&self, model_id: &str) -> Result<AdapterResult, AdapterError>;
}

/// Adapter that replays pre-recorded results keyed by model id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedAdapter {
    suite: String,
    #[serde(default)]
    schema: BTreeMap<String, MetricDirection>,
    #[serde(default)]
    results: BTreeMap<String, AdapterResult>,
}

impl RecordedAdapter {
    pub fn new(suite: &str) -> Self {
        Self {
            suite: suite.to_string(),
            ..Self::default()
        }
    }

    pub fn with_metric(mut self, metric: &str, direction: MetricDirection) -> Self {
        self.schema.insert(metric.to_string(), direction);
        self
    }

    /// Record the result for `model_id`; the suite name is filled in
    pub fn with_result(mut self, model_id: &str, mut result: AdapterResult) -> Self {
        result.suite_name = self.suite.clone();
        self.results.insert(model_id.to_string(), result);
        self
    }

    /// Parse a recorded adapter from JSON
    ///
    /// ```json
    /// {"suite": "misuse",
    ///  "schema": {"violation_rate": "higher_is_worse"},
    ///  "results": {"model_v1": {"suite_name": "misuse", "metrics": {"violation_rate": 0.08}}}}
    /// ```
    pub fn from_json(json: &str) -> Result<Self, AdapterError> {
        let mut adapter: RecordedAdapter = serde_json::from_str(json)?;
        let suite = adapter.suite.clone();
        for result in adapter.results.values_mut() {
            result.suite_name = suite.clone();
        }
        Ok(adapter)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AdapterError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| AdapterError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }
}

impl EvalAdapter for RecordedAdapter {
    fn suite_name(&self) -> &str {
        &self.suite
    }

    fn metrics_schema(&self) -> BTreeMap<String, MetricDirection> {
        self.schema.clone()
    }

    fn run(&self, model_id: &str) -> Result<AdapterResult, AdapterError> {
        self.results
            .get(model_id)
            .cloned()
            .ok_or_else(|| AdapterError::UnknownModel {
                suite: self.suite.clone(),
                model: model_id.to_string(),
            })
    }
}
