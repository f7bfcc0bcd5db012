//! Baseline vs candidate orchestration
//!
//! Runs every requested suite against both models and packages the results
//! as a [`RunResult`], which is also the serialized input format of the
//! `safety-gate` binary.

use crate::adapter::{AdapterError, EvalAdapter};
use crate::gate::DirectionTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Unknown suite: {0}")]
    UnknownSuite(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// One suite's output for one model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteResult {
    pub suite: String,
    pub model: String,
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub samples: BTreeMap<String, Vec<f64>>,
}

/// Complete results of one baseline vs candidate evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub baseline_model: String,
    pub candidate_model: String,
    pub suites: Vec<String>,
    pub baseline_results: BTreeMap<String, SuiteResult>,
    pub candidate_results: BTreeMap<String, SuiteResult>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl RunResult {
    /// Paired sample vectors for `(suite, metric)` when both sides have them
    pub fn paired_samples(&self, suite: &str, metric: &str) -> Option<(&[f64], &[f64])> {
        let baseline = self.baseline_results.get(suite)?.samples.get(metric)?;
        let candidate = self.candidate_results.get(suite)?.samples.get(metric)?;
        Some((baseline.as_slice(), candidate.as_slice()))
    }

    /// Every `(suite, metric)` with samples on both sides, in sorted order
    pub fn sampled_metrics(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for suite in &self.suites {
            let (Some(baseline), Some(candidate)) = (
                self.baseline_results.get(suite),
                self.candidate_results.get(suite),
            ) else {
                continue;
            };
            for metric in baseline.samples.keys() {
                if candidate.samples.contains_key(metric) {
                    pairs.push((suite.clone(), metric.clone()));
                }
            }
        }
        pairs
    }
}

/// Orchestrates regression evaluation across registered adapters
pub struct RegressionRunner {
    adapters: BTreeMap<String, Box<dyn EvalAdapter>>,
}

impl RegressionRunner {
    /// Register adapters by suite name; a repeated suite name keeps the first
    pub fn new(adapters: Vec<Box<dyn EvalAdapter>>) -> Self {
        let mut registered: BTreeMap<String, Box<dyn EvalAdapter>> = BTreeMap::new();
        for adapter in adapters {
            let suite = adapter.suite_name().to_string();
            if registered.contains_key(&suite) {
                warn!(%suite, "duplicate adapter ignored");
                continue;
            }
            registered.insert(suite, adapter);
        }
        Self {
            adapters: registered,
        }
    }

    pub fn suites(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    /// Run the requested suites (all registered suites when `None`)
    pub fn run(
        &self,
        baseline_model: &str,
        candidate_model: &str,
        suites: Option<&[String]>,
    ) -> Result<RunResult, RunnerError> {
        let suites: Vec<String> = match suites {
            Some(requested) => requested.to_vec(),
            None => self.adapters.keys().cloned().collect(),
        };

        let mut selected = Vec::with_capacity(suites.len());
        for suite in &suites {
            let adapter = self
                .adapters
                .get(suite)
                .ok_or_else(|| RunnerError::UnknownSuite(suite.clone()))?;
            selected.push((suite, adapter));
        }

        let mut baseline_results = BTreeMap::new();
        let mut candidate_results = BTreeMap::new();

        for (suite, adapter) in selected {
            debug!(%suite, baseline = baseline_model, candidate = candidate_model, "running suite");
            for (model, results) in [
                (baseline_model, &mut baseline_results),
                (candidate_model, &mut candidate_results),
            ] {
                let output = adapter.run(model)?;
                results.insert(
                    suite.clone(),
                    SuiteResult {
                        suite: suite.clone(),
                        model: model.to_string(),
                        metrics: output.metrics,
                        samples: output.samples,
                    },
                );
            }
        }

        Ok(RunResult {
            baseline_model: baseline_model.to_string(),
            candidate_model: candidate_model.to_string(),
            suites,
            baseline_results,
            candidate_results,
            timestamp: Utc::now(),
        })
    }

    /// Built-in directions merged with every adapter's schema
    ///
    /// Conflicting registrations are rejected and logged; the metric keeps
    /// its first direction.
    pub fn direction_table(&self) -> DirectionTable {
        let mut table = DirectionTable::builtin();
        for adapter in self.adapters.values() {
            for conflict in table.register_schema(&adapter.metrics_schema()) {
                warn!(suite = adapter.suite_name(), "{}", conflict);
            }
        }
        table
    }
}
