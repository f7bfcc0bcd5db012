//! Historical run storage for longitudinal trend analysis
//!
//! Runs are append-only. Reads order runs by timestamp with a stable sort, so
//! runs recorded at the same instant keep their insertion order.
//!
//! Two stores are provided:
//! - [`MemoryHistory`]: in-process, `RwLock`-guarded
//! - [`JsonlHistory`]: one JSON object per line in a plain file

use crate::gate::Verdict;
use crate::runner::RunResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history I/O failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history record {line} is malformed: {source}")]
    Serialization {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, HistoryError>;

/// One recorded gating run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRun {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub version_label: String,
    pub metrics: BTreeMap<String, f64>,
    pub verdict: Verdict,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl HistoricalRun {
    pub fn new(version_label: &str, metrics: BTreeMap<String, f64>, verdict: Verdict) -> Self {
        let timestamp = Utc::now();
        Self {
            run_id: format!("{}-{}", version_label, timestamp.timestamp_millis()),
            timestamp,
            version_label: version_label.to_string(),
            metrics,
            verdict,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Record the candidate side of a run under `version_label`
    ///
    /// Suites are flattened into one metric map; when two suites report the
    /// same metric name the first suite in run order wins.
    pub fn from_candidate(run: &RunResult, version_label: &str, verdict: Verdict) -> Self {
        let mut metrics = BTreeMap::new();
        for suite in &run.suites {
            if let Some(result) = run.candidate_results.get(suite) {
                for (name, value) in &result.metrics {
                    metrics.entry(name.clone()).or_insert(*value);
                }
            }
        }

        let mut record = Self::new(version_label, metrics, verdict);
        record
            .metadata
            .insert("model".to_string(), run.candidate_model.clone());
        record
            .metadata
            .insert("baseline_model".to_string(), run.baseline_model.clone());
        record
    }
}

/// Chronological values of one metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub metric: String,
    pub versions: Vec<String>,
    pub values: Vec<f64>,
}

impl MetricSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Append-only store of historical runs
pub trait HistoryStore: Send + Sync {
    fn append(&self, run: HistoricalRun) -> Result<()>;

    /// All runs (or the most recent `limit`), oldest first
    fn runs(&self, limit: Option<usize>) -> Result<Vec<HistoricalRun>>;

    /// The most recent `limit` runs that contain `metric`, oldest first
    fn read(&self, metric: &str, limit: Option<usize>) -> Result<MetricSeries> {
        let runs: Vec<HistoricalRun> = self
            .runs(None)?
            .into_iter()
            .filter(|r| r.metrics.contains_key(metric))
            .collect();
        let skip = limit.map_or(0, |l| runs.len().saturating_sub(l));

        let mut series = MetricSeries {
            metric: metric.to_string(),
            ..MetricSeries::default()
        };
        for run in runs.into_iter().skip(skip) {
            if let Some(value) = run.metrics.get(metric) {
                series.values.push(*value);
                series.versions.push(run.version_label);
            }
        }
        Ok(series)
    }
}

fn chronological(mut runs: Vec<HistoricalRun>, limit: Option<usize>) -> Vec<HistoricalRun> {
    runs.sort_by_key(|r| r.timestamp);
    if let Some(limit) = limit {
        let skip = runs.len().saturating_sub(limit);
        runs.drain(..skip);
    }
    runs
}

/// In-memory history
#[derive(Debug, Default)]
pub struct MemoryHistory {
    runs: RwLock<Vec<HistoricalRun>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_runs(runs: Vec<HistoricalRun>) -> Self {
        Self {
            runs: RwLock::new(runs),
        }
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&self, run: HistoricalRun) -> Result<()> {
        // A panicked writer cannot leave a half-pushed Vec behind
        let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
        runs.push(run);
        Ok(())
    }

    fn runs(&self, limit: Option<usize>) -> Result<Vec<HistoricalRun>> {
        let runs = self.runs.read().unwrap_or_else(|e| e.into_inner());
        Ok(chronological(runs.clone(), limit))
    }
}

/// JSON-lines file history
///
/// Appends go through one `Mutex`-guarded handle opened in append mode.
/// Reads re-parse the whole file.
#[derive(Debug)]
pub struct JsonlHistory {
    path: PathBuf,
    writer: Mutex<File>,
}

impl JsonlHistory {
    /// Open (or create) a history file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let io = |source| HistoryError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io)?;

        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl HistoryStore for JsonlHistory {
    fn append(&self, run: HistoricalRun) -> Result<()> {
        let mut line =
            serde_json::to_string(&run).map_err(|source| HistoryError::Serialization {
                line: 0,
                source,
            })?;
        line.push('\n');

        let mut file = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;
        file.flush().map_err(|e| self.io_error(e))
    }

    fn runs(&self, limit: Option<usize>) -> Result<Vec<HistoricalRun>> {
        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;

        let mut runs = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            let run = serde_json::from_str(&line).map_err(|source| {
                HistoryError::Serialization {
                    line: index + 1,
                    source,
                }
            })?;
            runs.push(run);
        }

        Ok(chronological(runs, limit))
    }
}
