// Error types for the gating engine
//
// Every error here is local to one metric's computation. The pipeline
// isolates failures per metric and reports them as skipped instead of
// aborting the whole gating request.

use std::fmt;
use thiserror::Error;

/// Which side of the comparison a sample vector belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleGroup {
    Baseline,
    Candidate,
}

impl fmt::Display for SampleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleGroup::Baseline => f.write_str("baseline"),
            SampleGroup::Candidate => f.write_str("candidate"),
        }
    }
}

/// Errors raised by the numeric core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    #[error("Invalid input: {group} sample vector is empty")]
    EmptySamples { group: SampleGroup },

    #[error("Invalid input: need at least {required} samples per group, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("Invalid input: {group} samples contain a non-finite value or overflow f64")]
    NonFiniteSample { group: SampleGroup },

    #[error("Invalid input: both sample groups have zero variance")]
    ZeroVariance,

    #[error("Metric {metric} already registered as {existing}, refusing {requested}")]
    ConflictingDirection {
        metric: String,
        existing: String,
        requested: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Distribution error: {0}")]
    Distribution(String),

    #[error("Descriptive statistics failed: {0}")]
    Descriptive(String),
}

impl GateError {
    /// True for the degenerate-sample family of errors
    ///
    /// These are the "invalid input" conditions: the data cannot support a
    /// statistical conclusion, which must never be read as "no regression".
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            GateError::EmptySamples { .. }
                | GateError::InsufficientSamples { .. }
                | GateError::NonFiniteSample { .. }
                | GateError::ZeroVariance
        )
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
