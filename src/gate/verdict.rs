// Release verdicts and regression severities
//
// Both are closed enumerations with a total order so that aggregation is a
// plain `max` and can never be lowered by adding a contribution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall release decision, ordered `Ok < Warn < Block`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Candidate may ship
    #[default]
    Ok,
    /// Candidate ships with caution
    Warn,
    /// Candidate must not ship
    Block,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Ok => "ok",
            Verdict::Warn => "warn",
            Verdict::Block => "block",
        }
    }

    /// Process exit code expected by downstream automation
    ///
    /// OK → 0, BLOCK → 1, WARN → 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Ok => 0,
            Verdict::Block => 1,
            Verdict::Warn => 2,
        }
    }

    /// Maximum over a collection; empty input is `Ok`
    pub fn aggregate<I: IntoIterator<Item = Verdict>>(verdicts: I) -> Verdict {
        verdicts.into_iter().max().unwrap_or(Verdict::Ok)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Severity of a graded regression, ordered `Warn < Block`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Block,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warn => "warn",
            Severity::Block => "block",
        }
    }
}

impl From<Severity> for Verdict {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Warn => Verdict::Warn,
            Severity::Block => Verdict::Block,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
