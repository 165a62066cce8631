//! Run outcome aggregation
//!
//! Folds per-target result counters into a single run verdict.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Run-level verdict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    #[default]
    Successful,
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Failed => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Merge another verdict into this one; a failure is never undone
    pub fn merge(&mut self, other: RunOutcome) {
        if other.is_failed() {
            *self = RunOutcome::Failed;
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result counters reported by the host for a single target
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HostSummary {
    pub ok: u32,
    pub changed: u32,
    pub unreachable: u32,
    pub failures: u32,
    pub skipped: u32,
    pub rescued: u32,
    pub ignored: u32,
}

impl HostSummary {
    /// Whether this target counts against the run
    pub fn is_failed(&self) -> bool {
        self.failures > 0 || self.unreachable > 0
    }

    /// Verdict for this target alone
    pub fn outcome(&self) -> RunOutcome {
        if self.is_failed() {
            RunOutcome::Failed
        } else {
            RunOutcome::Successful
        }
    }
}

/// Aggregate per-target summaries into a run verdict
///
/// Targets are visited in name order so debug output is reproducible.
pub fn aggregate_outcome(stats: &BTreeMap<String, HostSummary>) -> RunOutcome {
    let mut outcome = RunOutcome::Successful;
    for (host, summary) in stats {
        tracing::debug!(host = %host, summary = ?summary, "Summary for host");
        outcome.merge(summary.outcome());
    }
    outcome
}

/// Whole seconds between two timestamps
pub fn elapsed_seconds(started: &DateTime<FixedOffset>, finished: &DateTime<FixedOffset>) -> i64 {
    (*finished - *started).num_seconds()
}
