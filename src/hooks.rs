//! Lifecycle event definitions for run-notifier
//!
//! The host automation engine emits three signals per run. The adapter
//! binary receives them as one JSON object per line, tagged by `event`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::outcome::HostSummary;

/// Lifecycle signal emitted by the host
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A run (playbook) is starting
    RunStart(RunDescriptor),
    /// A phase (play) of the run is starting
    PhaseStart(PhaseDescriptor),
    /// The run finished and per-target results are final
    RunComplete(RunStats),
}

impl LifecycleEvent {
    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Self::RunStart(_) => "run_start",
            Self::PhaseStart(_) => "phase_start",
            Self::RunComplete(_) => "run_complete",
        }
    }
}

/// Data carried by a run-start signal
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct RunDescriptor {
    /// Name of the run, usually the playbook file name
    #[serde(default)]
    pub name: Option<String>,
    /// Time the host started the run
    #[serde(default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
}

/// Data carried by a phase-start signal
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct PhaseDescriptor {
    /// Name of the phase
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form run-scoped parameters (extra vars)
    #[serde(default)]
    pub extra_vars: Option<Map<String, Value>>,
    /// Trusted identifiers supplied by the orchestrating host
    #[serde(default)]
    pub host_context: Option<Map<String, Value>>,
}

/// Data carried by a run-complete signal
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Result counters keyed by target name
    #[serde(default)]
    pub stats: BTreeMap<String, HostSummary>,
    /// Time the host finished the run
    #[serde(default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl RunStats {
    /// Build stats from `(target, summary)` pairs (for testing)
    pub fn from_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = (S, HostSummary)>,
        S: Into<String>,
    {
        Self {
            stats: hosts
                .into_iter()
                .map(|(name, summary)| (name.into(), summary))
                .collect(),
            timestamp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_start() {
        let json = r#"{"event":"run_start","name":"site.yml","timestamp":"2024-05-01T10:00:00-04:00"}"#;
        let event: LifecycleEvent = serde_json::from_str(json).unwrap();
        match event {
            LifecycleEvent::RunStart(run) => {
                assert_eq!(run.name.as_deref(), Some("site.yml"));
                assert_eq!(
                    run.timestamp.unwrap().to_rfc3339(),
                    "2024-05-01T10:00:00-04:00"
                );
            }
            other => panic!("Expected run_start, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_phase_start_without_parameters() {
        let event: LifecycleEvent =
            serde_json::from_str(r#"{"event":"phase_start"}"#).unwrap();
        assert_eq!(event.name(), "phase_start");
        match event {
            LifecycleEvent::PhaseStart(phase) => {
                assert!(phase.extra_vars.is_none());
                assert!(phase.host_context.is_none());
            }
            other => panic!("Expected phase_start, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_run_complete_with_partial_counters() {
        let json = r#"{
            "event": "run_complete",
            "stats": {
                "web2": {"ok": 4, "failures": 1},
                "web1": {"ok": 3, "unreachable": 0}
            }
        }"#;
        let event: LifecycleEvent = serde_json::from_str(json).unwrap();
        match event {
            LifecycleEvent::RunComplete(stats) => {
                let hosts: Vec<&String> = stats.stats.keys().collect();
                assert_eq!(hosts, vec!["web1", "web2"]);
                assert_eq!(stats.stats["web2"].failures, 1);
                assert_eq!(stats.stats["web2"].skipped, 0);
            }
            other => panic!("Expected run_complete, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let result = serde_json::from_str::<LifecycleEvent>(r#"{"event":"task_start"}"#);
        assert!(result.is_err());
    }
}
