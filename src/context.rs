//! Per-run state accumulated across lifecycle signals

use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;

use crate::outcome::{aggregate_outcome, elapsed_seconds, HostSummary, RunOutcome};

/// Timestamp layout used in rendered messages
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Facts collected about the current run
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub run_name: Option<String>,
    pub started_at: DateTime<FixedOffset>,
    pub finished_at: Option<DateTime<FixedOffset>>,
    pub elapsed_seconds: i64,
    pub outcome: RunOutcome,
    /// Targets reported at run completion, sorted by name
    pub hosts: Vec<String>,
    /// Run parameters have been extracted
    pub params_retrieved: bool,
    /// The single notification attempt has been made
    pub notified: bool,
}

impl RunContext {
    pub fn new(started_at: DateTime<FixedOffset>) -> Self {
        Self {
            run_name: None,
            started_at,
            finished_at: None,
            elapsed_seconds: 0,
            outcome: RunOutcome::default(),
            hosts: Vec::new(),
            params_retrieved: false,
            notified: false,
        }
    }

    /// Record the run-start signal
    pub fn start(&mut self, run_name: Option<String>, started_at: DateTime<FixedOffset>) {
        self.run_name = run_name;
        self.started_at = started_at;
    }

    /// Record final per-target results and timing
    pub fn complete(
        &mut self,
        stats: &BTreeMap<String, HostSummary>,
        finished_at: DateTime<FixedOffset>,
    ) {
        self.hosts = stats.keys().cloned().collect();
        self.outcome.merge(aggregate_outcome(stats));
        self.elapsed_seconds = elapsed_seconds(&self.started_at, &finished_at);
        self.finished_at = Some(finished_at);
    }

    pub fn started_display(&self) -> String {
        self.started_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Finish time, or the start time if the run never completed
    pub fn finished_display(&self) -> String {
        self.finished_at
            .unwrap_or(self.started_at)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-01T10:00:00-04:00").unwrap()
    }

    #[test]
    fn test_complete_records_timing_and_hosts() {
        let mut ctx = RunContext::new(t0());
        let mut stats = BTreeMap::new();
        stats.insert("web2".to_string(), HostSummary::default());
        stats.insert("web1".to_string(), HostSummary::default());

        ctx.complete(&stats, t0() + Duration::seconds(125));

        assert_eq!(ctx.elapsed_seconds, 125);
        assert_eq!(ctx.hosts, vec!["web1", "web2"]);
        assert_eq!(ctx.outcome, RunOutcome::Successful);
        assert_eq!(ctx.started_display(), "2024-05-01 10:00:00");
        assert_eq!(ctx.finished_display(), "2024-05-01 10:02:05");
    }

    #[test]
    fn test_failed_outcome_is_sticky() {
        let mut ctx = RunContext::new(t0());
        ctx.outcome = RunOutcome::Failed;
        ctx.complete(&BTreeMap::new(), t0());
        assert_eq!(ctx.outcome, RunOutcome::Failed);
    }

    #[test]
    fn test_start_overrides_creation_time() {
        let mut ctx = RunContext::new(t0());
        let later = t0() + Duration::seconds(30);
        ctx.start(Some("site.yml".to_string()), later);
        assert_eq!(ctx.started_at, later);
        assert_eq!(ctx.run_name.as_deref(), Some("site.yml"));
    }
}
