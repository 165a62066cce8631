//! Core notification logic for run-notifier
//!
//! This crate listens to an automation run's lifecycle signals, works out
//! whether the run succeeded and posts a single summary message card to an
//! MS Teams channel webhook when the run completes.

mod channels;
mod config;
mod context;
mod error;
mod hooks;
mod logging;
mod notifier;
mod outcome;
mod payload;
mod router;

use std::io::BufRead;

pub use channels::*;
pub use config::*;
pub use context::{RunContext, TIMESTAMP_FORMAT};
pub use error::{ChannelError, NotifierError, Result};
pub use hooks::*;
pub use logging::init_logging;
pub use notifier::{
    build_context, preview_message, render_message, NotifyOutcome, RunNotifier, RunParameters,
};
pub use outcome::{aggregate_outcome, elapsed_seconds, HostSummary, RunOutcome};
pub use payload::parse_payload;
pub use router::ChannelRouter;

/// Parse a single lifecycle event line
pub fn parse_event(line: &str) -> Result<LifecycleEvent> {
    if line.trim().is_empty() {
        return Err(NotifierError::InvalidInput("Empty input received".to_string()));
    }
    Ok(serde_json::from_str(line)?)
}

/// Feed JSON-lines lifecycle events to a notifier
///
/// Blank lines are ignored and malformed or non-UTF-8 lines are logged and
/// skipped, so a bad event never aborts the host. A read failure ends the
/// stream. Fatal notifier errors stop processing and are returned. The result of the run-complete event, if any, is
/// returned on success.
pub fn process_events<R, C>(
    notifier: &mut RunNotifier<C>,
    reader: R,
) -> Result<Option<NotifyOutcome>>
where
    R: BufRead,
    C: NotificationChannel,
{
    let mut last_outcome = None;

    for (index, raw) in reader.split(b'\n').enumerate() {
        let raw = match raw {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "Stopped reading lifecycle events");
                break;
            }
        };
        let line = match String::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "Skipping lifecycle event that is not UTF-8");
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match parse_event(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "Skipping malformed lifecycle event");
                continue;
            }
        };

        if let Some(outcome) = notifier.handle_event(&event)? {
            last_outcome = Some(outcome);
        }
    }

    if last_outcome.is_none() {
        tracing::debug!("Event stream ended without a run_complete event");
    }
    Ok(last_outcome)
}
