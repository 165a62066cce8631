//! Destination selection for the run notification
//!
//! A run may name a channel for successful runs and another for failed
//! runs. Without a matching override the global channel URL is used, which
//! itself falls back to the configured default.

use crate::config::NotificationConfig;
use crate::outcome::RunOutcome;

/// Channel router for outcome-based destination selection
pub struct ChannelRouter<'a> {
    config: &'a NotificationConfig,
}

impl<'a> ChannelRouter<'a> {
    pub fn new(config: &'a NotificationConfig) -> Self {
        Self { config }
    }

    /// Pick the webhook URL for a run outcome
    pub fn match_channel(&self, outcome: RunOutcome) -> &'a str {
        let outcome_override = match outcome {
            RunOutcome::Successful => self.config.success_channel_url.as_deref(),
            RunOutcome::Failed => self.config.failure_channel_url.as_deref(),
        };

        match outcome_override {
            Some(url) => {
                tracing::debug!(outcome = %outcome, url = %url, "Using outcome-specific channel");
                url
            }
            None => {
                tracing::debug!(outcome = %outcome, url = %self.config.channel_url, "Using global channel");
                &self.config.channel_url
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NotifierSettings, DEFAULT_CHANNEL_URL};

    fn create_test_config() -> NotificationConfig {
        NotificationConfig::defaults(&NotifierSettings::default())
    }

    #[test]
    fn test_default_channel() {
        let config = create_test_config();
        let router = ChannelRouter::new(&config);
        assert_eq!(router.match_channel(RunOutcome::Successful), DEFAULT_CHANNEL_URL);
        assert_eq!(router.match_channel(RunOutcome::Failed), DEFAULT_CHANNEL_URL);
    }

    #[test]
    fn test_failure_override_wins() {
        let mut config = create_test_config();
        config.channel_url = "https://example.com/global".to_string();
        config.success_channel_url = Some("https://example.com/ok".to_string());
        config.failure_channel_url = Some("https://example.com/failed".to_string());

        let router = ChannelRouter::new(&config);
        assert_eq!(router.match_channel(RunOutcome::Failed), "https://example.com/failed");
        assert_eq!(router.match_channel(RunOutcome::Successful), "https://example.com/ok");
    }

    #[test]
    fn test_global_override_beats_default() {
        let mut config = create_test_config();
        config.channel_url = "https://example.com/global".to_string();
        config.success_channel_url = Some("https://example.com/ok".to_string());

        let router = ChannelRouter::new(&config);
        assert_eq!(router.match_channel(RunOutcome::Failed), "https://example.com/global");
    }

    #[test]
    fn test_success_override_ignored_for_failed_run() {
        let mut config = create_test_config();
        config.success_channel_url = Some("https://example.com/ok".to_string());

        let router = ChannelRouter::new(&config);
        assert_eq!(router.match_channel(RunOutcome::Failed), DEFAULT_CHANNEL_URL);
    }
}
