//! Configuration schema for run-notifier
//!
//! `NotifierSettings` is the plugin-level configuration read from the
//! settings file. `NotificationConfig` and `RunIdentifiers` are built once
//! per run from the host-provided parameters.

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::channels::webhook::DEFAULT_TIMEOUT_SECS;
use crate::error::{NotifierError, Result};

/// Placeholder webhook URL used when nothing else is configured
pub const DEFAULT_CHANNEL_URL: &str = "<replace with your default MS Team Webhook URL>";

/// Message template used when no override is given
pub const DEFAULT_TEMPLATE: &str = "templates/msteam_default_msg.json.j2";

/// Base URL of the orchestrating host's web UI
pub const DEFAULT_WEB_BASE_URL: &str = "https://myawx";

/// Sentinel for identifiers that are not available
pub const NOT_AVAILABLE: &str = "na";

/// Plugin-level settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NotifierSettings {
    /// Webhook URL used when the run does not override it
    pub default_channel_url: String,

    /// Template path used when the run does not override it
    pub default_template: String,

    /// Base URL for links back to the job in the host's web UI
    pub web_base_url: String,

    /// IANA timezone for timestamps, e.g. `Canada/Eastern`
    pub timezone: Option<String>,

    /// Fixed `+HH:MM` / `-HH:MM` offset, used when no timezone is named
    pub utc_offset: Option<String>,

    /// HTTP timeout for the webhook request
    pub timeout_secs: u64,

    /// Proxy URL for outbound requests
    pub proxy: Option<String>,

    /// Enable verbose progress logging
    pub verbose: bool,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            default_channel_url: DEFAULT_CHANNEL_URL.to_string(),
            default_template: DEFAULT_TEMPLATE.to_string(),
            web_base_url: DEFAULT_WEB_BASE_URL.to_string(),
            timezone: None,
            utc_offset: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            proxy: None,
            verbose: false,
        }
    }
}

impl NotifierSettings {
    /// Timezone all run timestamps are expressed in
    ///
    /// A named zone wins over a fixed offset; with neither, the machine's
    /// local time is used.
    pub fn run_timezone(&self) -> Result<RunTimezone> {
        if let Some(name) = self.timezone.as_deref() {
            let tz = name.trim().parse::<Tz>().map_err(|e| {
                NotifierError::ConfigError(format!("Invalid timezone {:?}: {}", name, e))
            })?;
            return Ok(RunTimezone::Named(tz));
        }

        match self.utc_offset.as_deref() {
            Some(offset) => offset
                .trim()
                .parse::<FixedOffset>()
                .map(RunTimezone::Fixed)
                .map_err(|e| {
                    NotifierError::ConfigError(format!("Invalid utc_offset {:?}: {}", offset, e))
                }),
            None => Ok(RunTimezone::Local),
        }
    }

    /// Check values that serde cannot validate on its own
    pub fn validate(&self) -> Result<()> {
        self.run_timezone()?;
        if self.timeout_secs == 0 {
            return Err(NotifierError::ConfigError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Timezone used to display run timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTimezone {
    /// Named zone, following its daylight-saving rules
    Named(Tz),
    Fixed(FixedOffset),
    Local,
}

impl RunTimezone {
    /// Express an instant as wall-clock time in this zone
    pub fn localize<Z: TimeZone>(&self, instant: &DateTime<Z>) -> DateTime<FixedOffset> {
        match self {
            Self::Named(tz) => fix_offset(instant.with_timezone(tz)),
            Self::Fixed(offset) => instant.with_timezone(offset),
            Self::Local => fix_offset(instant.with_timezone(&Local)),
        }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.localize(&Utc::now())
    }
}

fn fix_offset<Z: TimeZone>(local: DateTime<Z>) -> DateTime<FixedOffset> {
    let offset = local.offset().fix();
    local.with_timezone(&offset)
}

/// Identifiers supplied by the orchestrating host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentifiers {
    pub job_id: String,
    pub job_template_name: String,
    pub revision: String,
    /// True only when all identifiers came from the host context
    pub executed_from_host: bool,
}

impl Default for RunIdentifiers {
    fn default() -> Self {
        Self {
            job_id: NOT_AVAILABLE.to_string(),
            job_template_name: NOT_AVAILABLE.to_string(),
            revision: NOT_AVAILABLE.to_string(),
            executed_from_host: false,
        }
    }
}

/// Per-run notification configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    /// Global channel URL (run override or configured default)
    pub channel_url: String,
    /// Channel used for successful runs, if overridden
    pub success_channel_url: Option<String>,
    /// Channel used for failed runs, if overridden
    pub failure_channel_url: Option<String>,
    /// Template file to render
    pub message_template: String,
    /// Skip posting entirely
    pub disable_post: bool,
    pub environment: String,
    pub app_file: String,
    pub host_name: Option<String>,
    pub deployment_action: String,
    pub instance_name: String,
}

impl NotificationConfig {
    /// Configuration for a run that supplied no parameters
    pub fn defaults(settings: &NotifierSettings) -> Self {
        Self {
            channel_url: settings.default_channel_url.clone(),
            success_channel_url: None,
            failure_channel_url: None,
            message_template: settings.default_template.clone(),
            disable_post: false,
            environment: NOT_AVAILABLE.to_string(),
            app_file: NOT_AVAILABLE.to_string(),
            host_name: None,
            deployment_action: NOT_AVAILABLE.to_string(),
            instance_name: NOT_AVAILABLE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_settings() {
        let settings = NotifierSettings::default();
        assert_eq!(settings.default_channel_url, DEFAULT_CHANNEL_URL);
        assert_eq!(settings.default_template, "templates/msteam_default_msg.json.j2");
        assert_eq!(settings.timeout_secs, 10);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings: NotifierSettings = serde_json::from_value(json!({
            "default_channel_url": "https://example.com/hook",
            "utc_offset": "-05:00"
        }))
        .unwrap();

        assert_eq!(settings.default_channel_url, "https://example.com/hook");
        assert_eq!(settings.web_base_url, DEFAULT_WEB_BASE_URL);
        assert_eq!(
            settings.run_timezone().unwrap(),
            RunTimezone::Fixed(FixedOffset::west_opt(5 * 3600).unwrap())
        );
    }

    fn with_offset(offset: &str) -> NotifierSettings {
        NotifierSettings {
            utc_offset: Some(offset.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_utc_offset_forms() {
        let tz = with_offset("+02:30").run_timezone().unwrap();
        assert_eq!(tz, RunTimezone::Fixed(FixedOffset::east_opt(9000).unwrap()));
        let tz = with_offset("-0400").run_timezone().unwrap();
        assert_eq!(tz, RunTimezone::Fixed(FixedOffset::west_opt(14400).unwrap()));
        assert!(with_offset("Canada/Eastern").run_timezone().is_err());
        assert!(with_offset("+5").run_timezone().is_err());
    }

    #[test]
    fn test_unset_timezone_is_local() {
        assert_eq!(NotifierSettings::default().run_timezone().unwrap(), RunTimezone::Local);
    }

    #[test]
    fn test_named_timezone_follows_daylight_saving() {
        let settings = NotifierSettings {
            timezone: Some("Canada/Eastern".to_string()),
            utc_offset: Some("+09:00".to_string()),
            ..Default::default()
        };
        let tz = settings.run_timezone().unwrap();

        let summer = tz.localize(&DateTime::parse_from_rfc3339("2024-07-01T12:00:00Z").unwrap());
        assert_eq!(summer.offset().local_minus_utc(), -4 * 3600);
        assert_eq!(summer.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-07-01 08:00:00");

        let winter = tz.localize(&DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z").unwrap());
        assert_eq!(winter.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(winter.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-15 07:00:00");
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let settings = NotifierSettings {
            timezone: Some("Mars/Olympus".to_string()),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(NotifierError::ConfigError(_))));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let settings = NotifierSettings {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(NotifierError::ConfigError(_))));
    }

    #[test]
    fn test_identifier_defaults() {
        let ids = RunIdentifiers::default();
        assert_eq!(ids.job_id, "na");
        assert_eq!(ids.job_template_name, "na");
        assert_eq!(ids.revision, "na");
        assert!(!ids.executed_from_host);
    }
}
