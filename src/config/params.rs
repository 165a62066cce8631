//! Run parameter extraction
//!
//! Pulls the notifier's optional parameters out of the host-provided
//! parameter bag. Lookups never fail: anything missing or unusable falls
//! back to the documented default.

use serde_json::{Map, Value};

use crate::config::schema::{NotificationConfig, NotifierSettings, RunIdentifiers};

pub const DISABLE_POST: &str = "v_disable_msteam_post";
pub const ENVIRONMENT: &str = "v_environment";
pub const APP_FILE: &str = "v_app_file";
pub const HOST_NAME: &str = "v_host_name";
pub const DEPLOYMENT_ACTION: &str = "v_deployment_action";
pub const INSTANCE_NAME: &str = "v_instance_name";
pub const CHANNEL_URL: &str = "v_msteam_channel_url";
pub const SUCCESS_CHANNEL_URL: &str = "v_success_channel_url";
pub const FAILURE_CHANNEL_URL: &str = "v_failure_channel_url";
pub const MESSAGE_TEMPLATE: &str = "v_message_template";

pub const HOST_JOB_ID: &str = "tower_job_id";
pub const HOST_JOB_TEMPLATE_NAME: &str = "tower_job_template_name";
pub const HOST_PROJECT_REVISION: &str = "tower_project_revision";

/// Read-only view over a run-scoped parameter mapping
#[derive(Debug, Clone, Copy)]
pub struct ParamBag<'a> {
    values: Option<&'a Map<String, Value>>,
}

impl<'a> ParamBag<'a> {
    pub fn new(values: Option<&'a Map<String, Value>>) -> Self {
        Self { values }
    }

    /// Look up a string parameter
    ///
    /// Scalars are stringified. `null`, lists, objects, `""` and `"none"`
    /// (any case) count as not provided.
    pub fn get_opt(&self, key: &str) -> Option<String> {
        let value = match self.values.and_then(|values| values.get(key)) {
            Some(value) => value,
            None => {
                tracing::debug!("Could not retrieve {} from run parameters", key);
                return None;
            }
        };

        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => {
                tracing::debug!("Ignoring non-scalar value for {}", key);
                return None;
            }
        };

        if text.is_empty() || text.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(text)
        }
    }

    /// Look up a string parameter with a default
    pub fn get(&self, key: &str, default: &str) -> String {
        self.get_opt(key).unwrap_or_else(|| default.to_string())
    }

    /// Look up a boolean-like parameter
    ///
    /// `"yes"` and `"true"` (any case) and JSON `true` are true; anything
    /// else, including a missing key, is false.
    pub fn get_flag(&self, key: &str) -> bool {
        match self.values.and_then(|values| values.get(key)) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => {
                s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true")
            }
            _ => false,
        }
    }
}

/// Build the per-run notification configuration from the parameter bag
pub fn extract_config(
    extra_vars: Option<&Map<String, Value>>,
    settings: &NotifierSettings,
) -> NotificationConfig {
    let bag = ParamBag::new(extra_vars);
    let defaults = NotificationConfig::defaults(settings);

    let config = NotificationConfig {
        channel_url: bag.get(CHANNEL_URL, &defaults.channel_url),
        success_channel_url: bag.get_opt(SUCCESS_CHANNEL_URL),
        failure_channel_url: bag.get_opt(FAILURE_CHANNEL_URL),
        message_template: bag.get(MESSAGE_TEMPLATE, &defaults.message_template),
        disable_post: bag.get_flag(DISABLE_POST),
        environment: bag.get(ENVIRONMENT, &defaults.environment),
        app_file: bag.get(APP_FILE, &defaults.app_file),
        host_name: bag.get_opt(HOST_NAME),
        deployment_action: bag.get(DEPLOYMENT_ACTION, &defaults.deployment_action),
        instance_name: bag.get(INSTANCE_NAME, &defaults.instance_name),
    };

    tracing::debug!(
        disable_post = config.disable_post,
        environment = %config.environment,
        app_file = %config.app_file,
        host_name = ?config.host_name,
        deployment_action = %config.deployment_action,
        instance_name = %config.instance_name,
        message_template = %config.message_template,
        "Run parameters extracted"
    );

    config
}

/// Read the host-provided identifiers
///
/// All three must be present; otherwise every identifier falls back to
/// `"na"` and the run is treated as not launched by the host.
pub fn extract_identifiers(host_context: Option<&Map<String, Value>>) -> RunIdentifiers {
    let bag = ParamBag::new(host_context);
    let found = (
        bag.get_opt(HOST_JOB_ID),
        bag.get_opt(HOST_JOB_TEMPLATE_NAME),
        bag.get_opt(HOST_PROJECT_REVISION),
    );

    let ids = match found {
        (Some(job_id), Some(job_template_name), Some(revision)) => RunIdentifiers {
            job_id,
            job_template_name,
            revision,
            executed_from_host: true,
        },
        _ => {
            tracing::warn!(
                "Run was not launched by the orchestrating host; job identifiers are not available"
            );
            RunIdentifiers::default()
        }
    };

    tracing::debug!(
        job_id = %ids.job_id,
        job_template_name = %ids.job_template_name,
        revision = %ids.revision,
        executed_from_host = ids.executed_from_host,
        "Host identifiers extracted"
    );

    ids
}
