//! Run-outcome notifier
//!
//! `RunNotifier` owns the state of one run. The host adapter feeds it the
//! three lifecycle signals; at run completion it aggregates the outcome,
//! renders the message template, validates the payload and posts it once.

use chrono::{DateTime, FixedOffset};
use serde_json::{json, Map, Value};
use std::path::PathBuf;

use crate::channels::{MsTeamsChannel, NotificationChannel};
use crate::config::{
    extract_config, extract_identifiers, NotificationConfig, NotifierSettings, RunIdentifiers,
    RunTimezone, TemplateContext, TemplateEngine, NOT_AVAILABLE,
};
use crate::context::RunContext;
use crate::error::Result;
use crate::hooks::{LifecycleEvent, PhaseDescriptor, RunDescriptor, RunStats};
use crate::outcome::RunOutcome;
use crate::payload::parse_payload;
use crate::router::ChannelRouter;

/// Path fragment between the web base URL and the job id
const JOB_URL_PATH: &str = "/#/jobs/playbook/";

/// Parameters extracted once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParameters {
    pub config: NotificationConfig,
    pub identifiers: RunIdentifiers,
}

impl RunParameters {
    /// Parameters of a run that supplied nothing
    pub fn defaults(settings: &NotifierSettings) -> Self {
        Self {
            config: NotificationConfig::defaults(settings),
            identifiers: RunIdentifiers::default(),
        }
    }

    pub fn extract(
        extra_vars: Option<&Map<String, Value>>,
        host_context: Option<&Map<String, Value>>,
        settings: &NotifierSettings,
    ) -> Self {
        Self {
            identifiers: extract_identifiers(host_context),
            config: extract_config(extra_vars, settings),
        }
    }
}

/// What happened to the run notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Posting was disabled by the run parameters
    Disabled,
    /// The run already produced its notification attempt
    AlreadyNotified,
    /// The webhook accepted the message
    Delivered { url: String },
    /// Delivery failed; the failure was logged and absorbed
    DeliveryFailed { url: String, reason: String },
}

/// Lifecycle listener accumulating one run and posting its summary
pub struct RunNotifier<C = MsTeamsChannel> {
    settings: NotifierSettings,
    timezone: RunTimezone,
    channel: C,
    context: RunContext,
    params: RunParameters,
}

impl RunNotifier<MsTeamsChannel> {
    /// Create a notifier posting to MS Teams
    pub fn new(settings: NotifierSettings) -> Result<Self> {
        let channel = MsTeamsChannel::new(&settings)?;
        Self::with_channel(settings, channel)
    }
}

impl<C: NotificationChannel> RunNotifier<C> {
    /// Create a notifier delivering through a specific channel
    pub fn with_channel(settings: NotifierSettings, channel: C) -> Result<Self> {
        let timezone = settings.run_timezone()?;
        let started_at = timezone.now();
        let params = RunParameters::defaults(&settings);

        Ok(Self {
            settings,
            timezone,
            channel,
            context: RunContext::new(started_at),
            params,
        })
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Extracted run parameters, once a phase has started
    pub fn parameters(&self) -> Option<&RunParameters> {
        self.context.params_retrieved.then_some(&self.params)
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Dispatch a lifecycle event to the matching hook
    ///
    /// Returns the notification result for run-complete events.
    pub fn handle_event(&mut self, event: &LifecycleEvent) -> Result<Option<NotifyOutcome>> {
        tracing::debug!(event = event.name(), "Lifecycle event received");
        match event {
            LifecycleEvent::RunStart(run) => {
                self.on_run_start(run);
                Ok(None)
            }
            LifecycleEvent::PhaseStart(phase) => {
                self.on_phase_start(phase);
                Ok(None)
            }
            LifecycleEvent::RunComplete(stats) => self.on_run_complete(stats).map(Some),
        }
    }

    pub fn on_run_start(&mut self, run: &RunDescriptor) {
        let started_at = self.localize(run.timestamp);
        tracing::debug!(run = ?run.name, started_at = %started_at, "Run starting");
        self.context.start(run.name.clone(), started_at);
    }

    pub fn on_phase_start(&mut self, phase: &PhaseDescriptor) {
        tracing::debug!(phase = ?phase.name, "Phase starting");
        self.retrieve_parameters(phase.extra_vars.as_ref(), phase.host_context.as_ref());
    }

    /// Aggregate the run and post its notification
    ///
    /// Only template and payload errors are returned; delivery failures are
    /// logged and reported as [`NotifyOutcome::DeliveryFailed`].
    pub fn on_run_complete(&mut self, stats: &RunStats) -> Result<NotifyOutcome> {
        self.retrieve_parameters(None, None);

        if self.context.notified {
            tracing::warn!("Run already notified; ignoring repeated completion signal");
            return Ok(NotifyOutcome::AlreadyNotified);
        }
        self.context.notified = true;

        let finished_at = self.localize(stats.timestamp);
        self.context.complete(&stats.stats, finished_at);
        tracing::debug!(
            outcome = %self.context.outcome,
            hosts = ?self.context.hosts,
            elapsed_seconds = self.context.elapsed_seconds,
            "Run complete"
        );

        if self.params.config.disable_post {
            tracing::debug!("Posting to MS Teams has been disabled");
            return Ok(NotifyOutcome::Disabled);
        }

        let payload = render_message(&self.context, &self.params, &self.settings)?;
        let url = ChannelRouter::new(&self.params.config)
            .match_channel(self.context.outcome)
            .to_string();

        Ok(self.dispatch(url, &payload))
    }

    /// Extract run parameters the first time this is called
    fn retrieve_parameters(
        &mut self,
        extra_vars: Option<&Map<String, Value>>,
        host_context: Option<&Map<String, Value>>,
    ) {
        if self.context.params_retrieved {
            return;
        }
        self.context.params_retrieved = true;
        self.params = RunParameters::extract(extra_vars, host_context, &self.settings);
    }

    fn dispatch(&self, url: String, payload: &Value) -> NotifyOutcome {
        match self.context.outcome {
            RunOutcome::Successful => tracing::info!("Sending success message to MS Teams channel"),
            RunOutcome::Failed => tracing::info!("Sending failure message to MS Teams channel"),
        }
        tracing::debug!(url = %url, channel = self.channel.channel_type(), "Dispatching notification");

        // block_on panics inside a runtime, so an async host gets its own thread
        if tokio::runtime::Handle::try_current().is_ok() {
            let channel = &self.channel;
            let joined = std::thread::scope(|scope| {
                scope
                    .spawn(|| deliver(channel, &url, payload))
                    .join()
            });
            return joined.unwrap_or_else(|_| {
                tracing::warn!(url = %url, "Notification delivery thread panicked");
                NotifyOutcome::DeliveryFailed {
                    url,
                    reason: "delivery thread panicked".to_string(),
                }
            });
        }

        deliver(&self.channel, &url, payload)
    }

    /// Express a host timestamp (or now) in the configured timezone
    fn localize(&self, timestamp: Option<DateTime<FixedOffset>>) -> DateTime<FixedOffset> {
        match timestamp {
            Some(timestamp) => self.timezone.localize(&timestamp),
            None => self.timezone.now(),
        }
    }
}

/// Post one payload on a fresh current-thread runtime
fn deliver<C: NotificationChannel>(channel: &C, url: &str, payload: &Value) -> NotifyOutcome {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::warn!(error = %e, "Could not start runtime for notification delivery");
            return NotifyOutcome::DeliveryFailed {
                url: url.to_string(),
                reason: e.to_string(),
            };
        }
    };

    match runtime.block_on(channel.send(url, payload)) {
        Ok(()) => {
            tracing::debug!(url = %url, "Notification delivered");
            NotifyOutcome::Delivered {
                url: url.to_string(),
            }
        }
        Err(e) => {
            tracing::warn!(
                url = %url,
                error = %e,
                "Exception occurred while sending notification to {}",
                channel.display_name()
            );
            NotifyOutcome::DeliveryFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// Named values handed to the message template
pub fn build_context(
    context: &RunContext,
    params: &RunParameters,
    settings: &NotifierSettings,
) -> TemplateContext {
    let config = &params.config;
    let ids = &params.identifiers;
    let web_url = format!(
        "{}{}{}",
        settings.web_base_url.trim_end_matches('/'),
        JOB_URL_PATH,
        ids.job_id
    );

    let values = [
        ("v_ansible_job_status", json!(context.outcome.as_str())),
        ("v_ansible_job_id", json!(ids.job_id)),
        ("v_ansible_scm_revision", json!(ids.revision)),
        ("v_ansible_job_name", json!(ids.job_template_name)),
        ("v_ansible_job_started", json!(context.started_display())),
        ("v_ansible_job_finished", json!(context.finished_display())),
        ("v_ansible_job_elapsed_time", json!(context.elapsed_seconds)),
        ("v_ansible_host_list", json!(context.hosts)),
        ("v_ansible_web_url", json!(web_url)),
        ("v_ansible_app_file", json!(config.app_file)),
        ("v_ansible_deployment_action", json!(config.deployment_action)),
        ("v_ansible_environment", json!(config.environment)),
        ("v_ansible_instance_name", json!(config.instance_name)),
        ("v_ansible_executed_from_tower", json!(ids.executed_from_host)),
        (
            "v_ansible_playbook_name",
            json!(context.run_name.as_deref().unwrap_or(NOT_AVAILABLE)),
        ),
        (
            "v_ansible_host_name",
            json!(config.host_name.as_deref().unwrap_or_default()),
        ),
    ];

    values
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Render the configured template and validate the result as JSON
pub fn render_message(
    context: &RunContext,
    params: &RunParameters,
    settings: &NotifierSettings,
) -> Result<Value> {
    let template_path = PathBuf::from(shellexpand::tilde(&params.config.message_template).into_owned());
    tracing::debug!(template = %template_path.display(), "Rendering message template");

    let engine = TemplateEngine::load(&template_path)?;
    let rendered = engine.render(&build_context(context, params, settings))?;
    parse_payload(&rendered)
}

/// Render a template with sample values, without sending anything
pub fn preview_message(
    settings: &NotifierSettings,
    template: Option<&str>,
    outcome: RunOutcome,
    hosts: Vec<String>,
) -> Result<Value> {
    let now = settings.run_timezone()?.now();
    let mut context = RunContext::new(now);
    context.run_name = Some("preview".to_string());
    context.outcome = outcome;
    context.hosts = hosts;
    context.finished_at = Some(now);

    let mut params = RunParameters::defaults(settings);
    if let Some(template) = template {
        params.config.message_template = template.to_string();
    }

    render_message(&context, &params, settings)
}
