//! CLI entry point for run-notifier
//!
//! The host automation engine pipes lifecycle events into this program as
//! JSON lines. When the run completes, a summary message is posted to the
//! configured MS Teams webhook.

use clap::Parser;
use run_notifier::{
    init_logging, preview_message, process_events, resolve_config_path, load_config_from_path,
    NotifierError, NotifierSettings, NotifyOutcome, RunNotifier, RunOutcome,
};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

// Version constants from build script
const VERSION: &str = env!("CARGO_PKG_VERSION");
const COMMIT_HASH: &str = env!("GIT_COMMIT_HASH");
const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");

/// Get detailed version information
fn print_version() {
    println!("run-notifier {}", VERSION);
    println!("commit: {}", COMMIT_HASH);
    println!("built: {}", BUILD_TIMESTAMP);
}

/// Run outcome used when previewing a template
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum StatusArg {
    Successful,
    Failed,
}

impl From<StatusArg> for RunOutcome {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Successful => RunOutcome::Successful,
            StatusArg::Failed => RunOutcome::Failed,
        }
    }
}

/// Command-line arguments for run-notifier
#[derive(Parser, Debug)]
#[command(
    name = "run-notifier",
    about = "Posts an automation run summary to an MS Teams channel webhook",
    version = VERSION,
    long_about = "Receives automation-run lifecycle events as JSON lines and posts one summary
message to an MS Teams webhook when the run completes.

Subcommands:
  run     - Read lifecycle events and notify (default)
  render  - Render a message template with sample values and print the JSON

Event format for 'run' (one JSON object per line):
  {\"event\": \"run_start\", \"name\": \"site.yml\"}
  {\"event\": \"phase_start\", \"extra_vars\": {...}, \"host_context\": {...}}
  {\"event\": \"run_complete\", \"stats\": {\"web1\": {\"ok\": 3, \"failures\": 0, \"unreachable\": 0}}}

Exit status is 1 when the message template cannot be read or rendered, or
renders to invalid JSON. Delivery failures are logged and exit with 0.
"
)]
struct Cli {
    /// Settings file (default: ~/.run-notifier.json)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Show progress messages
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands
#[derive(Parser, Debug)]
enum Commands {
    /// Read lifecycle events and notify (default command)
    Run(RunArgs),

    /// Render a message template with sample values
    Render(RenderArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Default)]
struct RunArgs {
    /// Read events from a file instead of stdin
    #[arg(long)]
    events: Option<PathBuf>,
}

/// Arguments for the render command
#[derive(Parser, Debug)]
struct RenderArgs {
    /// Template to render (default: configured default template)
    #[arg(short, long)]
    template: Option<String>,

    /// Run outcome to render
    #[arg(long, value_enum, default_value = "successful")]
    status: StatusArg,

    /// Target names to list (can be specified multiple times)
    #[arg(long = "host")]
    hosts: Vec<String>,
}

fn main() -> ExitCode {
    // Check for --version or -V flag before parsing
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && (args[1] == "--version" || args[1] == "-V") {
        print_version();
        return ExitCode::SUCCESS;
    }

    let cli = Cli::parse();

    let settings = match load_config_from_path(&resolve_config_path(cli.config.as_deref())) {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(cli.verbose);
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(cli.verbose || settings.verbose);

    let result = match cli.command {
        Some(Commands::Run(run_args)) => run_command(run_args, settings),
        Some(Commands::Render(render_args)) => render_command(render_args, settings),
        None => run_command(RunArgs::default(), settings),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}. Exiting...", e);
            ExitCode::FAILURE
        }
    }
}

/// Handle the run command - drive the notifier from lifecycle events
fn run_command(args: RunArgs, settings: NotifierSettings) -> Result<(), NotifierError> {
    let mut notifier = RunNotifier::new(settings)?;

    let outcome = match args.events {
        Some(path) => process_events(&mut notifier, BufReader::new(File::open(path)?))?,
        None => process_events(&mut notifier, io::stdin().lock())?,
    };

    match outcome {
        Some(NotifyOutcome::Delivered { url }) => {
            tracing::debug!(url = %url, "Notification sent")
        }
        Some(NotifyOutcome::DeliveryFailed { .. }) => {
            tracing::debug!("Notification was not delivered; run result is unaffected")
        }
        Some(NotifyOutcome::Disabled) | Some(NotifyOutcome::AlreadyNotified) | None => {}
    }

    Ok(())
}

/// Handle the render command - print the validated payload
fn render_command(args: RenderArgs, settings: NotifierSettings) -> Result<(), NotifierError> {
    let payload = preview_message(
        &settings,
        args.template.as_deref(),
        args.status.into(),
        args.hosts,
    )?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
