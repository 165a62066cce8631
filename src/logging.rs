//! Logging setup
//!
//! The one-line notice naming the message being sent is logged at info
//! level and always printed, like warnings and errors. Progress details are
//! emitted at debug level and only show up in verbose mode.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is not set
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "run_notifier=debug"
    } else {
        "run_notifier=info"
    }
}

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the verbose flag. Calling this more than
/// once is harmless; later calls keep the first subscriber.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
