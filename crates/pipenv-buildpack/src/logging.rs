//! Diagnostic tracing for the buildpack binary.
//!
//! The user-facing build log goes through [`crate::printer::Printer`]; this
//! subscriber only carries `tracing` events (subprocess launches, dependency
//! selection) to stderr. `RUST_LOG` takes precedence over `BP_LOG_LEVEL`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogLevel;

/// Install the global tracing subscriber.
///
/// Calling this more than once is a no-op.
pub fn setup_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}

fn default_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "pipenv_buildpack=debug",
        LogLevel::Info => "warn",
    }
}
