//! Logging initialization and configuration.
//!
//! Every subscriber writes to stderr so log lines never mix with captured or
//! live command output on stdout.

use tracing::Subscriber;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor a config level is given.
pub const DEFAULT_FILTER: &str = "command_exec=info";

/// Logging setup errors.
#[derive(Debug)]
pub enum LoggingError {
    /// The level or filter directive could not be parsed.
    Filter(ParseError),
    /// A global subscriber was already installed.
    Init(tracing_subscriber::util::TryInitError),
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filter(e) => write!(f, "invalid log filter: {}", e),
            Self::Init(e) => write!(f, "failed to initialize logging: {}", e),
        }
    }
}

impl std::error::Error for LoggingError {}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Turn a bare level such as `debug` into a filter for this crate.
///
/// Full directives (`command_exec=trace,warn`) pass through unchanged.
fn filter_for(level: &str) -> Result<EnvFilter, ParseError> {
    if level.contains('=') || level.contains(',') {
        EnvFilter::try_new(level)
    } else {
        EnvFilter::try_new(format!("command_exec={}", level))
    }
}

fn subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact().with_writer(writer))
}

/// Initialize the logging system.
///
/// Uses the `RUST_LOG` environment variable for filtering. If not set,
/// defaults to `command_exec=info`.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init() {
    subscriber(env_filter(), std::io::stderr).init();
}

/// Initialize the logging system with an explicit level or filter directive.
pub fn init_with_filter(level: &str) -> Result<(), LoggingError> {
    let filter = filter_for(level).map_err(LoggingError::Filter)?;
    subscriber(filter, std::io::stderr)
        .try_init()
        .map_err(LoggingError::Init)
}

/// Try to initialize the logging system.
///
/// Returns `Ok(())` if successful, or `Err` if logging has already been
/// initialized.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    subscriber(env_filter(), std::io::stderr).try_init()
}
