//! Logging setup shared by `jn` and the bundled handlers.
//!
//! Records travel on standard output, so events are written to standard
//! error. Only the first [`initialise`] call in a process installs anything.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

use crate::LogFormat;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Marker returned once the global subscriber is in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Why logging could not be set up.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The filter directive does not parse.
    #[error("invalid log filter '{directive}': {reason}")]
    Filter {
        /// Directive as configured.
        directive: String,
        /// Parser message.
        reason: String,
    },
    /// Something else already owns the global subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[source] TryInitError),
}

/// Installs the stderr subscriber for `directive` in `format`.
///
/// Later calls return a handle without reconfiguring, so a handler and the
/// library code it calls may both ask for logging.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for a bad directive and
/// [`TelemetryError::Subscriber`] when another subscriber got there first.
///
/// # Examples
///
/// ```rust
/// use jn_config::{LogFormat, telemetry};
///
/// # fn main() -> Result<(), telemetry::TelemetryError> {
/// telemetry::initialise("jn_plugins=debug", LogFormat::Compact)?;
/// // Already installed: the new settings are ignored.
/// telemetry::initialise("trace", LogFormat::Json)?;
/// # Ok(())
/// # }
/// ```
pub fn initialise(directive: &str, format: LogFormat) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| install(directive, format))
        .map(|()| TelemetryHandle)
}

fn install(directive: &str, format: LogFormat) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(directive).map_err(|error| TelemetryError::Filter {
        directive: directive.to_owned(),
        reason: error.to_string(),
    })?;
    let events = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Compact => registry.with(events.compact()).try_init(),
        LogFormat::Json => registry.with(events.json().flatten_event(true)).try_init(),
    }
    .map_err(TelemetryError::Subscriber)
}
