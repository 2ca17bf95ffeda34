//! Logging flags shared by the handler binaries.

use clap::Args;
use jn_config::telemetry::{self, TelemetryHandle};
use jn_config::{DEFAULT_LOG_FILTER, LogFormat};

use crate::error::HandlerError;

/// Log settings, read from the same `JN_*` variables as `jn` itself so a
/// pipeline's stages log alongside the orchestrator.
#[derive(Debug, Clone, Args)]
pub struct LoggingArgs {
    /// Tracing filter directive.
    #[arg(long, env = "JN_LOG_FILTER", value_name = "FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,

    /// Log output format: `compact` or `json`.
    #[arg(long, env = "JN_LOG_FORMAT", value_name = "FORMAT", default_value_t)]
    pub log_format: LogFormat,
}

impl LoggingArgs {
    /// Installs the stderr subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Telemetry`] for an invalid filter.
    pub fn initialise(&self) -> Result<TelemetryHandle, HandlerError> {
        Ok(telemetry::initialise(&self.log_filter, self.log_format)?)
    }
}
