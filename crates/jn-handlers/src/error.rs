//! Handler failures and their exit codes.

use jn_config::telemetry::TelemetryError;
use jn_stream::StreamError;
use thiserror::Error;

use crate::glob::GlobError;

/// Errors that end a handler run.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Reading, decoding or writing the stream failed.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// A glob could not be expanded or one of its files read.
    #[error(transparent)]
    Glob(#[from] GlobError),

    /// The capability record could not be written.
    #[error("failed to write capabilities: {0}")]
    Capabilities(#[source] serde_json::Error),

    /// Logging could not be configured.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

impl HandlerError {
    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Telemetry(TelemetryError::Filter { .. }) => 2,
            _ => 1,
        }
    }
}
