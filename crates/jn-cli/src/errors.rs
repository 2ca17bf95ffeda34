//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use jn_address::AddressError;
use jn_config::telemetry::TelemetryError;
use jn_pipeline::{PipelineError, StageStatus};
use jn_plugins::PluginError;
use jn_stream::StreamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("stage '{stage}' {status}")]
    Stage { stage: String, status: StageStatus },
    #[error("failed to serialise plugin metadata: {0}")]
    Serialise(#[source] serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[source] Arc<io::Error>),
}

impl AppError {
    /// Process exit status for this error.
    ///
    /// A failed stage hands on its own code; everything else is 1.
    pub(crate) fn exit_code(&self) -> u8 {
        match self {
            Self::Stage { status, .. } => u8::try_from(status.code())
                .ok()
                .filter(|code| *code != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(error: io::Error) -> Self {
        Self::Output(Arc::new(error))
    }
}
