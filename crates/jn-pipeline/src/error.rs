//! Errors raised while planning or running a pipeline.
//!
//! A stage that exits unsuccessfully is not an error here: it is reported
//! through [`ExitOutcome`](crate::ExitOutcome). These variants cover the
//! failures that stop a pipeline before or while its processes run.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use jn_address::AddressError;
use jn_plugins::PluginError;
use thiserror::Error;

/// Errors from the planner and executor.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// A reference could not be used as an input or output.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// No suitable handler was found.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Compression handlers only decompress.
    #[error("cannot write to '{address}': compressed output is not supported")]
    CompressedOutput {
        /// The output reference.
        address: String,
    },

    /// A trailing argument is not a flag the handler can be given.
    #[error("plugin '{plugin}' does not accept argument '{argument}'")]
    InvalidArgument {
        /// The handler the argument was meant for.
        plugin: String,
        /// The rejected argument.
        argument: String,
    },

    /// The pipeline input could not be opened.
    #[error("failed to open input '{}': {source}", path.display())]
    OpenInput {
        /// The input file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The pipeline output could not be created.
    #[error("failed to create output '{}': {source}", path.display())]
    CreateOutput {
        /// The output file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// A stage process could not be started.
    #[error("failed to start stage '{stage}': {source}")]
    Spawn {
        /// The stage name.
        stage: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Waiting for a stage process failed.
    #[error("failed to wait for stage '{stage}': {source}")]
    Wait {
        /// The stage name.
        stage: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The executor was handed a pipeline without stages.
    #[error("pipeline has no stages")]
    Empty,
}
