//! Domain errors raised by plugin discovery and lookup.
//!
//! [`PluginError`] is what callers see and is fatal to a pipeline.
//! [`DiscoveryError`] describes why one candidate was excluded; discovery
//! logs it and moves on, so it never escapes a discovery pass. I/O errors
//! are wrapped in `Arc` to satisfy the `result_large_err` Clippy lint.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::manifest::PluginMode;

/// Errors arising from registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// No plugin handles the address in the requested mode.
    #[error("no plugin handles '{address}' in {mode} mode")]
    NotFound {
        /// The address as the user wrote it.
        address: String,
        /// Requested mode.
        mode: PluginMode,
    },

    /// A plugin requested by name is not installed.
    #[error("plugin '{name}' not found in registry")]
    UnknownPlugin {
        /// Name that was looked up.
        name: String,
    },

    /// A plugin exists but cannot serve the requested mode.
    #[error("plugin '{name}' does not support {mode} mode")]
    UnsupportedMode {
        /// Plugin name.
        name: String,
        /// Requested mode.
        mode: PluginMode,
    },
}

/// Why a single discovery candidate was skipped.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    /// The candidate could not be started.
    #[error("failed to run introspection: {source}")]
    Spawn {
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The candidate did not answer within the timeout.
    #[error("introspection timed out after {}ms", timeout.as_millis())]
    Timeout {
        /// Configured timeout.
        timeout: Duration,
    },

    /// The candidate exited unsuccessfully.
    #[error("introspection exited with {}", describe_code(*code))]
    NonZeroExit {
        /// Exit code, absent when killed by a signal.
        code: Option<i32>,
    },

    /// The candidate printed something other than a capability record.
    #[error("introspection output is not a capability record: {source}")]
    InvalidOutput {
        /// Underlying JSON error.
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// Reading the candidate's output or metadata failed.
    #[error("I/O error during discovery: {source}")]
    Io {
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl DiscoveryError {
    pub(crate) fn io(source: std::io::Error) -> Self {
        Self::Io {
            source: Arc::new(source),
        }
    }
}

fn describe_code(code: Option<i32>) -> String {
    code.map_or_else(|| String::from("a signal"), |status| format!("status {status}"))
}
