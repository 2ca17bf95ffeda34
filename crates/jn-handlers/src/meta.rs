//! The `--jn-meta` capability record.

use std::io::Write;

use serde::Serialize;

use crate::error::HandlerError;

/// Capabilities a handler declares in answer to `--jn-meta`.
#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    /// Handler name without the trailing `_`.
    pub name: &'static str,
    /// Handler version.
    pub version: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Address patterns the handler claims.
    pub matches: &'static [&'static str],
    /// Pipeline role.
    pub role: &'static str,
    /// Supported modes.
    pub modes: &'static [&'static str],
    /// Whether bytes can pass through unparsed.
    pub supports_raw: bool,
    /// Whether the handler parses its own trailing arguments.
    pub manages_parameters: bool,
    /// Whether the handler can inspect containers.
    pub supports_container: bool,
    /// How containers are addressed, if supported.
    pub container_mode: Option<&'static str>,
}

/// Writes `capabilities` as one JSON line.
///
/// # Errors
///
/// Returns [`HandlerError::Capabilities`] when the record cannot be
/// written.
pub fn print_capabilities(
    capabilities: &Capabilities,
    mut out: impl Write,
) -> Result<(), HandlerError> {
    serde_json::to_writer(&mut out, capabilities).map_err(HandlerError::Capabilities)?;
    out.write_all(b"\n")
        .and_then(|()| out.flush())
        .map_err(|error| HandlerError::Capabilities(serde_json::Error::io(error)))
}
