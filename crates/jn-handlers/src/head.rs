//! The `head_` filter.

use std::io::{BufRead, Write};

use jn_stream::{Flow, LineReader, LineWriter, copy_lines};
use tracing::debug;

use crate::error::HandlerError;
use crate::meta::Capabilities;

const HEAD_TARGET: &str = "jn_handlers::head";

/// Lines kept when `--lines` is not given.
pub const DEFAULT_LINES: u64 = 10;

/// Capabilities reported by `head_ --jn-meta`.
pub const CAPABILITIES: Capabilities = Capabilities {
    name: "head",
    version: env!("CARGO_PKG_VERSION"),
    description: "Keep the first N records",
    matches: &[],
    role: "filter",
    modes: &[],
    supports_raw: false,
    manages_parameters: false,
    supports_container: false,
    container_mode: None,
};

/// Copies the first `lines` lines of `input` to `output`.
///
/// Input beyond the limit is never read, so the producer sees a closed pipe
/// once this stage exits.
///
/// # Errors
///
/// Returns [`HandlerError::Stream`] when reading or writing fails.
pub fn run<R: BufRead, W: Write>(input: R, output: W, lines: u64) -> Result<Flow, HandlerError> {
    let mut reader = LineReader::new(input);
    let mut writer = LineWriter::new(output);
    let summary = copy_lines(&mut reader, &mut writer, Some(lines))?;
    debug!(target: HEAD_TARGET, lines = summary.lines, limit = lines, "copy finished");
    Ok(summary.flow)
}
