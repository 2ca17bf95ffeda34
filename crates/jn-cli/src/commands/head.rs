//! `jn head`: keeps the first records in-process.
//!
//! With an address, the read pipeline's output is captured and the command
//! stops reading after `lines` records. Dropping the captured pipe then
//! closes the last stage's output, and the closure travels upstream.

use std::io::{BufRead, BufReader, Write};

use jn_pipeline::{Pipeline, Sink};
use jn_stream::{LineReader, LineWriter, copy_lines};
use tracing::debug;

use super::{Session, check_outcome};
use crate::errors::AppError;

const HEAD_TARGET: &str = "jn_cli::commands::head";

/// Records kept when `-n` is not given.
pub(crate) const DEFAULT_LINES: u64 = 10;

pub(super) fn head<R: BufRead, W: Write>(
    session: &Session,
    address: Option<&str>,
    lines: u64,
    stdin: R,
    stdout: &mut W,
) -> Result<(), AppError> {
    let pipeline = match address {
        Some(reference) => session
            .planner()
            .read(&jn_address::resolve(reference)?, &[])?,
        None => Pipeline::default(),
    };
    if pipeline.is_passthrough() {
        copy_head(stdin, stdout, lines)?;
        return Ok(());
    }

    let mut running = session.executor().spawn(pipeline.with_sink(Sink::Capture))?;
    let copied = running
        .take_output()
        .map_or(Ok(()), |output| copy_head(BufReader::new(output), stdout, lines));
    let outcome = running.wait()?;
    copied?;
    check_outcome(&outcome)
}

fn copy_head<R: BufRead, W: Write>(
    input: R,
    output: W,
    lines: u64,
) -> Result<(), AppError> {
    let summary = copy_lines(
        &mut LineReader::new(input),
        &mut LineWriter::new(output),
        Some(lines),
    )?;
    debug!(target: HEAD_TARGET, copied = summary.lines, limit = lines, "head finished");
    Ok(())
}
