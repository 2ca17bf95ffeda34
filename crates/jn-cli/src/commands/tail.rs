//! `jn tail`: keeps the last records in-process.
//!
//! Unlike `head`, the whole input has to be read. Only a window of `lines`
//! records is held in memory while it streams past.

use std::io::{BufRead, BufReader, Write};

use jn_pipeline::{Pipeline, Sink};
use jn_stream::{LineReader, LineWriter, copy_last_lines};
use tracing::debug;

use super::{Session, check_outcome};
use crate::errors::AppError;

const TAIL_TARGET: &str = "jn_cli::commands::tail";

pub(super) fn tail<R: BufRead, W: Write>(
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
        return copy_tail(stdin, stdout, lines);
    }

    let mut running = session.executor().spawn(pipeline.with_sink(Sink::Capture))?;
    let copied = running
        .take_output()
        .map_or(Ok(()), |output| copy_tail(BufReader::new(output), stdout, lines));
    let outcome = running.wait()?;
    copied?;
    check_outcome(&outcome)
}

fn copy_tail<R: BufRead, W: Write>(input: R, output: W, lines: u64) -> Result<(), AppError> {
    let summary = copy_last_lines(
        &mut LineReader::new(input),
        &mut LineWriter::new(output),
        lines,
    )?;
    debug!(target: TAIL_TARGET, copied = summary.lines, window = lines, "tail finished");
    Ok(())
}
