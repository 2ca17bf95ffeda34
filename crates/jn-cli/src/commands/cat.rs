//! `jn cat` and `jn put`.

use std::io::{BufRead, Write};

use super::Session;
use crate::errors::AppError;

pub(super) fn cat<R: BufRead, W: Write>(
    session: &Session,
    reference: &str,
    args: &[String],
    stdin: R,
    stdout: &mut W,
) -> Result<(), AppError> {
    let address = jn_address::resolve(reference)?;
    let pipeline = session.planner().read(&address, args)?;
    session.run_pipeline(pipeline, stdin, stdout)
}

pub(super) fn put<R: BufRead, W: Write>(
    session: &Session,
    reference: &str,
    args: &[String],
    stdin: R,
    stdout: &mut W,
) -> Result<(), AppError> {
    let address = jn_address::resolve(reference)?;
    let pipeline = session.planner().write(&address, args)?;
    session.run_pipeline(pipeline, stdin, stdout)
}
