//! `jn run` and `jn filter`.

use std::io::{BufRead, Write};

use jn_pipeline::{Pipeline, Sink, Source};

use super::Session;
use crate::errors::AppError;

pub(super) fn run<R: BufRead, W: Write>(
    session: &Session,
    input_reference: &str,
    output_reference: &str,
    filters: &[String],
    stdin: R,
    stdout: &mut W,
) -> Result<(), AppError> {
    let input = jn_address::resolve(input_reference)?;
    let output = jn_address::resolve(output_reference)?;
    let pipeline = session.planner().run(&input, filters, &output)?;
    session.run_pipeline(pipeline, stdin, stdout)
}

pub(super) fn filter<R: BufRead, W: Write>(
    session: &Session,
    expression: &str,
    stdin: R,
    stdout: &mut W,
) -> Result<(), AppError> {
    let stage = session.planner().filter(expression)?;
    let pipeline = Pipeline::new(Source::Inherit, vec![stage], Sink::Inherit);
    session.run_pipeline(pipeline, stdin, stdout)
}
