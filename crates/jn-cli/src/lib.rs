//! Runtime for the `jn` command-line tool.
//!
//! [`run`] splits the leading configuration flags from the subcommand,
//! loads the layered configuration, installs logging, discovers plugins and
//! dispatches to a command. Standard streams are passed in so tests can
//! drive the runtime in-process; pipeline stages always inherit the
//! process's real descriptors.
//!
//! Exit status is 0 on success, the failing stage's code when a handler
//! fails, 2 for usage errors and 1 for everything else.

mod cli;
mod commands;
mod config;
mod errors;

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use jn_config::{Config, telemetry};
use tracing::debug;

use crate::cli::Cli;
use crate::commands::Session;
use crate::config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use crate::errors::AppError;

const CLI_TARGET: &str = "jn_cli";

/// Runs `jn` with `args`, reading stdin-bound data from `stdin` and writing
/// in-process output to `stdout`.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdin, stdout, stderr, &OrthoConfigLoader)
}

fn run_with_loader<I, R, W, E, L>(
    args: I,
    stdin: R,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let split = split_config_arguments(args.into_iter().collect());
    let cli = match Cli::try_parse_from(split.command_arguments) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, stdout, stderr),
    };
    let outcome = loader
        .load(split.config_arguments)
        .and_then(|config| execute(config, cli, stdin, stdout));
    if let Err(error) = outcome {
        writeln!(stderr, "jn: {error}").ok();
        return ExitCode::from(error.exit_code());
    }
    ExitCode::SUCCESS
}

fn execute<R: BufRead, W: Write>(
    config: Config,
    cli: Cli,
    stdin: R,
    stdout: &mut W,
) -> Result<(), AppError> {
    telemetry::initialise(config.log_filter(), config.log_format())?;
    debug!(
        target: CLI_TARGET,
        home = %config.home().display(),
        project = %config.project_dir().display(),
        "configuration loaded"
    );
    Session::open(config).dispatch(cli.command, stdin, stdout)
}

/// Prints a parse failure, or help and version output, where clap would.
fn report_usage<W: Write, E: Write>(error: &clap::Error, stdout: &mut W, stderr: &mut E) -> ExitCode {
    let rendered = error.render();
    if error.use_stderr() {
        write!(stderr, "{rendered}").ok();
    } else {
        write!(stdout, "{rendered}").ok();
    }
    u8::try_from(error.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from)
}

#[cfg(test)]
mod tests;
