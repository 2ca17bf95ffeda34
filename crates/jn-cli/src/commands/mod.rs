//! Command implementations.
//!
//! Every command resolves its addresses, asks the [`Planner`] for a
//! pipeline and hands it to [`Session::run_pipeline`], which either copies
//! a passthrough in-process or spawns the stages.

mod cat;
pub(crate) mod head;
mod plugin;
mod run;
mod tail;

use std::io::{BufRead, Write};

use jn_config::Config;
use jn_pipeline::{ExitOutcome, Executor, Pipeline, Planner};
use jn_plugins::PluginRegistry;
use jn_stream::{LineReader, LineWriter, copy_lines};
use tracing::{debug, info};

use crate::cli::Command;
use crate::errors::AppError;

const COMMAND_TARGET: &str = "jn_cli::commands";

/// Everything a command needs: configuration, discovered plugins and an
/// executor carrying the stage environment.
pub(crate) struct Session {
    registry: PluginRegistry,
    executor: Executor,
}

impl Session {
    pub(crate) fn open(config: Config) -> Self {
        let registry = PluginRegistry::load(&config);
        debug!(target: COMMAND_TARGET, plugins = registry.len(), "plugins discovered");
        Self {
            executor: Executor::from_config(&config),
            registry,
        }
    }

    pub(crate) fn dispatch<R: BufRead, W: Write>(
        &self,
        command: Command,
        stdin: R,
        stdout: &mut W,
    ) -> Result<(), AppError> {
        match command {
            Command::Cat { address, args } => cat::cat(self, &address, &args, stdin, stdout),
            Command::Put { address, args } => cat::put(self, &address, &args, stdin, stdout),
            Command::Run {
                input,
                output,
                filters,
            } => run::run(self, &input, &output, &filters, stdin, stdout),
            Command::Filter { expression } => run::filter(self, &expression, stdin, stdout),
            Command::Head { lines, address } => {
                head::head(self, address.as_deref(), lines, stdin, stdout)
            }
            Command::Tail { lines, address } => {
                tail::tail(self, address.as_deref(), lines, stdin, stdout)
            }
            Command::Plugin { action } => plugin::plugin(self, &action, stdin, stdout),
        }
    }

    pub(crate) const fn planner(&self) -> Planner<'_> {
        Planner::new(&self.registry)
    }

    pub(crate) const fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub(crate) const fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Runs `pipeline` to completion.
    ///
    /// A passthrough copies `stdin` to `stdout` without spawning anything.
    pub(crate) fn run_pipeline<R: BufRead, W: Write>(
        &self,
        pipeline: Pipeline,
        stdin: R,
        stdout: &mut W,
    ) -> Result<(), AppError> {
        if pipeline.is_passthrough() {
            debug!(target: COMMAND_TARGET, "passthrough, copying in-process");
            let summary = copy_lines(
                &mut LineReader::new(stdin),
                &mut LineWriter::new(stdout),
                None,
            )?;
            debug!(target: COMMAND_TARGET, lines = summary.lines, "passthrough finished");
            return Ok(());
        }
        info!(target: COMMAND_TARGET, %pipeline, "running pipeline");
        let outcome = self.executor.execute(pipeline)?;
        check_outcome(&outcome)
    }
}

/// Turns a failed stage into the command's error.
pub(crate) fn check_outcome(outcome: &ExitOutcome) -> Result<(), AppError> {
    if let Some(report) = outcome.failure() {
        return Err(AppError::Stage {
            stage: report.name().to_owned(),
            status: report.status(),
        });
    }
    Ok(())
}
