//! Runs a pipeline as a chain of OS processes.
//!
//! Stage *i*'s stdout is piped into stage *i + 1*'s stdin. The parent holds
//! no copy of any inter-stage pipe once the reading stage has been spawned:
//! the `Command` that received the pipe end is dropped straight after
//! `spawn`. When a downstream stage exits, its upstream's next write then
//! fails with `EPIPE` (or `SIGPIPE`) and the upstream stops too.
//!
//! Stages are reaped in reverse order, sink first, and classified with
//! [`StageStatus`]. The executor runs no threads of its own.

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::Arc;

use jn_config::Config;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::outcome::{ExitOutcome, StageReport, StageStatus};
use crate::stage::{Pipeline, PipelineStage, Sink, Source};

const EXECUTOR_TARGET: &str = "jn_pipeline::executor";

/// Spawns and reaps pipeline stages.
///
/// # Example
///
/// ```rust,no_run
/// use jn_pipeline::{Executor, Pipeline, PipelineStage, Sink, Source, StageMode};
///
/// let pipeline = Pipeline::new(
///     Source::Inherit,
///     vec![PipelineStage::new("head", "/usr/bin/head", StageMode::Filter).arg("-n5")],
///     Sink::Inherit,
/// );
/// let outcome = Executor::new().execute(pipeline)?;
/// std::process::exit(outcome.exit_code());
/// # Ok::<(), jn_pipeline::PipelineError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Executor {
    environment: Vec<(OsString, OsString)>,
}

impl Executor {
    /// Creates an executor that passes its own environment through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor that exports `config`'s stage environment.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        config
            .stage_environment()
            .into_iter()
            .fold(Self::new(), |executor, (key, value)| executor.env(key, value))
    }

    /// Sets a variable in every stage's environment.
    #[must_use]
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.environment
            .push((key.as_ref().to_owned(), value.as_ref().to_owned()));
        self
    }

    /// Runs `pipeline` to completion.
    ///
    /// # Errors
    ///
    /// See [`Executor::spawn`] and [`RunningPipeline::wait`]. A stage that
    /// exits unsuccessfully is reported in the [`ExitOutcome`], not here.
    pub fn execute(&self, pipeline: Pipeline) -> Result<ExitOutcome, PipelineError> {
        self.spawn(pipeline)?.wait()
    }

    /// Starts every stage of `pipeline`.
    ///
    /// With [`Sink::Capture`] the last stage's stdout is kept for the caller;
    /// see [`RunningPipeline::take_output`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Empty`] for a passthrough pipeline,
    /// [`PipelineError::OpenInput`] or [`PipelineError::CreateOutput`] when
    /// a file endpoint cannot be opened, and [`PipelineError::Spawn`] when a
    /// stage cannot be started. Stages already running are killed and
    /// reaped before a spawn error is returned.
    pub fn spawn(&self, pipeline: Pipeline) -> Result<RunningPipeline, PipelineError> {
        let (source, stages, sink) = pipeline.into_parts();
        if stages.is_empty() {
            return Err(PipelineError::Empty);
        }
        let mut upstream = Some(open_source(&source)?);
        let mut downstream = Some(open_sink(&sink)?);
        let capture = matches!(sink, Sink::Capture);

        let last = stages.len() - 1;
        let mut children: Vec<(String, Child)> = Vec::with_capacity(stages.len());
        let mut output = None;
        for (index, stage) in stages.iter().enumerate() {
            let stdin = upstream.take().unwrap_or_else(Stdio::null);
            let stdout = if index == last {
                downstream.take().unwrap_or_else(Stdio::piped)
            } else {
                Stdio::piped()
            };

            let mut child = match self.spawn_stage(stage, stdin, stdout) {
                Ok(child) => child,
                Err(error) => {
                    abort(children);
                    return Err(PipelineError::Spawn {
                        stage: stage.name().to_owned(),
                        source: Arc::new(error),
                    });
                }
            };

            let stage_stdout = child.stdout.take();
            if index < last {
                upstream = stage_stdout.map(Stdio::from);
            } else if capture {
                output = stage_stdout;
            }
            children.push((stage.name().to_owned(), child));
        }

        Ok(RunningPipeline { children, output })
    }

    /// Spawns one stage. The `Command`, and with it the parent's handle on
    /// the stage's stdin, is dropped on return.
    fn spawn_stage(
        &self,
        stage: &PipelineStage,
        stdin: Stdio,
        stdout: Stdio,
    ) -> std::io::Result<Child> {
        let mut command = Command::new(stage.program());
        command
            .args(stage.arguments())
            .envs(self.environment.iter().map(|(key, value)| (key, value)))
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::inherit());
        debug!(
            target: EXECUTOR_TARGET,
            stage = stage.name(),
            program = %stage.program().display(),
            args = ?stage.arguments(),
            "spawning stage"
        );
        command.spawn()
    }
}

/// A pipeline whose stages are running.
#[derive(Debug)]
pub struct RunningPipeline {
    children: Vec<(String, Child)>,
    output: Option<ChildStdout>,
}

impl RunningPipeline {
    /// Takes the last stage's stdout when the sink is [`Sink::Capture`].
    ///
    /// Dropping the returned pipe before the stages finish closes the
    /// pipeline early.
    pub const fn take_output(&mut self) -> Option<ChildStdout> {
        self.output.take()
    }

    /// Waits for every stage, sink first.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Wait`] when a stage cannot be reaped. The
    /// remaining stages are killed and reaped first.
    pub fn wait(mut self) -> Result<ExitOutcome, PipelineError> {
        drop(self.output.take());
        let mut reports = Vec::with_capacity(self.children.len());
        while let Some((name, mut child)) = self.children.pop() {
            match child.wait() {
                Ok(exit) => {
                    let status = StageStatus::from_exit_status(exit);
                    if status.is_success() {
                        debug!(target: EXECUTOR_TARGET, stage = %name, %status, "stage finished");
                    } else {
                        warn!(target: EXECUTOR_TARGET, stage = %name, %status, "stage failed");
                    }
                    reports.push(StageReport::new(name, status));
                }
                Err(source) => {
                    abort(std::mem::take(&mut self.children));
                    return Err(PipelineError::Wait {
                        stage: name,
                        source: Arc::new(source),
                    });
                }
            }
        }
        reports.reverse();
        Ok(ExitOutcome::new(reports))
    }
}

fn open_source(source: &Source) -> Result<Stdio, PipelineError> {
    match source {
        Source::Inherit => Ok(Stdio::inherit()),
        Source::Null => Ok(Stdio::null()),
        Source::File(path) => File::open(path)
            .map(Stdio::from)
            .map_err(|error| PipelineError::OpenInput {
                path: path.clone(),
                source: Arc::new(error),
            }),
    }
}

fn open_sink(sink: &Sink) -> Result<Stdio, PipelineError> {
    match sink {
        Sink::Inherit => Ok(Stdio::inherit()),
        Sink::Capture => Ok(Stdio::piped()),
        Sink::File(path) => File::create(path)
            .map(Stdio::from)
            .map_err(|source| PipelineError::CreateOutput {
                path: path.clone(),
                source: Arc::new(source),
            }),
    }
}

/// Kills and reaps stages that are no longer wanted.
fn abort(children: Vec<(String, Child)>) {
    for (name, mut child) in children.into_iter().rev() {
        debug!(target: EXECUTOR_TARGET, stage = %name, "killing stage");
        drop(child.kill());
        drop(child.wait());
    }
}
