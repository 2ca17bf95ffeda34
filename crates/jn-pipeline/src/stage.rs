//! Pipeline and stage descriptions.
//!
//! A [`Pipeline`] is inert data: where the first stage reads from, the
//! ordered stages, and where the last stage writes to. Adjacent stages are
//! always joined by a pipe; the [`Executor`](crate::Executor) creates the
//! processes.

use std::fmt;
use std::path::{Path, PathBuf};

use jn_plugins::{PluginMetadata, PluginMode};

/// How a stage is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageMode {
    /// Source bytes in, NDJSON out.
    Read,
    /// NDJSON in, destination bytes out.
    Write,
    /// Bytes in, bytes out.
    Raw,
    /// NDJSON in, NDJSON out. Filters receive no `--mode` flag.
    Filter,
}

impl StageMode {
    /// Returns the `--mode=<m>` flag for this mode, if it has one.
    #[must_use]
    pub fn flag(self) -> Option<String> {
        self.plugin_mode().map(|mode| format!("--mode={mode}"))
    }

    /// The capability a plugin must declare to run in this mode.
    #[must_use]
    pub const fn plugin_mode(self) -> Option<PluginMode> {
        match self {
            Self::Read => Some(PluginMode::Read),
            Self::Write => Some(PluginMode::Write),
            Self::Raw => Some(PluginMode::Raw),
            Self::Filter => None,
        }
    }
}

/// Where the first stage reads from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Source {
    /// The orchestrator's own standard input.
    #[default]
    Inherit,
    /// A local file, opened by the orchestrator.
    File(PathBuf),
    /// Nothing; the stage fetches its own input.
    Null,
}

/// Where the last stage writes to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Sink {
    /// The orchestrator's own standard output.
    #[default]
    Inherit,
    /// A local file, created or truncated by the orchestrator.
    File(PathBuf),
    /// A pipe handed back to the caller.
    Capture,
}

/// One process of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    name: String,
    program: PathBuf,
    mode: StageMode,
    args: Vec<String>,
}

impl PipelineStage {
    /// Creates a stage running `program`, with the mode flag as its first
    /// argument when the mode has one.
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>, mode: StageMode) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            mode,
            args: mode.flag().into_iter().collect(),
        }
    }

    /// Creates a stage that runs `plugin`.
    #[must_use]
    pub fn for_plugin(plugin: &PluginMetadata, mode: StageMode) -> Self {
        Self::new(plugin.name(), plugin.location(), mode)
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The stage name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The executable.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The invocation mode.
    #[must_use]
    pub const fn mode(&self) -> StageMode {
        self.mode
    }

    /// Every argument, mode flag included.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A linear chain of stages between one source and one sink.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pipeline {
    source: Source,
    stages: Vec<PipelineStage>,
    sink: Sink,
}

impl Pipeline {
    /// Builds a pipeline.
    #[must_use]
    pub const fn new(source: Source, stages: Vec<PipelineStage>, sink: Sink) -> Self {
        Self {
            source,
            stages,
            sink,
        }
    }

    /// Feeds `other` from this pipeline's output.
    ///
    /// The result reads from this pipeline's source and writes to `other`'s
    /// sink.
    #[must_use]
    pub fn then(mut self, other: Self) -> Self {
        self.stages.extend(other.stages);
        self.sink = other.sink;
        self
    }

    /// Replaces the sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Sink) -> Self {
        self.sink = sink;
        self
    }

    /// Where the first stage reads from.
    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    /// The stages in data-flow order.
    #[must_use]
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// Where the last stage writes to.
    #[must_use]
    pub const fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Whether there is nothing to run: input passes straight to output.
    #[must_use]
    pub const fn is_passthrough(&self) -> bool {
        self.stages.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Source, Vec<PipelineStage>, Sink) {
        (self.source, self.stages, self.sink)
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stages.is_empty() {
            return f.write_str("(passthrough)");
        }
        for (index, stage) in self.stages.iter().enumerate() {
            if index > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{stage}")?;
        }
        Ok(())
    }
}
