//! How a pipeline ended.

use std::fmt;
use std::process::ExitStatus;

/// Exit codes above this are `128 + signal` for signal deaths.
const SIGNAL_EXIT_BASE: i32 = 128;

/// How one stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageStatus {
    /// Exited with status 0.
    Succeeded,
    /// Stopped because the stage it was writing to closed its input.
    DownstreamClosed,
    /// Exited non-zero or died from a signal other than `SIGPIPE`.
    Failed(i32),
}

impl StageStatus {
    /// Classifies a process exit status.
    ///
    /// A death by `SIGPIPE` means a downstream stage stopped reading, which
    /// is a clean early exit. Other signals map to `128 + signal`.
    #[must_use]
    pub fn from_exit_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return if code == 0 {
                Self::Succeeded
            } else {
                Self::Failed(code)
            };
        }
        Self::from_signal(termination_signal(status))
    }

    fn from_signal(signal: Option<i32>) -> Self {
        match signal {
            Some(libc::SIGPIPE) => Self::DownstreamClosed,
            Some(number) => Self::Failed(SIGNAL_EXIT_BASE + number),
            None => Self::Failed(1),
        }
    }

    /// Whether the stage counts as successful.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Succeeded | Self::DownstreamClosed)
    }

    /// The stage's exit code, 0 for any successful status.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Succeeded | Self::DownstreamClosed => 0,
            Self::Failed(code) => code,
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("succeeded"),
            Self::DownstreamClosed => f.write_str("downstream closed"),
            Self::Failed(code) => write!(f, "failed with exit code {code}"),
        }
    }
}

#[cfg(unix)]
fn termination_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
const fn termination_signal(_status: ExitStatus) -> Option<i32> {
    None
}

/// The final status of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    name: String,
    status: StageStatus,
}

impl StageReport {
    /// Records `status` for the stage called `name`.
    pub fn new(name: impl Into<String>, status: StageStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }

    /// The stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the stage ended.
    #[must_use]
    pub const fn status(&self) -> StageStatus {
        self.status
    }
}

/// The result of running a pipeline to completion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExitOutcome {
    stages: Vec<StageReport>,
}

impl ExitOutcome {
    /// Builds an outcome from reports in pipeline order.
    #[must_use]
    pub const fn new(stages: Vec<StageReport>) -> Self {
        Self { stages }
    }

    /// Per-stage reports in pipeline order.
    #[must_use]
    pub fn stages(&self) -> &[StageReport] {
        &self.stages
    }

    /// The failure that decides the pipeline's exit code.
    ///
    /// Stages are observed sink first, so the failure nearest the sink
    /// wins.
    #[must_use]
    pub fn failure(&self) -> Option<&StageReport> {
        self.stages
            .iter()
            .rev()
            .find(|report| !report.status.is_success())
    }

    /// Whether every stage succeeded or closed early.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure().is_none()
    }

    /// The process exit code for the whole pipeline.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.failure().map_or(0, |report| report.status.code())
    }
}
