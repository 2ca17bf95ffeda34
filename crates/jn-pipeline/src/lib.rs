//! Pipeline planning and execution for `jn`.
//!
//! The [`Planner`] turns resolved addresses into a [`Pipeline`]: an ordered
//! list of handler invocations between a source and a sink. The
//! [`Executor`] runs it as one OS process per stage, joined by pipes.
//!
//! Backpressure and cancellation are left to the kernel. A full pipe
//! blocks the writer; a closed pipe stops it. A stage that stops because
//! its consumer went away is reported as
//! [`StageStatus::DownstreamClosed`], which counts as success. The first
//! real failure observed, walking from the sink towards the source,
//! decides the pipeline's exit code.
//!
//! # Example
//!
//! ```rust,no_run
//! use jn_address::resolve;
//! use jn_config::Config;
//! use jn_pipeline::{Executor, Planner};
//! use jn_plugins::PluginRegistry;
//!
//! let config = Config::default();
//! let registry = PluginRegistry::load(&config);
//! let pipeline = Planner::new(&registry).run(
//!     &resolve("people.csv")?,
//!     &[String::from("select(.age > 40)")],
//!     &resolve("-~json")?,
//! )?;
//! let outcome = Executor::from_config(&config).execute(pipeline)?;
//! std::process::exit(outcome.exit_code());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod executor;
mod outcome;
mod planner;
mod stage;

#[cfg(test)]
mod tests;

pub use self::error::PipelineError;
pub use self::executor::{Executor, RunningPipeline};
pub use self::outcome::{ExitOutcome, StageReport, StageStatus};
pub use self::planner::{FILTER_PLUGIN, Planner};
pub use self::stage::{Pipeline, PipelineStage, Sink, Source, StageMode};
