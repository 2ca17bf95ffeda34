//! Reference native handlers for `jn`.
//!
//! Each handler is a small binary following the handler process contract:
//!
//! * `--jn-meta` prints a [`Capabilities`] record and exits;
//! * `--mode=<m>` selects the direction of a run;
//! * data flows over standard input and output, diagnostics go to standard
//!   error;
//! * exit status 0 on success, including when the consumer closes the pipe
//!   early, 1 on failure and 2 on a usage error.
//!
//! The binaries are thin; the stream logic lives in [`jsonl`], [`glob`] and
//! [`head`] so that it can be tested without spawning processes.

mod error;
pub mod glob;
pub mod head;
pub mod jsonl;
mod logging;
mod meta;

use std::io::{self, Write};
use std::process::ExitCode;

use jn_stream::Flow;
use tracing::{debug, error};

pub use self::error::HandlerError;
pub use self::logging::LoggingArgs;
pub use self::meta::{Capabilities, print_capabilities};

const HANDLER_TARGET: &str = "jn_handlers";

/// Maps the result of a handler run onto its process exit status.
///
/// A closed consumer is a success.
#[must_use]
pub fn finish(handler: &str, result: Result<Flow, HandlerError>) -> ExitCode {
    match result {
        Ok(Flow::Continue) => ExitCode::SUCCESS,
        Ok(Flow::DownstreamClosed) => {
            debug!(target: HANDLER_TARGET, handler, "downstream closed, exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(target: HANDLER_TARGET, handler, error = %err, "handler failed");
            writeln!(io::stderr().lock(), "{handler}: {err}").ok();
            ExitCode::from(err.exit_code())
        }
    }
}
