//! Bounded `--jn-meta` introspection of native handlers.
//!
//! [`ProcessIntrospector`] runs `<binary> --jn-meta` in its own process group
//! with stdin closed. Both output pipes are drained on helper threads that
//! report over a channel, so a single deadline covers reading the output and
//! waiting for the exit status. When the deadline passes the whole group is
//! killed, which also reaps descendants still holding the pipes open, and the
//! reader threads are abandoned.

use std::io::{self, BufReader, Read};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::DiscoveryError;

/// Tracing target for introspection.
const INTROSPECT_TARGET: &str = "jn_plugins::introspect";

/// Flag every native handler answers with its capability record.
pub const INTROSPECTION_FLAG: &str = "--jn-meta";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Obtains a binary's raw capability output.
///
/// The production implementation is [`ProcessIntrospector`]. Tests replace
/// it to count or script introspection calls.
pub trait Introspector {
    /// Returns what `binary` prints in answer to [`INTROSPECTION_FLAG`].
    ///
    /// # Errors
    ///
    /// Returns a [`DiscoveryError`] if the binary cannot be run, times out,
    /// or exits unsuccessfully.
    fn introspect(&self, binary: &Path) -> Result<Vec<u8>, DiscoveryError>;
}

/// Runs handlers as child processes with a deadline.
#[derive(Debug, Clone, Copy)]
pub struct ProcessIntrospector {
    timeout: Duration,
}

impl ProcessIntrospector {
    /// Creates an introspector that waits at most `timeout` per binary.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Introspector for ProcessIntrospector {
    fn introspect(&self, binary: &Path) -> Result<Vec<u8>, DiscoveryError> {
        debug!(
            target: INTROSPECT_TARGET,
            binary = %binary.display(),
            timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            "introspecting handler"
        );
        let deadline = Deadline::after(self.timeout);
        let mut child = Command::new(binary)
            .arg(INTROSPECTION_FLAG)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()
            .map_err(|source| DiscoveryError::Spawn {
                source: Arc::new(source),
            })?;

        let (sender, receiver) = mpsc::channel();
        if let Some(pipe) = child.stdout.take() {
            drain(Pipe::Stdout, pipe, sender.clone());
        }
        if let Some(pipe) = child.stderr.take() {
            drain(Pipe::Stderr, pipe, sender.clone());
        }
        drop(sender);

        let Some(output) = receive(&receiver, &deadline) else {
            return Err(expire(binary, &mut child, self.timeout));
        };
        let status = match wait_for_exit(&mut child, &deadline) {
            Ok(Some(status)) => status,
            Ok(None) => return Err(expire(binary, &mut child, self.timeout)),
            Err(error) => {
                kill_group(&mut child);
                return Err(DiscoveryError::io(error));
            }
        };
        debug!(target: INTROSPECT_TARGET, binary = %binary.display(), ?status, "handler exited");

        if let Some(Ok(diagnostics)) = &output.stderr
            && !diagnostics.is_empty()
        {
            debug!(
                target: INTROSPECT_TARGET,
                binary = %binary.display(),
                stderr = %String::from_utf8_lossy(diagnostics).trim(),
                "handler stderr output"
            );
        }
        if !status.success() {
            return Err(DiscoveryError::NonZeroExit {
                code: status.code(),
            });
        }
        output
            .stdout
            .map_or_else(|| Ok(Vec::new()), |read| read.map_err(DiscoveryError::io))
    }
}

/// Which of the child's output pipes a chunk came from.
#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

/// Everything the reader threads delivered before the channel closed.
#[derive(Debug, Default)]
struct Output {
    stdout: Option<io::Result<Vec<u8>>>,
    stderr: Option<io::Result<Vec<u8>>>,
}

/// A fixed point in time shared by every wait of one introspection call.
struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    fn after(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}

fn drain(pipe: Pipe, stream: impl Read + Send + 'static, sender: Sender<(Pipe, io::Result<Vec<u8>>)>) {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let read = BufReader::new(stream)
            .read_to_end(&mut buffer)
            .map(|_| buffer);
        // The receiver is gone once the call has timed out.
        sender.send((pipe, read)).ok();
    });
}

/// Collects both pipes, or returns `None` if the deadline passes first.
fn receive(receiver: &Receiver<(Pipe, io::Result<Vec<u8>>)>, deadline: &Deadline) -> Option<Output> {
    let mut output = Output::default();
    loop {
        match receiver.recv_timeout(deadline.remaining()) {
            Ok((Pipe::Stdout, read)) => output.stdout = Some(read),
            Ok((Pipe::Stderr, read)) => output.stderr = Some(read),
            Err(RecvTimeoutError::Disconnected) => return Some(output),
            Err(RecvTimeoutError::Timeout) => return None,
        }
    }
}

/// Polls the child until it exits, or returns `None` at the deadline.
fn wait_for_exit(child: &mut Child, deadline: &Deadline) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let remaining = deadline.remaining();
        if remaining.is_zero() {
            return Ok(None);
        }
        thread::sleep(remaining.min(POLL_INTERVAL));
    }
}

fn expire(binary: &Path, child: &mut Child, timeout: Duration) -> DiscoveryError {
    debug!(
        target: INTROSPECT_TARGET,
        binary = %binary.display(),
        "introspection timed out, killing handler process group"
    );
    kill_group(child);
    DiscoveryError::Timeout { timeout }
}

/// Kills the child's process group and reaps the child.
///
/// The child leads its own group, so the group id equals its pid. The kill
/// is sent before the child is reaped, while that id cannot be reused.
fn kill_group(child: &mut Child) {
    match libc::pid_t::try_from(child.id()) {
        Ok(group) => {
            // SAFETY: `kill` has no memory-safety preconditions.
            unsafe { libc::kill(-group, libc::SIGKILL) };
        }
        Err(_) => {
            child.kill().ok();
        }
    }
    child.wait().ok();
}
