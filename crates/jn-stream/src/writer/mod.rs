//! Line writer that treats a closed downstream as a clean stop.

use std::io::{self, BufWriter, Write};

use tracing::debug;

use crate::error::StreamError;
use crate::flow::Flow;

/// Tracing target for writer events.
const WRITER_TARGET: &str = "jn_stream::writer";

/// Default capacity of the output buffer.
const OUTPUT_BUFFER_BYTES: usize = 64 * 1024;

/// Returns `true` when `error` means the reading end of the pipe has closed.
#[must_use]
pub fn is_broken_pipe(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::BrokenPipe
}

/// Buffered writer emitting one line per call.
///
/// Once the consumer closes the pipe every later call returns
/// [`Flow::DownstreamClosed`] without touching the sink again.
#[derive(Debug)]
pub struct LineWriter<W: Write> {
    inner: BufWriter<W>,
    flush_each_line: bool,
    closed: bool,
}

impl<W: Write> LineWriter<W> {
    /// Wraps `inner` with a 64 KiB output buffer.
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::with_capacity(OUTPUT_BUFFER_BYTES, inner),
            flush_each_line: false,
            closed: false,
        }
    }

    /// Flushes after every line so interactive consumers see records as soon
    /// as they are produced.
    #[must_use]
    pub const fn line_buffered(mut self) -> Self {
        self.flush_each_line = true;
        self
    }

    /// Writes `line` followed by `\n`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Write`] for any failure other than a broken
    /// pipe.
    pub fn write_line(&mut self, line: &[u8]) -> Result<Flow, StreamError> {
        if self.closed {
            return Ok(Flow::DownstreamClosed);
        }
        let result = self
            .inner
            .write_all(line)
            .and_then(|()| self.inner.write_all(b"\n"))
            .and_then(|()| {
                if self.flush_each_line {
                    self.inner.flush()
                } else {
                    Ok(())
                }
            });
        self.settle(result)
    }

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Write`] for any failure other than a broken
    /// pipe.
    pub fn flush(&mut self) -> Result<Flow, StreamError> {
        if self.closed {
            return Ok(Flow::DownstreamClosed);
        }
        let result = self.inner.flush();
        self.settle(result)
    }

    /// Returns `true` once the consumer has closed the pipe.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn settle(&mut self, result: io::Result<()>) -> Result<Flow, StreamError> {
        match result {
            Ok(()) => Ok(Flow::Continue),
            Err(error) if is_broken_pipe(&error) => {
                debug!(target: WRITER_TARGET, "downstream closed the pipe");
                self.closed = true;
                Ok(Flow::DownstreamClosed)
            }
            Err(error) => Err(StreamError::write(error)),
        }
    }
}
