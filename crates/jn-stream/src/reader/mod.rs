//! Bounded line reader.

use std::io::{BufRead, Read};

use crate::error::StreamError;

/// Largest line accepted by default, in bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

/// Reads newline-terminated lines into a single reusable buffer.
///
/// At most one line is held in memory at a time and a line longer than the
/// configured bound is rejected rather than buffered. Terminators (`\n` or
/// `\r\n`) are stripped.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    buffer: Vec<u8>,
    max_line_bytes: usize,
    line_number: u64,
}

impl<R: BufRead> LineReader<R> {
    /// Wraps a buffered reader using [`DEFAULT_MAX_LINE_BYTES`].
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            line_number: 0,
        }
    }

    /// Overrides the per-line byte bound.
    #[must_use]
    pub const fn with_max_line_bytes(mut self, limit: usize) -> Self {
        self.max_line_bytes = limit;
        self
    }

    /// Number of lines returned so far.
    #[must_use]
    pub const fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Returns the next line without its terminator, or `None` at end of
    /// input.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Read`] on I/O failure and
    /// [`StreamError::LineTooLong`] when a line exceeds the bound.
    pub fn next_line(&mut self) -> Result<Option<&[u8]>, StreamError> {
        self.buffer.clear();
        // One byte of headroom for the terminator itself.
        let budget = u64::try_from(self.max_line_bytes)
            .unwrap_or(u64::MAX)
            .saturating_add(2);
        let read = (&mut self.inner)
            .take(budget)
            .read_until(b'\n', &mut self.buffer)
            .map_err(StreamError::read)?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number = self.line_number.saturating_add(1);

        if self.buffer.last() == Some(&b'\n') {
            self.buffer.pop();
            if self.buffer.last() == Some(&b'\r') {
                self.buffer.pop();
            }
        }
        if self.buffer.len() > self.max_line_bytes {
            return Err(StreamError::LineTooLong {
                line_number: self.line_number,
                limit: self.max_line_bytes,
            });
        }
        Ok(Some(&self.buffer))
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests;
