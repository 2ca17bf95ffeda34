//! Record-level adapters and the bounded copy loop.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use tracing::debug;

use crate::codec::{self, Record};
use crate::error::StreamError;
use crate::flow::Flow;
use crate::reader::LineReader;
use crate::writer::LineWriter;

const COPY_TARGET: &str = "jn_stream::copy";

/// What [`copy_lines`] did before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopySummary {
    /// Lines handed to the writer.
    pub lines: u64,
    /// Whether the consumer was still listening at the end.
    pub flow: Flow,
}

/// Copies lines from `reader` to `writer` until input ends, the consumer
/// closes, or `limit` lines have been written.
///
/// Reading stops as soon as the limit is reached, so an unbounded source is
/// never drained. Output is flushed before returning.
///
/// # Errors
///
/// Propagates read and write failures. A closed consumer is reported through
/// [`CopySummary::flow`], not as an error.
pub fn copy_lines<R, W>(
    reader: &mut LineReader<R>,
    writer: &mut LineWriter<W>,
    limit: Option<u64>,
) -> Result<CopySummary, StreamError>
where
    R: BufRead,
    W: Write,
{
    let mut lines = 0_u64;
    while limit.is_none_or(|max| lines < max) {
        let Some(line) = reader.next_line()? else {
            break;
        };
        if writer.write_line(line)?.is_closed() {
            debug!(target: COPY_TARGET, lines, "consumer closed, stopping copy");
            return Ok(CopySummary {
                lines,
                flow: Flow::DownstreamClosed,
            });
        }
        lines = lines.saturating_add(1);
    }
    let flow = writer.flush()?;
    Ok(CopySummary { lines, flow })
}

/// Copies the final `count` lines of `reader` to `writer`.
///
/// The whole input is read, but at most `count` lines are held at once;
/// buffers of evicted lines are reused for the incoming ones.
///
/// # Errors
///
/// Propagates read and write failures. A closed consumer is reported through
/// [`CopySummary::flow`].
pub fn copy_last_lines<R, W>(
    reader: &mut LineReader<R>,
    writer: &mut LineWriter<W>,
    count: u64,
) -> Result<CopySummary, StreamError>
where
    R: BufRead,
    W: Write,
{
    let capacity = usize::try_from(count).unwrap_or(usize::MAX);
    let mut window: VecDeque<Vec<u8>> = VecDeque::new();
    let mut seen = 0_u64;
    while let Some(line) = reader.next_line()? {
        seen = seen.saturating_add(1);
        if capacity == 0 {
            continue;
        }
        let mut slot = if window.len() == capacity {
            window.pop_front().unwrap_or_default()
        } else {
            Vec::with_capacity(line.len())
        };
        slot.clear();
        slot.extend_from_slice(line);
        window.push_back(slot);
    }
    debug!(target: COPY_TARGET, seen, kept = window.len(), "input drained");

    let mut lines = 0_u64;
    for line in &window {
        if writer.write_line(line)?.is_closed() {
            return Ok(CopySummary {
                lines,
                flow: Flow::DownstreamClosed,
            });
        }
        lines = lines.saturating_add(1);
    }
    let flow = writer.flush()?;
    Ok(CopySummary { lines, flow })
}

/// Iterates decoded records, skipping blank lines.
#[derive(Debug)]
pub struct RecordReader<R> {
    lines: LineReader<R>,
}

impl<R: BufRead> RecordReader<R> {
    /// Wraps a line reader.
    pub const fn new(lines: LineReader<R>) -> Self {
        Self { lines }
    }

    /// Returns the next record, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Decode`] with the offending line number when a
    /// non-blank line is not valid JSON.
    pub fn next_record(&mut self) -> Result<Option<Record>, StreamError> {
        loop {
            let Some(line) = self.lines.next_line()? else {
                return Ok(None);
            };
            if codec::is_blank(line) {
                continue;
            }
            return codec::decode_line(line)
                .map(Some)
                .map_err(|source| StreamError::Decode {
                    line_number: self.lines.line_number(),
                    source,
                });
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Writes records as compact single-line JSON.
#[derive(Debug)]
pub struct RecordWriter<W: Write> {
    lines: LineWriter<W>,
    scratch: Vec<u8>,
}

impl<W: Write> RecordWriter<W> {
    /// Wraps a line writer.
    pub const fn new(lines: LineWriter<W>) -> Self {
        Self {
            lines,
            scratch: Vec::new(),
        }
    }

    /// Encodes and writes one record.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Encode`] if the record cannot be serialised,
    /// or a write error other than a broken pipe.
    pub fn write_record(&mut self, record: &Record) -> Result<Flow, StreamError> {
        self.scratch.clear();
        codec::encode_into(record, &mut self.scratch).map_err(StreamError::Encode)?;
        self.lines.write_line(&self.scratch)
    }

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns a write error other than a broken pipe.
    pub fn flush(&mut self) -> Result<Flow, StreamError> {
        self.lines.flush()
    }
}
