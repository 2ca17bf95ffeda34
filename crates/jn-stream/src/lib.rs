//! Streaming primitives shared by the `jn` orchestrator and its handlers.
//!
//! Every stage of a `jn` pipeline speaks newline-delimited JSON over standard
//! I/O. This crate owns the two halves of that contract:
//!
//! - [`LineReader`] and [`LineWriter`] move opaque, length-bounded lines
//!   between a reader and a writer without materialising the stream.
//! - [`codec`] turns one line into a dynamically typed [`Record`] and back.
//!
//! A downstream consumer closing its end of the pipe is not an error. Writers
//! report it as [`Flow::DownstreamClosed`], a variant kept apart from
//! [`StreamError`] so callers pattern-match it onto their clean-exit path.
//!
//! # Example
//!
//! ```
//! use jn_stream::{Flow, LineReader, LineWriter, copy_lines};
//!
//! let input = b"{\"a\":1}\n{\"a\":2}\n{\"a\":3}\n";
//! let mut output = Vec::new();
//! let summary = copy_lines(
//!     &mut LineReader::new(&input[..]),
//!     &mut LineWriter::new(&mut output),
//!     Some(2),
//! )?;
//! assert_eq!(summary.lines, 2);
//! assert_eq!(summary.flow, Flow::Continue);
//! assert_eq!(output, b"{\"a\":1}\n{\"a\":2}\n");
//! # Ok::<(), jn_stream::StreamError>(())
//! ```

pub mod codec;
pub mod error;
mod flow;
mod ndjson;
mod reader;
mod writer;

pub use self::codec::{CodecError, Record, decode_line, encode_line};
pub use self::error::StreamError;
pub use self::flow::Flow;
pub use self::ndjson::{CopySummary, RecordReader, RecordWriter, copy_last_lines, copy_lines};
pub use self::reader::{DEFAULT_MAX_LINE_BYTES, LineReader};
pub use self::writer::{LineWriter, is_broken_pipe};
