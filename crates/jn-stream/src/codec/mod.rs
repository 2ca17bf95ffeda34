//! Structural value codec for one line of NDJSON.
//!
//! A [`Record`] is a dynamically typed JSON value (object, array, string,
//! number, boolean or null). Object key order is preserved so columns come
//! out of a stage in the order they went in.

use std::sync::Arc;

use thiserror::Error;

/// A dynamically typed structural value carried by one line.
pub type Record = serde_json::Value;

/// Errors raised while converting between lines and records.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// The line is not a single well-formed JSON value.
    #[error("invalid JSON: {0}")]
    Parse(#[source] Arc<serde_json::Error>),

    /// The value could not be serialised.
    #[error("failed to serialise value: {0}")]
    Serialise(#[source] Arc<serde_json::Error>),
}

/// Parses one line (without its terminator) into a [`Record`].
///
/// Surrounding whitespace, including a stray `\r`, is ignored.
///
/// # Errors
///
/// Returns [`CodecError::Parse`] when the line is empty, holds trailing
/// content, or is not valid JSON.
///
/// # Example
///
/// ```
/// use jn_stream::decode_line;
///
/// let record = decode_line(br#"{"name":"Ada","age":36}"#)?;
/// assert_eq!(record["name"], "Ada");
/// # Ok::<(), jn_stream::CodecError>(())
/// ```
pub fn decode_line(line: &[u8]) -> Result<Record, CodecError> {
    serde_json::from_slice(line).map_err(|error| CodecError::Parse(Arc::new(error)))
}

/// Serialises a [`Record`] to exactly one line, without the terminator.
///
/// Control characters inside strings (including newlines) are escaped, so
/// the output never spans more than one line.
///
/// # Errors
///
/// Returns [`CodecError::Serialise`] if serialisation fails.
pub fn encode_line(record: &Record) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(record).map_err(|error| CodecError::Serialise(Arc::new(error)))
}

/// Appends the encoded form of `record` to `buffer`.
pub(crate) fn encode_into(record: &Record, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
    serde_json::to_writer(&mut *buffer, record)
        .map_err(|error| CodecError::Serialise(Arc::new(error)))
}

/// Returns `true` when the line holds only ASCII whitespace.
#[must_use]
pub fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}
