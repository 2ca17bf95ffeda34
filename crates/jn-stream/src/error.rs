//! Errors raised while streaming lines between stages.
//!
//! I/O errors are wrapped in `Arc` so the enum stays `Clone` and small. A
//! broken pipe never appears here; see [`Flow`](crate::Flow).

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::codec::CodecError;

/// Errors arising from line-oriented stream processing.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// Reading from the upstream source failed.
    #[error("failed to read input: {source}")]
    Read {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Writing to the downstream sink failed for a reason other than the
    /// consumer closing its end.
    #[error("failed to write output: {source}")]
    Write {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// A single line exceeded the reader's buffer bound.
    #[error("line {line_number} exceeds the {limit}-byte line limit")]
    LineTooLong {
        /// One-based number of the offending line.
        line_number: u64,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// A line could not be decoded as a structural value.
    #[error("line {line_number} is not a valid record: {source}")]
    Decode {
        /// One-based number of the offending line.
        line_number: u64,
        /// Codec failure.
        #[source]
        source: CodecError,
    },

    /// A value could not be encoded as a line.
    #[error("failed to encode record: {0}")]
    Encode(#[source] CodecError),
}

impl StreamError {
    pub(crate) fn read(error: io::Error) -> Self {
        Self::Read {
            source: Arc::new(error),
        }
    }

    pub(crate) fn write(error: io::Error) -> Self {
        Self::Write {
            source: Arc::new(error),
        }
    }
}
