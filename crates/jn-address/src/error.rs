//! Errors raised while resolving a reference.

use thiserror::Error;

/// A reference that cannot be turned into a usable [`Address`](crate::Address).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The reference was empty or only whitespace.
    #[error("address cannot be empty")]
    Empty,

    /// A `@namespace/name` reference was incomplete.
    #[error("malformed profile reference '{reference}': {reason}")]
    MalformedProfile {
        /// The offending reference.
        reference: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A glob pattern was used where an output is required.
    #[error("glob pattern '{pattern}' can only be read from, not written to")]
    GlobOutput {
        /// The glob pattern.
        pattern: String,
    },

    /// Neither an explicit `~format` nor an extension names a format.
    #[error("cannot determine the format of '{reference}'; add an explicit ~format suffix")]
    UnknownFormat {
        /// The reference whose format is unknown.
        reference: String,
    },
}
