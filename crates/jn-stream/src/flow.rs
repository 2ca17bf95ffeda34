//! Writer-side flow control signal.

/// Result of handing a line to a downstream consumer.
///
/// `DownstreamClosed` is the broken-pipe condition: the reader on the other
/// side of the pipe has gone away. It terminates a stage successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use]
pub enum Flow {
    /// The consumer accepted the data; keep producing.
    Continue,
    /// The consumer closed its input; stop producing and exit with status 0.
    DownstreamClosed,
}

impl Flow {
    /// Returns `true` when the consumer has gone away.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::DownstreamClosed)
    }
}
