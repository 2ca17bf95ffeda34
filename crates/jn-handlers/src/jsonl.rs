//! The `jsonl_` format handler.
//!
//! Both directions validate every line as a JSON value and re-emit it in
//! compact form. Blank lines are dropped.

use std::io::{BufRead, Write};

use jn_stream::{Flow, LineReader, LineWriter, RecordReader, RecordWriter};
use tracing::debug;

use crate::error::HandlerError;
use crate::meta::Capabilities;

const JSONL_TARGET: &str = "jn_handlers::jsonl";

/// Capabilities reported by `jsonl_ --jn-meta`.
pub const CAPABILITIES: Capabilities = Capabilities {
    name: "jsonl",
    version: env!("CARGO_PKG_VERSION"),
    description: "Newline-delimited JSON files",
    matches: &[r".*\.(jsonl|ndjson)$"],
    role: "format",
    modes: &["read", "write"],
    supports_raw: false,
    manages_parameters: false,
    supports_container: false,
    container_mode: None,
};

/// Converts JSON Lines on `input` into NDJSON records on `output`.
///
/// # Errors
///
/// Returns [`HandlerError::Stream`] when a line is not valid JSON or the
/// streams fail.
pub fn read<R: BufRead, W: Write>(input: R, output: W) -> Result<Flow, HandlerError> {
    reencode(input, output)
}

/// Converts NDJSON records on `input` into a JSON Lines file on `output`.
///
/// # Errors
///
/// Returns [`HandlerError::Stream`] when a record is not valid JSON or the
/// streams fail.
pub fn write<R: BufRead, W: Write>(input: R, output: W) -> Result<Flow, HandlerError> {
    reencode(input, output)
}

fn reencode<R: BufRead, W: Write>(input: R, output: W) -> Result<Flow, HandlerError> {
    let mut writer = RecordWriter::new(LineWriter::new(output));
    let mut records = 0_u64;
    for record in RecordReader::new(LineReader::new(input)) {
        if writer.write_record(&record?)?.is_closed() {
            debug!(target: JSONL_TARGET, records, "consumer closed");
            return Ok(Flow::DownstreamClosed);
        }
        records = records.saturating_add(1);
    }
    debug!(target: JSONL_TARGET, records, "input exhausted");
    Ok(writer.flush()?)
}

#[cfg(test)]
mod tests {
    use std::io;

    use jn_stream::StreamError;
    use rstest::rstest;

    use super::*;

    fn run(input: &str) -> Result<String, HandlerError> {
        let mut out = Vec::new();
        let flow = read(input.as_bytes(), &mut out)?;
        assert_eq!(flow, Flow::Continue);
        Ok(String::from_utf8(out).expect("utf-8"))
    }

    #[rstest]
    #[case::compacts("{ \"a\" : 1 }\n", "{\"a\":1}\n")]
    #[case::skips_blank("{\"a\":1}\n\n   \n{\"a\":2}\n", "{\"a\":1}\n{\"a\":2}\n")]
    #[case::missing_final_newline("{\"a\":1}", "{\"a\":1}\n")]
    #[case::keeps_key_order("{\"z\":1,\"a\":2}\n", "{\"z\":1,\"a\":2}\n")]
    #[case::scalars("1\n\"x\"\n", "1\n\"x\"\n")]
    #[case::empty("", "")]
    fn reencodes_lines(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(run(input).expect("valid input"), expected);
    }

    #[test]
    fn invalid_line_reports_its_number() {
        let err = run("{\"a\":1}\n\n{oops\n").expect_err("line 3 is invalid");
        assert!(
            matches!(
                err,
                HandlerError::Stream(StreamError::Decode { line_number: 3, .. })
            ),
            "{err:?}"
        );
    }

    #[test]
    fn write_direction_matches_read() {
        let mut out = Vec::new();
        write("{\"b\": [1, 2]}\n".as_bytes(), &mut out).expect("write");
        assert_eq!(out, b"{\"b\":[1,2]}\n");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn closed_consumer_is_not_an_error() {
        let input = "{\"a\":1}\n".repeat(100_000);
        let flow = read(input.as_bytes(), ClosedPipe).expect("broken pipe is clean");
        assert_eq!(flow, Flow::DownstreamClosed);
    }
}
