//! Unit tests for the bounded line reader.

use rstest::rstest;

use super::*;

fn collect(input: &[u8]) -> Vec<Vec<u8>> {
    let mut reader = LineReader::new(input);
    let mut lines = Vec::new();
    while let Some(line) = reader.next_line().expect("read line") {
        lines.push(line.to_vec());
    }
    lines
}

#[rstest]
#[case::lf(b"a\nb\n".as_slice())]
#[case::crlf(b"a\r\nb\r\n".as_slice())]
#[case::missing_final_terminator(b"a\nb".as_slice())]
fn strips_terminators(#[case] input: &[u8]) {
    assert_eq!(collect(input), vec![b"a".to_vec(), b"b".to_vec()]);
}

#[test]
fn empty_input_yields_nothing() {
    assert!(collect(b"").is_empty());
}

#[test]
fn blank_lines_are_preserved() {
    assert_eq!(collect(b"\n\nx\n"), vec![Vec::new(), Vec::new(), b"x".to_vec()]);
}

#[test]
fn counts_lines() {
    let mut reader = LineReader::new(b"1\n2\n3\n".as_slice());
    while reader.next_line().expect("read").is_some() {}
    assert_eq!(reader.line_number(), 3);
}

#[test]
fn line_at_limit_is_accepted() {
    let mut reader = LineReader::new(b"abcd\r\n".as_slice()).with_max_line_bytes(4);
    assert_eq!(reader.next_line().expect("read"), Some(b"abcd".as_slice()));
}

#[rstest]
#[case::terminated(b"abcde\nok\n".as_slice())]
#[case::unterminated(b"abcdefghij".as_slice())]
fn oversized_line_is_rejected(#[case] input: &[u8]) {
    let mut reader = LineReader::new(input).with_max_line_bytes(4);
    let err = reader.next_line().expect_err("should reject");
    assert!(
        matches!(
            err,
            StreamError::LineTooLong {
                line_number: 1,
                limit: 4
            }
        ),
        "unexpected error: {err}"
    );
}
