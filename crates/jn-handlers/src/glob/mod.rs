//! The `glob_` protocol handler.
//!
//! Reads every file matching a glob pattern as NDJSON and tags each record
//! with where it came from:
//!
//! | key           | value                                         |
//! |---------------|-----------------------------------------------|
//! | `_path`       | path as matched, e.g. `logs/2024/a.jsonl`     |
//! | `_dir`        | directory part of `_path`, empty at the root  |
//! | `_filename`   | file name with extension                      |
//! | `_basename`   | file name without extension                   |
//! | `_ext`        | extension including the dot, or empty         |
//! | `_file_index` | 0-based position of the file in the expansion |
//! | `_line_index` | 0-based position of the record in its file    |
//!
//! Path keys come first and a record's own keys win over them. Records that
//! are not objects are wrapped as `{"value": ...}`.

mod pattern;

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jn_stream::{Flow, LineReader, LineWriter, Record, RecordReader, RecordWriter, StreamError};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

pub use self::pattern::{GlobMatch, GlobPattern};
use crate::error::HandlerError;
use crate::meta::Capabilities;

const GLOB_TARGET: &str = "jn_handlers::glob";

/// Capabilities reported by `glob_ --jn-meta`.
///
/// Only `glob://` locators are claimed by pattern; bare glob addresses
/// select the handler by name.
pub const CAPABILITIES: Capabilities = Capabilities {
    name: "glob",
    version: env!("CARGO_PKG_VERSION"),
    description: "Read every file matching a glob pattern",
    matches: &["^glob://"],
    role: "protocol",
    modes: &["read"],
    supports_raw: false,
    manages_parameters: true,
    supports_container: false,
    container_mode: None,
};

/// Failures specific to expanding and reading a glob.
#[derive(Debug, Error)]
pub enum GlobError {
    /// The pattern cannot be compiled.
    #[error("invalid glob pattern '{pattern}': {reason}")]
    Pattern {
        /// Pattern as given.
        pattern: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A directory could not be listed.
    #[error("failed to list {}: {source}", path.display())]
    Walk {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A matched file could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        /// File being opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A matched file held something other than NDJSON.
    #[error("{}: {source}", path.display())]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying stream error.
        #[source]
        source: StreamError,
    },
}

/// What to expand and how much of it to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobOptions {
    /// Pattern, optionally prefixed with `glob://`.
    pub pattern: String,
    /// Directory relative patterns are expanded from.
    pub root: PathBuf,
    /// Include hidden files and directories.
    pub hidden: bool,
    /// Stop after this many records in total.
    pub limit: Option<u64>,
    /// Stop after this many files.
    pub file_limit: Option<u64>,
}

/// Streams the records of every matching file to `output`.
///
/// # Errors
///
/// Returns a [`GlobError`] for a bad pattern, an unreadable directory or
/// file, or a file that is not NDJSON, and [`StreamError`] when `output`
/// fails.
pub fn run<W: Write>(options: &GlobOptions, output: W) -> Result<Flow, HandlerError> {
    let pattern = GlobPattern::new(&options.pattern)?;
    let files = pattern.expand(&options.root, options.hidden)?;
    debug!(target: GLOB_TARGET, pattern = pattern.as_str(), files = files.len(), "reading glob");

    let mut writer = RecordWriter::new(LineWriter::new(output));
    let mut emitted = 0_u64;
    let file_budget = options.file_limit.unwrap_or(u64::MAX);
    for (file_index, found) in (0_u64..file_budget).zip(&files) {
        let handle = File::open(&found.path).map_err(|error| GlobError::Open {
            path: found.path.clone(),
            source: Arc::new(error),
        })?;
        let origin = PathKeys::new(found, file_index);
        let records = RecordReader::new(LineReader::new(BufReader::new(handle)));
        for (line_index, decoded) in (0_u64..).zip(records) {
            if options.limit.is_some_and(|limit| emitted >= limit) {
                return Ok(writer.flush()?);
            }
            let record = decoded.map_err(|source| GlobError::Read {
                path: found.path.clone(),
                source,
            })?;
            if writer.write_record(&origin.tag(record, line_index))?.is_closed() {
                debug!(target: GLOB_TARGET, emitted, "consumer closed");
                return Ok(Flow::DownstreamClosed);
            }
            emitted = emitted.saturating_add(1);
        }
    }
    debug!(target: GLOB_TARGET, emitted, "glob exhausted");
    Ok(writer.flush()?)
}

/// The per-file keys added to every record.
struct PathKeys {
    keys: Map<String, Value>,
}

impl PathKeys {
    fn new(found: &GlobMatch, file_index: u64) -> Self {
        let display = Path::new(&found.display);
        let text = |part: Option<&std::ffi::OsStr>| {
            part.map(|value| value.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        let directory = found
            .display
            .rsplit_once('/')
            .map(|(parent, _)| parent.to_owned())
            .unwrap_or_default();
        let extension = display
            .extension()
            .map(|value| format!(".{}", value.to_string_lossy()))
            .unwrap_or_default();

        let mut keys = Map::new();
        keys.insert("_path".to_owned(), Value::from(found.display.clone()));
        keys.insert("_dir".to_owned(), Value::from(directory));
        keys.insert("_filename".to_owned(), Value::from(text(display.file_name())));
        keys.insert("_basename".to_owned(), Value::from(text(display.file_stem())));
        keys.insert("_ext".to_owned(), Value::from(extension));
        keys.insert("_file_index".to_owned(), Value::from(file_index));
        Self { keys }
    }

    fn tag(&self, record: Record, line_index: u64) -> Record {
        let mut tagged = self.keys.clone();
        tagged.insert("_line_index".to_owned(), Value::from(line_index));
        match record {
            Value::Object(fields) => tagged.extend(fields),
            other => {
                tagged.insert("value".to_owned(), other);
            }
        }
        Value::Object(tagged)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    #[fixture]
    fn logs() -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("logs/2024")).expect("mkdir");
        fs::write(dir.path().join("logs/a.jsonl"), "{\"n\":1}\n{\"n\":2}\n").expect("write");
        fs::write(dir.path().join("logs/2024/b.jsonl"), "{\"n\":3,\"_dir\":\"mine\"}\n7\n")
            .expect("write");
        dir
    }

    fn options(root: &Path, pattern: &str) -> GlobOptions {
        GlobOptions {
            pattern: pattern.to_owned(),
            root: root.to_path_buf(),
            hidden: false,
            limit: None,
            file_limit: None,
        }
    }

    fn records(options: &GlobOptions) -> Vec<Value> {
        let mut out = Vec::new();
        run(options, &mut out).expect("glob run");
        String::from_utf8(out)
            .expect("utf-8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json"))
            .collect()
    }

    #[rstest]
    fn records_carry_path_keys_first(logs: TempDir) {
        let out = records(&options(logs.path(), "logs/*.jsonl"));
        let [first, second] = out.as_slice() else {
            panic!("expected two records: {out:?}");
        };
        let keys: Vec<&str> = first
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            [
                "_path",
                "_dir",
                "_filename",
                "_basename",
                "_ext",
                "_file_index",
                "_line_index",
                "n"
            ]
        );
        assert_eq!(first["_path"], "logs/a.jsonl");
        assert_eq!(first["_dir"], "logs");
        assert_eq!(first["_basename"], "a");
        assert_eq!(first["_ext"], ".jsonl");
        assert_eq!(second["_line_index"], 1);
    }

    #[rstest]
    fn record_keys_override_and_scalars_are_wrapped(logs: TempDir) {
        let out = records(&options(logs.path(), "logs/**/*.jsonl"));
        let nested: Vec<&Value> = out.iter().filter(|record| record["_file_index"] == 0).collect();
        let [object, scalar] = nested.as_slice() else {
            panic!("logs/2024/b.jsonl sorts first: {out:?}");
        };
        assert_eq!(object["_dir"], "mine");
        assert_eq!(object["_path"], "logs/2024/b.jsonl");
        assert_eq!(scalar["value"], 7);
    }

    #[rstest]
    #[case::records(Some(3), None, 3)]
    #[case::files(None, Some(1), 2)]
    #[case::zero_files(None, Some(0), 0)]
    fn limits_bound_the_output(
        logs: TempDir,
        #[case] limit: Option<u64>,
        #[case] file_limit: Option<u64>,
        #[case] expected: usize,
    ) {
        let mut bounded = options(logs.path(), "logs/**/*.jsonl");
        bounded.limit = limit;
        bounded.file_limit = file_limit;
        assert_eq!(records(&bounded).len(), expected);
    }

    #[rstest]
    fn invalid_file_names_the_path(logs: TempDir) {
        fs::write(logs.path().join("logs/bad.jsonl"), "{oops\n").expect("write");
        let err = run(&options(logs.path(), "logs/*.jsonl"), Vec::new()).expect_err("bad file");
        assert!(
            matches!(&err, HandlerError::Glob(GlobError::Read { path, .. }) if path.ends_with("bad.jsonl")),
            "{err:?}"
        );
    }
}
