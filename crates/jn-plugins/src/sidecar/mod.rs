//! Manifest sidecar cache.
//!
//! A binary `csv_` caches its `--jn-meta` answer in `csv_.json` next to it.
//! The sidecar holds the introspection object verbatim plus two bookkeeping
//! keys, `_generated` and `_binary_mtime`. It is derived data: a sidecar
//! older than its binary, or one recorded against a different binary mtime,
//! is ignored and regenerated. Writes go through a temporary file and a
//! rename so that a concurrent reader never observes a torn file.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::DiscoveryError;
use crate::manifest::IntrospectionRecord;

const SIDECAR_TARGET: &str = "jn_plugins::sidecar";

/// Key marking a sidecar written by discovery rather than by hand.
pub const GENERATED_KEY: &str = "_generated";
/// Key recording the binary mtime the sidecar was generated against.
pub const BINARY_MTIME_KEY: &str = "_binary_mtime";

/// Tolerance when comparing a recorded mtime with the current one.
const MTIME_TOLERANCE: Duration = Duration::from_millis(1);

/// A capability record loaded from a fresh sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedManifest {
    /// Parsed capability record.
    pub record: IntrospectionRecord,
    /// Whether the sidecar was generated by discovery.
    pub generated: bool,
}

/// Returns the sidecar path for a binary: the same path plus `.json`.
#[must_use]
pub fn sidecar_path(binary: &Path) -> PathBuf {
    let mut path = OsString::from(binary.as_os_str());
    path.push(".json");
    PathBuf::from(path)
}

/// Seconds since the epoch, as stored in `_binary_mtime`.
#[must_use]
pub fn mtime_seconds(mtime: SystemTime) -> f64 {
    since_epoch(mtime).as_secs_f64()
}

fn since_epoch(mtime: SystemTime) -> Duration {
    mtime.duration_since(UNIX_EPOCH).unwrap_or_default()
}

/// Whether a recorded `_binary_mtime` still names `binary_mtime`.
///
/// Both sides are compared as [`Duration`]s since the epoch.
fn records_mtime(recorded: Option<&Value>, binary_mtime: SystemTime) -> bool {
    recorded
        .and_then(Value::as_f64)
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
        .is_some_and(|stored| stored.abs_diff(since_epoch(binary_mtime)) <= MTIME_TOLERANCE)
}

/// Loads the sidecar for `binary` if it is still valid.
///
/// Returns `None` when the sidecar is missing, older than the binary,
/// generated against another binary mtime, or unreadable. Every case other
/// than a missing file is logged at debug level.
#[must_use]
pub fn load_fresh(binary: &Path, binary_mtime: SystemTime) -> Option<CachedManifest> {
    let path = sidecar_path(binary);
    let sidecar_mtime = fs::metadata(&path).and_then(|meta| meta.modified()).ok()?;
    if sidecar_mtime < binary_mtime {
        debug!(target: SIDECAR_TARGET, path = %path.display(), "sidecar older than binary");
        return None;
    }

    let parsed = fs::read(&path)
        .map_err(DiscoveryError::io)
        .and_then(|bytes| parse_object(&bytes));
    let object = match parsed {
        Ok(object) => object,
        Err(error) => {
            debug!(target: SIDECAR_TARGET, path = %path.display(), %error, "ignoring unreadable sidecar");
            return None;
        }
    };

    let generated = object.get(GENERATED_KEY).and_then(Value::as_bool) == Some(true);
    if generated {
        let recorded = object.get(BINARY_MTIME_KEY);
        if !records_mtime(recorded, binary_mtime) {
            debug!(
                target: SIDECAR_TARGET,
                path = %path.display(),
                ?recorded,
                current = mtime_seconds(binary_mtime),
                "sidecar generated against a different binary"
            );
            return None;
        }
    }

    match record_from_object(object) {
        Ok(record) => Some(CachedManifest { record, generated }),
        Err(error) => {
            debug!(target: SIDECAR_TARGET, path = %path.display(), %error, "ignoring malformed sidecar");
            None
        }
    }
}

/// Parses raw `--jn-meta` output into the introspection object.
///
/// # Errors
///
/// Returns [`DiscoveryError::InvalidOutput`] unless `bytes` holds a single
/// JSON object.
pub fn parse_object(bytes: &[u8]) -> Result<Map<String, Value>, DiscoveryError> {
    serde_json::from_slice::<Map<String, Value>>(bytes).map_err(|source| {
        DiscoveryError::InvalidOutput {
            source: Arc::new(source),
        }
    })
}

/// Deserialises the capability record out of an introspection object.
///
/// # Errors
///
/// Returns [`DiscoveryError::InvalidOutput`] when a known key has the wrong
/// type.
pub fn record_from_object(object: Map<String, Value>) -> Result<IntrospectionRecord, DiscoveryError> {
    serde_json::from_value(Value::Object(object)).map_err(|source| DiscoveryError::InvalidOutput {
        source: Arc::new(source),
    })
}

/// Renders sidecar bytes: the introspection object plus bookkeeping keys.
///
/// The output depends only on `object` and `binary_mtime`, so regenerating
/// an unchanged binary yields identical bytes.
///
/// # Errors
///
/// Returns [`DiscoveryError::InvalidOutput`] if the object cannot be
/// serialised, which only happens for non-finite mtimes.
pub fn render(
    mut object: Map<String, Value>,
    binary_mtime: SystemTime,
) -> Result<Vec<u8>, DiscoveryError> {
    object.insert(GENERATED_KEY.to_owned(), Value::Bool(true));
    object.insert(
        BINARY_MTIME_KEY.to_owned(),
        Value::from(mtime_seconds(binary_mtime)),
    );
    let mut bytes = serde_json::to_vec_pretty(&Value::Object(object)).map_err(|source| {
        DiscoveryError::InvalidOutput {
            source: Arc::new(source),
        }
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Writes sidecar bytes atomically next to `binary`.
///
/// # Errors
///
/// Returns the I/O error if the temporary file cannot be created, written,
/// or renamed into place.
pub fn store(binary: &Path, bytes: &[u8]) -> io::Result<()> {
    let path = sidecar_path(binary);
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(directory)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.persist(&path).map_err(|error| error.error)?;
    Ok(())
}

#[cfg(test)]
mod tests;
