//! Unit tests for the manifest sidecar cache.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

struct Binary {
    _dir: TempDir,
    path: PathBuf,
}

#[fixture]
fn binary() -> Binary {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("csv_");
    fs::write(&path, b"#!/bin/sh\n").expect("write binary");
    Binary { _dir: dir, path }
}

fn set_mtime(path: &Path, mtime: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .expect("open")
        .set_modified(mtime)
        .expect("set mtime");
}

fn epoch_plus(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

const META: &[u8] = br#"{"name":"csv","matches":[".*\\.csv$"],"modes":["read"]}"#;

#[test]
fn sidecar_path_appends_json() {
    assert_eq!(
        sidecar_path(Path::new("/p/formats/csv_")),
        PathBuf::from("/p/formats/csv_.json")
    );
}

#[test]
fn render_is_deterministic_and_ordered() {
    let mtime = epoch_plus(1_700_000_000);
    let first = render(parse_object(META).expect("parse"), mtime).expect("render");
    let second = render(parse_object(META).expect("parse"), mtime).expect("render");
    assert_eq!(first, second);

    let text = String::from_utf8(first).expect("utf8");
    let name_at = text.find("\"name\"").expect("name key");
    let generated_at = text.find("\"_generated\"").expect("generated key");
    assert!(name_at < generated_at, "bookkeeping keys go last: {text}");
    assert!(text.contains("\"_binary_mtime\": 1700000000.0"), "{text}");
}

#[test]
fn parse_object_rejects_non_objects() {
    assert!(matches!(
        parse_object(b"[1,2]"),
        Err(DiscoveryError::InvalidOutput { .. })
    ));
    assert!(parse_object(b"not json").is_err());
}

#[rstest]
fn fresh_generated_sidecar_is_loaded(binary: Binary) {
    set_mtime(&binary.path, epoch_plus(1_000));
    let bytes = render(parse_object(META).expect("parse"), epoch_plus(1_000)).expect("render");
    store(&binary.path, &bytes).expect("store");
    set_mtime(&sidecar_path(&binary.path), epoch_plus(2_000));

    let cached = load_fresh(&binary.path, epoch_plus(1_000)).expect("fresh sidecar");
    assert!(cached.generated);
    assert_eq!(cached.record.name.as_deref(), Some("csv"));
    assert_eq!(cached.record.matches, vec![".*\\.csv$".to_owned()]);
}

#[rstest]
fn sidecar_older_than_binary_is_stale(binary: Binary) {
    let bytes = render(parse_object(META).expect("parse"), epoch_plus(1_000)).expect("render");
    store(&binary.path, &bytes).expect("store");
    set_mtime(&sidecar_path(&binary.path), epoch_plus(1_000));

    assert!(load_fresh(&binary.path, epoch_plus(1_500)).is_none());
}

#[rstest]
fn recorded_mtime_mismatch_is_stale(binary: Binary) {
    // The sidecar is newer on disk, but was generated for another build.
    let bytes = render(parse_object(META).expect("parse"), epoch_plus(1_000)).expect("render");
    store(&binary.path, &bytes).expect("store");
    set_mtime(&sidecar_path(&binary.path), epoch_plus(5_000));

    assert!(load_fresh(&binary.path, epoch_plus(900)).is_none());
}

#[rstest]
#[case::exact(Duration::ZERO, true)]
#[case::sub_millisecond(Duration::from_micros(400), true)]
#[case::ten_milliseconds(Duration::from_millis(10), false)]
fn recorded_mtime_tolerates_float_rounding(#[case] drift: Duration, #[case] fresh: bool) {
    let built = epoch_plus(1_700_000_000) + Duration::from_nanos(123_456_789);
    let recorded = Value::from(mtime_seconds(built));
    assert_eq!(records_mtime(Some(&recorded), built + drift), fresh);
}

#[test]
fn recorded_mtime_must_be_a_non_negative_number() {
    let now = epoch_plus(1_000);
    assert!(!records_mtime(None, now));
    assert!(!records_mtime(Some(&Value::from("1000")), now));
    assert!(!records_mtime(Some(&Value::from(-1.0)), now));
}

#[rstest]
fn hand_written_sidecar_follows_mtime_rule_only(binary: Binary) {
    let path = sidecar_path(&binary.path);
    fs::write(&path, br#"{"matches":["x"],"role":"filter"}"#).expect("write");
    set_mtime(&path, epoch_plus(3_000));

    let cached = load_fresh(&binary.path, epoch_plus(2_000)).expect("fresh");
    assert!(!cached.generated);
    assert_eq!(cached.record.role.as_deref(), Some("filter"));
}

#[rstest]
fn corrupt_sidecar_is_ignored(binary: Binary) {
    let path = sidecar_path(&binary.path);
    fs::write(&path, b"{\"matches\": [").expect("write");
    set_mtime(&path, epoch_plus(3_000));

    assert!(load_fresh(&binary.path, epoch_plus(2_000)).is_none());
}

#[rstest]
fn missing_sidecar_is_none(binary: Binary) {
    assert!(load_fresh(&binary.path, SystemTime::now()).is_none());
}

#[rstest]
fn store_replaces_existing_sidecar(binary: Binary) {
    let path = sidecar_path(&binary.path);
    fs::write(&path, b"old").expect("write");
    store(&binary.path, b"{}\n").expect("store");
    assert_eq!(fs::read(&path).expect("read"), b"{}\n");
}
