//! Process-level tests for the reference handlers.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use predicates::str::contains;
use rstest::rstest;
use tempfile::TempDir;

#[rstest]
#[case::jsonl("jsonl_", "jsonl", "format")]
#[case::head("head_", "head", "filter")]
#[case::glob("glob_", "glob", "protocol")]
fn answers_capability_request(#[case] binary: &str, #[case] name: &str, #[case] role: &str) {
    let output = match binary {
        "jsonl_" => cargo_bin_cmd!("jsonl_"),
        "glob_" => cargo_bin_cmd!("glob_"),
        _ => cargo_bin_cmd!("head_"),
    }
    .arg("--jn-meta")
    .output()
    .expect("run handler");

    assert!(output.status.success());
    let meta: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json meta");
    assert_eq!(meta["name"], name);
    assert_eq!(meta["role"], role);
    assert!(meta["container_mode"].is_null());
}

#[test]
fn jsonl_read_compacts_records() {
    cargo_bin_cmd!("jsonl_")
        .arg("--mode=read")
        .write_stdin("{ \"a\": 1 }\n\n{\"b\" : [1, 2]}\n")
        .assert()
        .success()
        .stdout("{\"a\":1}\n{\"b\":[1,2]}\n");
}

#[test]
fn jsonl_write_accepts_space_separated_mode() {
    cargo_bin_cmd!("jsonl_")
        .args(["--mode", "write"])
        .write_stdin("{\"a\":1}\n")
        .assert()
        .success()
        .stdout("{\"a\":1}\n");
}

#[test]
fn jsonl_invalid_line_exits_one() {
    cargo_bin_cmd!("jsonl_")
        .arg("--mode=read")
        .write_stdin("{\"a\":1}\nnot json\n")
        .assert()
        .code(1)
        .stderr(contains("line 2"));
}

#[rstest]
#[case::missing_mode(&[][..])]
#[case::unknown_mode(&["--mode=raw"][..])]
#[case::unknown_flag(&["--mode=read", "--delimiter=;"][..])]
fn jsonl_usage_errors_exit_two(#[case] args: &[&str]) {
    cargo_bin_cmd!("jsonl_")
        .args(args)
        .write_stdin("")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty());
}

#[rstest]
#[case::default_limit(None, 10)]
#[case::explicit_limit(Some("3"), 3)]
#[case::zero(Some("0"), 0)]
fn head_keeps_requested_lines(#[case] lines: Option<&str>, #[case] expected: usize) {
    let input: String = (0..25).map(|n| format!("{{\"n\":{n}}}\n")).collect();
    let mut command = cargo_bin_cmd!("head_");
    if let Some(count) = lines {
        command.args(["--lines", count]);
    }
    let output = command.write_stdin(input).output().expect("run head_");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8");
    assert_eq!(stdout.lines().count(), expected);
    assert!(expected == 0 || stdout.starts_with("{\"n\":0}\n"));
}

#[test]
fn head_rejects_non_numeric_limit() {
    cargo_bin_cmd!("head_")
        .args(["-n", "many"])
        .assert()
        .code(2);
}

fn log_tree() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    std::fs::create_dir_all(dir.path().join("logs/old")).expect("mkdir");
    std::fs::write(dir.path().join("logs/a.jsonl"), "{\"n\":1}\n").expect("write");
    std::fs::write(dir.path().join("logs/b.jsonl"), "{\"n\":2}\n{\"n\":3}\n").expect("write");
    std::fs::write(dir.path().join("logs/old/c.jsonl"), "{\"n\":4}\n").expect("write");
    dir
}

#[test]
fn glob_reads_matching_files_in_order() {
    let dir = log_tree();
    let output = cargo_bin_cmd!("glob_")
        .current_dir(dir.path())
        .args(["--mode=read", "logs/*.jsonl"])
        .output()
        .expect("run glob_");

    assert!(output.status.success(), "{output:?}");
    let records: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .expect("utf-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json"))
        .collect();
    let seen: Vec<(&str, u64)> = records
        .iter()
        .map(|record| {
            (
                record["_filename"].as_str().expect("filename"),
                record["n"].as_u64().expect("n"),
            )
        })
        .collect();
    assert_eq!(seen, [("a.jsonl", 1), ("b.jsonl", 2), ("b.jsonl", 3)]);
}

#[test]
fn glob_root_and_limits_are_flags() {
    let dir = log_tree();
    cargo_bin_cmd!("glob_")
        .arg("--mode=read")
        .arg(format!("--root={}", dir.path().display()))
        .args(["--limit=1", "glob://logs/**/*.jsonl"])
        .assert()
        .success()
        .stdout(contains("\"_path\":\"logs/a.jsonl\"").and(contains("\"n\":2").not()));
}

#[test]
fn glob_without_pattern_is_a_usage_error() {
    cargo_bin_cmd!("glob_")
        .arg("--mode=read")
        .assert()
        .code(2);
}
