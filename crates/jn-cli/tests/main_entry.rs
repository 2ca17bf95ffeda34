//! End-to-end tests of the `jn` binary against shell handlers.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use rstest::{fixture, rstest};
use tempfile::TempDir;

/// A throwaway `jn` home with user plugins written as shell scripts.
struct Home {
    dir: TempDir,
}

impl Home {
    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn plugins(&self) -> PathBuf {
        self.path().join("plugins")
    }

    /// Installs `name` answering `--jn-meta` with `meta` and otherwise
    /// running `body`.
    fn handler(&self, name: &str, meta: &str, body: &str) -> &Self {
        let path = self.plugins().join(name);
        let script = format!(
            "#!/bin/sh\nif [ \"$1\" = \"--jn-meta\" ]; then\n  printf '%s\\n' '{meta}'\n  exit 0\nfi\n{body}\n"
        );
        fs::write(&path, script).expect("write handler");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        self
    }

    fn data(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, content).expect("write data");
        path
    }

    fn jn(&self) -> Command {
        let mut command = cargo_bin_cmd!("jn");
        command
            .env_remove("JN_LOG_FILTER")
            .env_remove("JN_LOG_FORMAT")
            .arg("--home")
            .arg(self.path())
            .arg("--project-dir")
            .arg(self.path())
            .args(["--bundled-plugins", "/nonexistent/jn-bundled"]);
        command
    }
}

#[fixture]
fn home() -> Home {
    let home = Home {
        dir: TempDir::new().expect("temp dir"),
    };
    fs::create_dir_all(home.plugins()).expect("plugin root");
    home.handler("upper_", r#"{"matches":[".*\\.txt$"]}"#, "exec tr a-z A-Z")
        .handler("fail_", r#"{"matches":[".*\\.fail$"]}"#, "cat >/dev/null\nexit 3")
        .handler("yes_", r#"{"description":"endless"}"#, "while :; do echo '{\"n\":1}'; done")
        .handler("jq_", r#"{"role":"filter"}"#, "exec grep -e \"$1\"");
    home
}

#[rstest]
fn cat_reads_a_file_through_its_handler(home: Home) {
    let data = home.data("words.txt", "alpha\nbeta\n");
    home.jn()
        .arg("cat")
        .arg(&data)
        .assert()
        .success()
        .stdout("ALPHA\nBETA\n");
}

#[rstest]
fn put_writes_through_the_handler_into_the_file(home: Home) {
    let target = home.path().join("out.txt");
    home.jn()
        .arg("put")
        .arg(&target)
        .write_stdin("gamma\n")
        .assert()
        .success();
    assert_eq!(fs::read_to_string(target).expect("read output"), "GAMMA\n");
}

#[rstest]
fn run_applies_filters_between_read_and_write(home: Home) {
    let data = home.data("words.txt", "alpha\nbeta\ngamma\n");
    home.jn()
        .arg("run")
        .arg(&data)
        .args(["-", "--filter", "BETA"])
        .assert()
        .success()
        .stdout("BETA\n");
}

#[rstest]
fn failing_stage_sets_exit_code(home: Home) {
    let data = home.data("broken.fail", "x\n");
    home.jn()
        .arg("cat")
        .arg(&data)
        .assert()
        .code(3)
        .stderr(contains("stage 'fail_' failed with exit code 3"));
}

#[rstest]
fn head_stops_an_endless_source(home: Home) {
    home.jn()
        .args(["head", "-n", "3", "@yes/stream"])
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout("{\"n\":1}\n{\"n\":1}\n{\"n\":1}\n");
}

#[rstest]
fn glob_address_is_served_by_the_glob_handler(home: Home) {
    home.handler(
        "glob_",
        r#"{"role":"protocol","modes":["read"],"manages_parameters":true}"#,
        "for arg; do pattern=$arg; done\nfor file in $pattern; do cat \"$file\"; done",
    );
    fs::create_dir_all(home.path().join("logs")).expect("logs dir");
    home.data("logs/a.jsonl", "{\"file\":\"a\"}\n");
    home.data("logs/b.jsonl", "{\"file\":\"b\"}\n");
    home.jn()
        .current_dir(home.path())
        .args(["cat", "logs/*.jsonl"])
        .assert()
        .success()
        .stdout("{\"file\":\"a\"}\n{\"file\":\"b\"}\n");
}

#[rstest]
fn tail_keeps_the_last_records(home: Home) {
    home.jn()
        .args(["tail", "2"])
        .write_stdin("{\"n\":1}\n{\"n\":2}\n{\"n\":3}\n")
        .assert()
        .success()
        .stdout("{\"n\":2}\n{\"n\":3}\n");
}

#[rstest]
fn tail_reads_an_address(home: Home) {
    let data = home.data("words.txt", "alpha\nbeta\ngamma\n");
    home.jn()
        .arg("tail")
        .arg("1")
        .arg(&data)
        .assert()
        .success()
        .stdout("GAMMA\n");
}

#[rstest]
fn plugin_call_runs_the_handler_directly(home: Home) {
    home.jn()
        .args(["plugin", "call", "upper"])
        .write_stdin("abc\n")
        .assert()
        .success()
        .stdout("ABC\n");
}

#[rstest]
fn plugin_call_passes_arguments_unchanged(home: Home) {
    home.jn()
        .args(["plugin", "call", "jq_", "beta"])
        .write_stdin("alpha\nbeta\n")
        .assert()
        .success()
        .stdout("beta\n");
}

#[rstest]
fn plugin_call_exits_with_the_handler_status(home: Home) {
    home.jn()
        .args(["plugin", "call", "fail_"])
        .write_stdin("x\n")
        .assert()
        .code(3);
}

#[rstest]
fn unhandled_address_reports_mode(home: Home) {
    home.jn()
        .args(["cat", "photo.png"])
        .assert()
        .code(1)
        .stderr("jn: no plugin handles 'photo.png' in read mode\n");
}

#[rstest]
fn plugin_list_writes_sidecars(home: Home) {
    let output = home
        .jn()
        .args(["plugin", "list", "--json"])
        .output()
        .expect("run jn");
    assert!(output.status.success());

    let names: Vec<String> = String::from_utf8(output.stdout)
        .expect("utf-8")
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("json line");
            value["name"].as_str().expect("name").to_owned()
        })
        .collect();
    assert_eq!(names, ["fail_", "jq_", "upper_", "yes_"]);
    assert!(home.plugins().join("upper_.json").is_file());
}

#[rstest]
fn plugin_info_accepts_name_without_underscore(home: Home) {
    home.jn()
        .args(["plugin", "info", "jq"])
        .assert()
        .success()
        .stdout(contains("\"role\": \"filter\""));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    cargo_bin_cmd!("jn").assert().code(2);
}
