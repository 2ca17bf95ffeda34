//! In-process tests for argument parsing and the non-spawning commands.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::process::ExitCode;

use clap::Parser;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use jn_config::Config;

use crate::cli::{Cli, Command, PluginAction};
use crate::config::ConfigLoader;
use crate::errors::AppError;
use crate::{run, run_with_loader};

struct Invocation {
    code: ExitCode,
    stdout: String,
    stderr: String,
}

#[fixture]
fn home() -> TempDir {
    TempDir::new().expect("temp dir")
}

fn invoke(home: &TempDir, args: &[&str], stdin: &str) -> Invocation {
    let root = home.path().display().to_string();
    let mut argv: Vec<OsString> = vec!["jn".into()];
    argv.extend(
        [
            "--home",
            root.as_str(),
            "--project-dir",
            root.as_str(),
            "--bundled-plugins",
            "/nonexistent/jn-bundled",
        ]
        .map(OsString::from),
    );
    argv.extend(args.iter().map(OsString::from));
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(argv, stdin.as_bytes(), &mut stdout, &mut stderr);
    Invocation {
        code,
        stdout: String::from_utf8(stdout).expect("utf-8 stdout"),
        stderr: String::from_utf8(stderr).expect("utf-8 stderr"),
    }
}

fn parse(args: &[&str]) -> Command {
    Cli::try_parse_from(std::iter::once("jn").chain(args.iter().copied()))
        .expect("arguments parse")
        .command
}

#[test]
fn cat_collects_arguments_after_separator() {
    let Command::Cat { address, args } = parse(&["cat", "data.csv", "--", "--delimiter=;", "-x"])
    else {
        panic!("expected cat");
    };
    assert_eq!(address, "data.csv");
    assert_eq!(args, ["--delimiter=;", "-x"]);
}

#[test]
fn run_collects_repeated_filters_in_order() {
    let Command::Run {
        input,
        output,
        filters,
    } = parse(&["run", "in.csv", "out.json", "--filter", ".a", "--filter", "select(.b)"])
    else {
        panic!("expected run");
    };
    assert_eq!((input.as_str(), output.as_str()), ("in.csv", "out.json"));
    assert_eq!(filters, [".a", "select(.b)"]);
}

#[rstest]
#[case::default(&["head"][..], 10, None)]
#[case::short(&["head", "-n", "3", "data.csv"][..], 3, Some("data.csv"))]
#[case::long(&["head", "--lines=7"][..], 7, None)]
fn head_arguments(#[case] args: &[&str], #[case] lines: u64, #[case] address: Option<&str>) {
    let Command::Head {
        lines: parsed,
        address: parsed_address,
    } = parse(args)
    else {
        panic!("expected head");
    };
    assert_eq!(parsed, lines);
    assert_eq!(parsed_address.as_deref(), address);
}

#[rstest]
#[case::default(&["tail"][..], 10, None)]
#[case::count(&["tail", "3"][..], 3, None)]
#[case::address(&["tail", "5", "data.csv"][..], 5, Some("data.csv"))]
fn tail_arguments(#[case] args: &[&str], #[case] lines: u64, #[case] address: Option<&str>) {
    let Command::Tail {
        lines: parsed,
        address: parsed_address,
    } = parse(args)
    else {
        panic!("expected tail");
    };
    assert_eq!(parsed, lines);
    assert_eq!(parsed_address.as_deref(), address);
}

#[test]
fn plugin_call_keeps_hyphenated_arguments() {
    let Command::Plugin {
        action: PluginAction::Call { name, args },
    } = parse(&["plugin", "call", "csv_", "--mode", "read", "-x"])
    else {
        panic!("expected plugin call");
    };
    assert_eq!(name, "csv_");
    assert_eq!(args, ["--mode", "read", "-x"]);
}

#[test]
fn plugin_list_json_flag() {
    assert!(matches!(
        parse(&["plugin", "list", "--json"]),
        Command::Plugin {
            action: PluginAction::List { json: true }
        }
    ));
}

#[rstest]
#[case::stdin_alias("-")]
#[case::stdin_word("stdin")]
fn cat_of_stdin_copies_in_process(home: TempDir, #[case] address: &str) {
    let result = invoke(&home, &["cat", address], "{\"a\":1}\n{\"a\":2}\n");
    assert_eq!(result.code, ExitCode::SUCCESS, "{}", result.stderr);
    assert_eq!(result.stdout, "{\"a\":1}\n{\"a\":2}\n");
}

#[rstest]
fn run_between_standard_streams_is_a_passthrough(home: TempDir) {
    let result = invoke(&home, &["run", "-", "-"], "{\"a\":1}\n");
    assert_eq!(result.code, ExitCode::SUCCESS, "{}", result.stderr);
    assert_eq!(result.stdout, "{\"a\":1}\n");
}

#[rstest]
#[case::default_limit(&["head"][..], 10)]
#[case::explicit(&["head", "-n", "2"][..], 2)]
#[case::zero(&["head", "-n", "0"][..], 0)]
fn head_over_stdin(home: TempDir, #[case] args: &[&str], #[case] expected: usize) {
    let input: String = (0..20).map(|n| format!("{{\"n\":{n}}}\n")).collect();
    let result = invoke(&home, args, &input);
    assert_eq!(result.code, ExitCode::SUCCESS, "{}", result.stderr);
    assert_eq!(result.stdout.lines().count(), expected);
}

#[rstest]
#[case::default_window(&["tail"][..], "{\"n\":10}")]
#[case::explicit(&["tail", "2"][..], "{\"n\":18}")]
fn tail_over_stdin(home: TempDir, #[case] args: &[&str], #[case] first: &str) {
    let input: String = (0..20).map(|n| format!("{{\"n\":{n}}}\n")).collect();
    let result = invoke(&home, args, &input);
    assert_eq!(result.code, ExitCode::SUCCESS, "{}", result.stderr);
    assert_eq!(result.stdout.lines().next(), Some(first));
    assert_eq!(result.stdout.lines().last(), Some("{\"n\":19}"));
}

#[rstest]
fn unknown_plugin_call_fails(home: TempDir) {
    let result = invoke(&home, &["plugin", "call", "csv"], "");
    assert_eq!(result.code, ExitCode::FAILURE);
    assert_eq!(result.stderr, "jn: plugin 'csv' not found in registry\n");
}

#[rstest]
fn unhandled_address_names_address_and_mode(home: TempDir) {
    let result = invoke(&home, &["cat", "photo.png"], "");
    assert_eq!(result.code, ExitCode::FAILURE);
    assert_eq!(
        result.stderr,
        "jn: no plugin handles 'photo.png' in read mode\n"
    );
}

#[rstest]
fn malformed_address_is_reported(home: TempDir) {
    let result = invoke(&home, &["cat", "   "], "");
    assert_eq!(result.code, ExitCode::FAILURE);
    assert!(result.stderr.starts_with("jn: "), "{}", result.stderr);
}

#[rstest]
fn filter_without_filter_plugin_fails(home: TempDir) {
    let result = invoke(&home, &["filter", ".a"], "{\"a\":1}\n");
    assert_eq!(result.code, ExitCode::FAILURE);
    assert!(result.stderr.contains("jq_"), "{}", result.stderr);
}

#[rstest]
fn empty_registry_lists_nothing(home: TempDir) {
    let result = invoke(&home, &["plugin", "list"], "");
    assert_eq!(result.code, ExitCode::SUCCESS);
    assert!(result.stdout.is_empty());
}

#[rstest]
fn unknown_plugin_info_fails(home: TempDir) {
    let result = invoke(&home, &["plugin", "info", "csv"], "");
    assert_eq!(result.code, ExitCode::FAILURE);
    assert_eq!(result.stderr, "jn: plugin 'csv' not found in registry\n");
}

#[rstest]
fn usage_errors_exit_two(home: TempDir) {
    let result = invoke(&home, &["frobnicate"], "");
    assert_eq!(result.code, ExitCode::from(2));
    assert!(result.stdout.is_empty());
    assert!(!result.stderr.is_empty());
}

#[rstest]
fn help_goes_to_stdout(home: TempDir) {
    let result = invoke(&home, &["--help"], "");
    assert_eq!(result.code, ExitCode::SUCCESS);
    assert!(result.stdout.contains("Usage: jn"), "{}", result.stdout);
}

/// Hands back a fixed configuration and keeps the arguments it was given.
struct RecordingLoader {
    config: Config,
    seen: RefCell<Vec<OsString>>,
}

impl ConfigLoader for RecordingLoader {
    fn load(&self, config_arguments: Vec<OsString>) -> Result<Config, AppError> {
        self.seen.replace(config_arguments);
        Ok(self.config.clone())
    }
}

#[rstest]
fn configuration_flags_reach_the_loader_only(home: TempDir) {
    let loader = RecordingLoader {
        config: Config {
            home: home.path().to_path_buf(),
            project_dir: home.path().to_path_buf(),
            bundled_plugins: Some(home.path().join("bundled")),
            ..Config::default()
        },
        seen: RefCell::new(Vec::new()),
    };
    let argv = ["jn", "--log-filter", "debug", "--home=/elsewhere", "cat", "-"];
    let stdin: &[u8] = b"{\"a\":1}\n";
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run_with_loader(
        argv.map(OsString::from),
        stdin,
        &mut stdout,
        &mut stderr,
        &loader,
    );
    assert_eq!(
        code,
        ExitCode::SUCCESS,
        "{}",
        String::from_utf8_lossy(&stderr)
    );
    assert_eq!(
        loader.seen.into_inner(),
        ["jn", "--log-filter", "debug", "--home=/elsewhere"].map(OsString::from)
    );
    assert_eq!(stdout, b"{\"a\":1}\n");
}

#[rstest]
fn configuration_flag_after_subcommand_is_a_usage_error(home: TempDir) {
    let result = invoke(&home, &["cat", "-", "--log-format", "json"], "");
    assert_eq!(result.code, ExitCode::from(2));
}

#[rstest]
fn home_config_file_is_loaded(home: TempDir) {
    fs::write(home.path().join("config.toml"), "log_format = \"yaml\"\n")
        .expect("write config");
    let result = invoke(&home, &["cat", "-"], "");
    assert_eq!(result.code, ExitCode::FAILURE);
    assert!(
        result.stderr.starts_with("jn: failed to load configuration"),
        "{}",
        result.stderr
    );
}
