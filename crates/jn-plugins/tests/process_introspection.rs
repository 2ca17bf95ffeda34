//! Discovery against real handler processes.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use jn_config::{RootScope, SearchRoot};
use jn_plugins::{
    DiscoveryError, Introspector, PluginKind, PluginMode, PluginRegistry, ProcessIntrospector,
    sidecar,
};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_millis(500);

struct Root {
    dir: TempDir,
}

impl Root {
    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn handler(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write handler");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    fn registry(&self) -> PluginRegistry {
        PluginRegistry::discover(
            &[SearchRoot::new(self.path(), RootScope::User)],
            &ProcessIntrospector::new(TIMEOUT),
        )
    }
}

#[fixture]
fn root() -> Root {
    Root {
        dir: TempDir::new().expect("temp dir"),
    }
}

fn answering(json: &str) -> String {
    format!(
        "if [ \"$1\" = \"--jn-meta\" ]; then\n  printf '%s\\n' '{json}'\n  exit 0\nfi\nexit 2"
    )
}

#[rstest]
fn introspection_captures_stdout(root: Root) {
    let binary = root.handler("csv_", &answering(r#"{"matches":[".*\\.csv$"]}"#));
    let output = ProcessIntrospector::new(TIMEOUT)
        .introspect(&binary)
        .expect("introspection succeeds");
    assert_eq!(output, b"{\"matches\":[\".*\\\\.csv$\"]}\n");
}

#[rstest]
fn slow_handler_is_killed_after_timeout(root: Root) {
    let binary = root.handler("slow_", "exec sleep 30");
    let started = Instant::now();
    let err = ProcessIntrospector::new(Duration::from_millis(200))
        .introspect(&binary)
        .expect_err("handler never answers");
    assert!(matches!(err, DiscoveryError::Timeout { .. }), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[rstest]
fn background_child_holding_stdout_does_not_outlive_timeout(root: Root) {
    let binary = root.handler("lingering_", "sleep 6 &\nprintf '{}'\nexit 0");
    let started = Instant::now();
    let err = ProcessIntrospector::new(Duration::from_millis(300))
        .introspect(&binary)
        .expect_err("stdout stays open past the deadline");
    assert!(matches!(err, DiscoveryError::Timeout { .. }), "{err:?}");
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "took {:?}",
        started.elapsed()
    );
}

#[rstest]
fn failing_handler_reports_exit_status(root: Root) {
    let binary = root.handler("fail_", "echo oops >&2\nexit 3");
    let err = ProcessIntrospector::new(TIMEOUT)
        .introspect(&binary)
        .expect_err("handler fails");
    assert!(
        matches!(err, DiscoveryError::NonZeroExit { code: Some(3) }),
        "{err:?}"
    );
}

#[rstest]
fn broken_handlers_do_not_block_discovery(root: Root) {
    root.handler("csv_", &answering(r#"{"matches":[".*\\.csv$"]}"#));
    root.handler("garbage_", "echo 'not json'");
    root.handler("fail_", "exit 1");
    root.handler("slow_", "exec sleep 30");

    let registry = root.registry();
    let names: Vec<&str> = registry.iter().map(|plugin| plugin.name()).collect();
    assert_eq!(names, vec!["csv_"]);

    let address = jn_address::resolve("people.csv").expect("address");
    let plugin = registry
        .match_address(&address, None, PluginMode::Read)
        .expect("csv_ matches");
    assert_eq!(plugin.kind(), PluginKind::NativeBinary);
    assert!(plugin.is_generated());
}

#[rstest]
fn sidecar_is_stable_across_regeneration(root: Root) {
    let binary = root.handler(
        "jsonl_",
        &answering(r#"{"name":"jsonl","matches":[".*\\.jsonl$"],"modes":["read","write"]}"#),
    );
    let sidecar_path = sidecar::sidecar_path(&binary);

    root.registry();
    let first = fs::read(&sidecar_path).expect("sidecar written");
    fs::remove_file(&sidecar_path).expect("remove sidecar");
    root.registry();
    let second = fs::read(&sidecar_path).expect("sidecar rewritten");

    assert_eq!(first, second);
}

#[rstest]
fn hand_written_sidecar_is_used_without_running_binary(root: Root) {
    let binary = root.handler("tsv_", "exit 1");
    fs::write(
        sidecar::sidecar_path(&binary),
        r#"{"matches": [".*\\.tsv$"], "modes": ["read"]}"#,
    )
    .expect("write sidecar");

    let registry = root.registry();
    let plugin = registry.require("tsv").expect("tsv_ registered");
    assert!(!plugin.is_generated());
    assert!(plugin.supports(PluginMode::Read));
    assert!(!plugin.supports(PluginMode::Write));
}
