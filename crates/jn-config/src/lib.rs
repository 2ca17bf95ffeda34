//! Layered configuration for `jn`.
//!
//! [`Config`] derives [`OrthoConfig`], which merges four layers, lowest
//! priority first:
//!
//! 1. built-in defaults ([`defaults`]),
//! 2. a TOML file named by `--config-path` or `JN_CONFIG_PATH`,
//! 3. `JN_*` environment variables,
//! 4. command-line flags.
//!
//! The `jn` binary points `--config-path` at `<home>/config.toml` when that
//! file exists, so the home directory itself cannot come from the file.

mod defaults;
mod logging;
mod roots;
pub mod telemetry;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    CONFIG_FILE_NAME, DEFAULT_INTROSPECT_TIMEOUT_MS, DEFAULT_LOG_FILTER, HOME_DIR_NAME,
    default_bundled_plugins, default_home, default_log_filter, default_log_format,
    default_project_dir,
};
pub use self::logging::{LogFormat, LogFormatParseError};
pub use self::roots::{RootScope, SearchRoot};

/// Environment variable naming the `jn` home directory.
pub const HOME_ENV: &str = "JN_HOME";
/// Environment variable naming the project directory.
pub const PROJECT_DIR_ENV: &str = "JN_PROJECT_DIR";
/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "JN_CONFIG_PATH";

/// Settings shared by `jn` and the pipelines it runs.
///
/// ```toml
/// bundled_plugins = "/opt/jn/plugins"
/// log_filter = "jn_plugins=debug"
/// log_format = "json"
/// introspect_timeout_ms = 2000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "JN")]
pub struct Config {
    /// Directory holding `config.toml` and user plugins.
    #[ortho_config(default = default_home())]
    pub home: PathBuf,
    /// Project directory whose `.jn/plugins` takes priority.
    #[ortho_config(default = default_project_dir())]
    pub project_dir: PathBuf,
    /// Directory of plugins shipped with `jn`. Derived from the executable
    /// when unset.
    pub bundled_plugins: Option<PathBuf>,
    /// Tracing filter directive, for example `jn_plugins=debug`.
    #[ortho_config(default = default_log_filter())]
    pub log_filter: String,
    /// Log output format: `compact` or `json`.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Milliseconds a handler may take to answer `--jn-meta`.
    #[ortho_config(default = DEFAULT_INTROSPECT_TIMEOUT_MS)]
    pub introspect_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home: default_home(),
            project_dir: default_project_dir(),
            bundled_plugins: None,
            log_filter: default_log_filter(),
            log_format: default_log_format(),
            introspect_timeout_ms: DEFAULT_INTROSPECT_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// The `jn` home directory.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// The project directory.
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// The bundled plugin root: the configured one, else the directory
    /// beside the running executable.
    #[must_use]
    pub fn bundled_plugins(&self) -> Option<PathBuf> {
        self.bundled_plugins.clone().or_else(|| {
            env::current_exe()
                .ok()
                .and_then(|exe| default_bundled_plugins(&exe))
        })
    }

    /// Tracing filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Time a handler may take to answer `--jn-meta`.
    #[must_use]
    pub const fn introspect_timeout(&self) -> Duration {
        Duration::from_millis(self.introspect_timeout_ms)
    }

    /// Plugin search roots in priority order.
    ///
    /// Roots that do not exist are still listed; discovery skips them.
    #[must_use]
    pub fn search_roots(&self) -> Vec<SearchRoot> {
        let mut roots = vec![
            SearchRoot::new(
                self.project_dir.join(".jn").join("plugins"),
                RootScope::Project,
            ),
            SearchRoot::new(self.home.join("plugins"), RootScope::User),
        ];
        if let Some(bundled) = self.bundled_plugins() {
            roots.push(SearchRoot::new(bundled, RootScope::Bundled));
        }
        roots
    }

    /// Environment passed to every pipeline stage.
    #[must_use]
    pub fn stage_environment(&self) -> Vec<(&'static str, PathBuf)> {
        vec![
            (HOME_ENV, self.home.clone()),
            (PROJECT_DIR_ENV, self.project_dir.clone()),
        ]
    }
}
