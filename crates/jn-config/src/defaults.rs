use std::env;
use std::path::{Path, PathBuf};

use crate::logging::LogFormat;

/// Default log filter expression. Diagnostics stay quiet unless asked for.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default time in milliseconds allowed for a handler to answer `--jn-meta`.
pub const DEFAULT_INTROSPECT_TIMEOUT_MS: u64 = 5_000;

/// Directory under the user's home that holds `jn` state.
pub const HOME_DIR_NAME: &str = ".jn";

/// Name of the optional configuration file inside the `jn` home.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Owned log filter value for the configuration defaults.
#[must_use]
pub fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// `~/.jn`, or `.jn` in the working directory when the platform reports no
/// home directory.
#[must_use]
pub fn default_home() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(HOME_DIR_NAME), |home| home.join(HOME_DIR_NAME))
}

/// The working directory, or `.` when it cannot be determined.
#[must_use]
pub fn default_project_dir() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Plugins shipped alongside the executable: `<exe dir>/../lib/jn/plugins`.
#[must_use]
pub fn default_bundled_plugins(executable: &Path) -> Option<PathBuf> {
    let exe_dir = executable.parent()?;
    Some(exe_dir.join("..").join("lib").join("jn").join("plugins"))
}
