//! Plugin search roots.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Where a search root comes from. Earlier scopes take priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootScope {
    /// `<project>/.jn/plugins`
    Project,
    /// `<home>/plugins`
    User,
    /// Plugins installed with the executable.
    Bundled,
}

impl RootScope {
    /// Lowercase label used in listings and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::User => "user",
            Self::Bundled => "bundled",
        }
    }
}

impl fmt::Display for RootScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directory scanned for plugins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoot {
    path: PathBuf,
    scope: RootScope,
}

impl SearchRoot {
    /// Builds a root.
    pub fn new(path: impl Into<PathBuf>, scope: RootScope) -> Self {
        Self {
            path: path.into(),
            scope,
        }
    }

    /// Directory to scan.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Priority class of the root.
    #[must_use]
    pub const fn scope(&self) -> RootScope {
        self.scope
    }
}
