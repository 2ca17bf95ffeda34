//! Plugin capability types.
//!
//! A [`PluginMetadata`] is built from an [`IntrospectionRecord`], whichever
//! way that record was obtained: a binary's `--jn-meta` answer, its cached
//! sidecar, or a script's in-source header. Records are parsed leniently;
//! an unknown role or mode never rejects the whole plugin.

use std::path::{Path, PathBuf};

use jn_config::RootScope;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::debug;

const MANIFEST_TARGET: &str = "jn_plugins::manifest";

/// How a plugin is implemented.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    /// A compiled executable that answers `--jn-meta`.
    #[strum(serialize = "binary")]
    NativeBinary,
    /// A script whose capabilities live in a comment header.
    #[strum(serialize = "script")]
    InterpretedScript,
}

/// What part of a pipeline a plugin fills.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PluginRole {
    /// Converts between a file format and NDJSON.
    #[default]
    Format,
    /// Fetches bytes from a remote locator.
    Protocol,
    /// Decompresses or compresses a byte stream.
    Compression,
    /// Transforms an NDJSON stream.
    Filter,
    /// Queries a database.
    Database,
}

impl PluginRole {
    /// Role implied by a plugin directory name such as `formats/`.
    ///
    /// Directories carry the plural of the role name, except
    /// `compression/`.
    #[must_use]
    pub fn from_directory(name: &str) -> Option<Self> {
        name.strip_suffix('s').unwrap_or(name).parse().ok()
    }
}

/// An invocation mode a plugin can serve.
///
/// The string form is the value passed as `--mode=<m>`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PluginMode {
    /// Source bytes in, NDJSON out.
    Read,
    /// NDJSON in, destination bytes out.
    Write,
    /// Bytes in, bytes out.
    Raw,
    /// Lists the profiles a plugin offers.
    Profiles,
}

/// Capability record as written by `--jn-meta` or a script header.
///
/// Every field is optional on the wire so that older or minimal handlers
/// still register.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionRecord {
    /// Self-reported name. Informational; the file name is authoritative.
    #[serde(default)]
    pub name: Option<String>,
    /// Handler version.
    #[serde(default)]
    pub version: Option<String>,
    /// One-line description.
    #[serde(default)]
    pub description: Option<String>,
    /// Regular expressions tested against addresses.
    #[serde(default)]
    pub matches: Vec<String>,
    /// Declared role.
    #[serde(default)]
    pub role: Option<String>,
    /// Declared modes; absent means read and write.
    #[serde(default)]
    pub modes: Option<Vec<String>>,
    /// Whether the handler can pass bytes through unparsed.
    #[serde(default)]
    pub supports_raw: bool,
    /// Whether the handler parses its own command line.
    #[serde(default)]
    pub manages_parameters: bool,
    /// Whether the handler can inspect containers.
    #[serde(default)]
    pub supports_container: bool,
    /// How container inspection is addressed.
    #[serde(default)]
    pub container_mode: Option<String>,
    /// Declared runtime dependencies.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Where a candidate was found and what it looks like on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOrigin {
    /// Canonical name, the file stem ending in `_`.
    pub name: String,
    /// Path of the executable or script.
    pub location: PathBuf,
    /// Implementation kind.
    pub kind: PluginKind,
    /// Root the candidate was found under.
    pub scope: RootScope,
    /// Role implied by the nearest role-named ancestor directory.
    pub directory_role: Option<PluginRole>,
}

/// Declared capability of one handler program.
#[derive(Debug, Clone, Serialize)]
pub struct PluginMetadata {
    name: String,
    location: PathBuf,
    kind: PluginKind,
    scope: RootScope,
    role: PluginRole,
    #[serde(rename = "matches")]
    match_patterns: Vec<String>,
    #[serde(skip)]
    compiled: Vec<Regex>,
    #[serde(rename = "modes")]
    supported_modes: Vec<PluginMode>,
    manages_own_parameters: bool,
    supports_raw: bool,
    #[serde(rename = "dependencies")]
    declared_dependencies: Vec<String>,
    version: Option<String>,
    description: Option<String>,
    generated: bool,
}

impl PluginMetadata {
    /// Builds metadata from a capability record.
    ///
    /// Patterns that are not valid regular expressions are dropped with a
    /// debug log, as are unknown mode names.
    #[must_use]
    pub fn from_record(origin: PluginOrigin, record: IntrospectionRecord, generated: bool) -> Self {
        let PluginOrigin {
            name,
            location,
            kind,
            scope,
            directory_role,
        } = origin;
        let role = record
            .role
            .as_deref()
            .and_then(|text| {
                let parsed = text.parse::<PluginRole>().ok();
                if parsed.is_none() {
                    debug!(target: MANIFEST_TARGET, plugin = %name, role = text, "ignoring unknown role");
                }
                parsed
            })
            .or(directory_role)
            .unwrap_or_default();
        let supported_modes = resolve_modes(&name, record.modes.as_deref(), record.supports_raw);
        let compiled = compile_patterns(&name, &record.matches);

        Self {
            name,
            location,
            kind,
            scope,
            role,
            match_patterns: record.matches,
            compiled,
            supported_modes,
            manages_own_parameters: record.manages_parameters,
            supports_raw: record.supports_raw,
            declared_dependencies: record.dependencies,
            version: record.version,
            description: record.description,
            generated,
        }
    }

    /// Returns the plugin name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path that is executed for this plugin.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Returns how the plugin is implemented.
    #[must_use]
    pub const fn kind(&self) -> PluginKind {
        self.kind
    }

    /// Returns the root the plugin was found under.
    #[must_use]
    pub const fn scope(&self) -> RootScope {
        self.scope
    }

    /// Returns the plugin role.
    #[must_use]
    pub const fn role(&self) -> PluginRole {
        self.role
    }

    /// Returns the declared match patterns, including any that failed to
    /// compile.
    #[must_use]
    pub fn match_patterns(&self) -> &[String] {
        &self.match_patterns
    }

    /// Returns the supported modes.
    #[must_use]
    pub fn supported_modes(&self) -> &[PluginMode] {
        &self.supported_modes
    }

    /// Whether the plugin can serve `mode`.
    #[must_use]
    pub fn supports(&self, mode: PluginMode) -> bool {
        self.supported_modes.contains(&mode)
    }

    /// Whether the plugin wants raw trailing arguments instead of flags.
    #[must_use]
    pub const fn manages_own_parameters(&self) -> bool {
        self.manages_own_parameters
    }

    /// Returns the declared dependencies.
    #[must_use]
    pub fn declared_dependencies(&self) -> &[String] {
        &self.declared_dependencies
    }

    /// Returns the declared version.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the declared description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the capability came from a generated sidecar or a fresh
    /// introspection.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        self.generated
    }

    /// Whether any compiled pattern matches `subject`.
    #[must_use]
    pub fn matches(&self, subject: &str) -> bool {
        self.compiled.iter().any(|pattern| pattern.is_match(subject))
    }
}

fn resolve_modes(name: &str, declared: Option<&[String]>, supports_raw: bool) -> Vec<PluginMode> {
    let mut modes = match declared {
        Some(list) => list
            .iter()
            .filter_map(|text| {
                let parsed = text.parse::<PluginMode>().ok();
                if parsed.is_none() {
                    debug!(target: MANIFEST_TARGET, plugin = name, mode = %text, "ignoring unknown mode");
                }
                parsed
            })
            .collect(),
        None => vec![PluginMode::Read, PluginMode::Write],
    };
    if supports_raw {
        modes.push(PluginMode::Raw);
    }
    modes.sort_unstable();
    modes.dedup();
    modes
}

fn compile_patterns(name: &str, patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(error) => {
                debug!(
                    target: MANIFEST_TARGET,
                    plugin = name,
                    pattern = %pattern,
                    %error,
                    "skipping invalid match pattern"
                );
                None
            }
        })
        .collect()
}
