//! Filesystem discovery of handler programs.
//!
//! Each search root is walked to a bounded depth in sorted order. A
//! candidate is an executable regular file whose stem ends in `_`: files
//! without an extension are native binaries, files with a script extension
//! are interpreted scripts, and anything else is ignored.
//!
//! Names are claimed in two passes over all roots in priority order,
//! binaries first. A binary therefore always shadows a script of the same
//! name, and within each kind a higher-priority root shadows a lower one.
//! A candidate that fails introspection claims nothing and is skipped.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use jn_config::SearchRoot;
use tracing::debug;

use crate::error::DiscoveryError;
use crate::introspect::Introspector;
use crate::manifest::{PluginKind, PluginMetadata, PluginOrigin, PluginRole};
use crate::script::{self, SCRIPT_EXTENSIONS};
use crate::sidecar;

const DISCOVERY_TARGET: &str = "jn_plugins::discovery";

/// Directories deeper than this below a root are not visited.
pub const MAX_DEPTH: usize = 4;

/// A file that looks like a handler.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Identity and location.
    pub origin: PluginOrigin,
    /// Modification time of the file.
    pub mtime: SystemTime,
}

/// Discovers handlers under `roots`, given in priority order.
///
/// The result has one entry per name, ordered by root priority, then kind
/// (binaries first), then walk order. Failures are logged per candidate
/// and never abort discovery.
pub fn discover(roots: &[SearchRoot], introspector: &dyn Introspector) -> Vec<PluginMetadata> {
    let per_root: Vec<Vec<Candidate>> = roots.iter().map(scan_root).collect();

    let mut claimed = HashSet::new();
    let mut found: Vec<(usize, usize, PluginMetadata)> = Vec::new();
    for kind in [PluginKind::NativeBinary, PluginKind::InterpretedScript] {
        for (root_index, candidates) in per_root.iter().enumerate() {
            for (walk_index, candidate) in candidates.iter().enumerate() {
                if candidate.origin.kind != kind || claimed.contains(&candidate.origin.name) {
                    continue;
                }
                match load(candidate, introspector) {
                    Ok(meta) => {
                        claimed.insert(meta.name().to_owned());
                        found.push((root_index, walk_index, meta));
                    }
                    Err(error) => debug!(
                        target: DISCOVERY_TARGET,
                        candidate = %candidate.origin.location.display(),
                        %error,
                        "skipping handler"
                    ),
                }
            }
        }
    }

    found.sort_by_key(|(root_index, walk_index, meta)| (*root_index, meta.kind(), *walk_index));
    found.into_iter().map(|(_, _, meta)| meta).collect()
}

/// Lists the candidates under one root without loading them.
#[must_use]
pub fn scan_root(root: &SearchRoot) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    if root.path().is_dir() {
        walk(root, root.path(), 1, None, &mut candidates);
    } else {
        debug!(target: DISCOVERY_TARGET, root = %root.path().display(), "search root missing");
    }
    candidates
}

fn walk(
    root: &SearchRoot,
    directory: &Path,
    depth: usize,
    role: Option<PluginRole>,
    out: &mut Vec<Candidate>,
) {
    let mut entries = match fs::read_dir(directory) {
        Ok(entries) => entries.filter_map(Result::ok).collect::<Vec<_>>(),
        Err(error) => {
            debug!(target: DISCOVERY_TARGET, directory = %directory.display(), %error, "cannot read directory");
            return;
        }
    };
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let Some(file_name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if is_ignored(&file_name) {
            continue;
        }
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };
        if metadata.is_dir() {
            if depth < MAX_DEPTH {
                let nested_role = PluginRole::from_directory(&file_name).or(role);
                walk(root, &path, depth + 1, nested_role, out);
            }
            continue;
        }
        if !metadata.is_file() || !is_executable(&metadata) {
            continue;
        }
        let Some((name, kind)) = classify(&file_name) else {
            continue;
        };
        let Ok(mtime) = metadata.modified() else {
            continue;
        };
        out.push(Candidate {
            origin: PluginOrigin {
                name,
                location: path,
                kind,
                scope: root.scope(),
                directory_role: role,
            },
            mtime,
        });
    }
}

fn is_ignored(file_name: &str) -> bool {
    file_name.starts_with('.')
        || file_name.starts_with("test_")
        || file_name.starts_with("__")
        || file_name.ends_with(".json")
}

/// Splits a file name into a handler name and kind.
///
/// `csv_` is a binary named `csv_`; `xlsx_.py` is a script named `xlsx_`.
#[must_use]
pub fn classify(file_name: &str) -> Option<(String, PluginKind)> {
    let (stem, kind) = match file_name.rsplit_once('.') {
        Some((stem, extension)) if SCRIPT_EXTENSIONS.contains(&extension) => {
            (stem, PluginKind::InterpretedScript)
        }
        Some(_) => return None,
        None => (file_name, PluginKind::NativeBinary),
    };
    (stem.len() > 1 && stem.ends_with('_')).then(|| (stem.to_owned(), kind))
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
const fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

fn load(candidate: &Candidate, introspector: &dyn Introspector) -> Result<PluginMetadata, DiscoveryError> {
    match candidate.origin.kind {
        PluginKind::NativeBinary => load_binary(candidate, introspector),
        PluginKind::InterpretedScript => load_script(candidate),
    }
}

fn load_binary(
    candidate: &Candidate,
    introspector: &dyn Introspector,
) -> Result<PluginMetadata, DiscoveryError> {
    let location = &candidate.origin.location;
    if let Some(cached) = sidecar::load_fresh(location, candidate.mtime) {
        debug!(target: DISCOVERY_TARGET, binary = %location.display(), "using cached manifest");
        return Ok(PluginMetadata::from_record(
            candidate.origin.clone(),
            cached.record,
            cached.generated,
        ));
    }

    let output = introspector.introspect(location)?;
    let object = sidecar::parse_object(&output)?;
    let rendered = sidecar::render(object.clone(), candidate.mtime)?;
    let record = sidecar::record_from_object(object)?;
    if let Err(error) = sidecar::store(location, &rendered) {
        debug!(
            target: DISCOVERY_TARGET,
            binary = %location.display(),
            %error,
            "could not write manifest sidecar"
        );
    }
    Ok(PluginMetadata::from_record(
        candidate.origin.clone(),
        record,
        true,
    ))
}

fn load_script(candidate: &Candidate) -> Result<PluginMetadata, DiscoveryError> {
    let location = &candidate.origin.location;
    let source = fs::read_to_string(location).map_err(DiscoveryError::io)?;
    let label = location.display().to_string();
    let record = script::parse_header(&label, &source);
    Ok(PluginMetadata::from_record(
        candidate.origin.clone(),
        record,
        false,
    ))
}
