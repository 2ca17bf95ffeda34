//! Plugin registry and address matching.
//!
//! The [`PluginRegistry`] holds the result of one discovery pass as an
//! ordered list: root priority first, then binaries before scripts, then
//! walk order. Matching is a linear first-match scan over that list, which
//! is ample at catalogue scale and keeps priority explicit.
//!
//! [`PluginRegistry::match_address`] selects a handler in five steps:
//!
//! 1. an explicit `~format` names the plugin `<format>_` directly;
//! 2. a glob pattern names the plugin [`GLOB_PLUGIN`];
//! 3. a profile reference tries the plugin `<namespace>_`;
//! 4. match patterns are tested against the address in registry order;
//! 5. the inferred format names a plugin as a last resort.

use jn_address::{Address, AddressKind};
use jn_config::{Config, SearchRoot};
use tracing::debug;

use crate::discovery;
use crate::error::PluginError;
use crate::introspect::{Introspector, ProcessIntrospector};
use crate::manifest::{PluginMetadata, PluginMode, PluginRole};

const REGISTRY_TARGET: &str = "jn_plugins::registry";

/// Name of the plugin that expands glob addresses.
pub const GLOB_PLUGIN: &str = "glob_";

/// Discovered plugins in priority order.
///
/// # Example
///
/// ```
/// use jn_plugins::PluginRegistry;
///
/// let registry = PluginRegistry::new();
/// assert!(registry.get("csv").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginMetadata>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already ordered list of plugins.
    ///
    /// Later entries whose name is already present are dropped, so the list
    /// order decides precedence.
    #[must_use]
    pub fn from_plugins(plugins: impl IntoIterator<Item = PluginMetadata>) -> Self {
        let mut kept: Vec<PluginMetadata> = Vec::new();
        for plugin in plugins {
            if kept.iter().all(|existing| existing.name() != plugin.name()) {
                kept.push(plugin);
            }
        }
        Self { plugins: kept }
    }

    /// Discovers plugins under `roots` using `introspector` for binaries.
    #[must_use]
    pub fn discover(roots: &[SearchRoot], introspector: &dyn Introspector) -> Self {
        let plugins = discovery::discover(roots, introspector);
        debug!(target: REGISTRY_TARGET, count = plugins.len(), "plugins discovered");
        Self { plugins }
    }

    /// Discovers plugins under the configured search roots.
    #[must_use]
    pub fn load(config: &Config) -> Self {
        let introspector = ProcessIntrospector::new(config.introspect_timeout());
        Self::discover(&config.search_roots(), &introspector)
    }

    /// Looks up a plugin by name, accepting `csv` for `csv_`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PluginMetadata> {
        self.find_exact(name).or_else(|| {
            if name.ends_with('_') {
                None
            } else {
                self.find_exact(&format!("{name}_"))
            }
        })
    }

    /// Looks up a plugin by name.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::UnknownPlugin`] when nothing is registered
    /// under `name` or `name_`.
    pub fn require(&self, name: &str) -> Result<&PluginMetadata, PluginError> {
        self.get(name).ok_or_else(|| PluginError::UnknownPlugin {
            name: name.to_owned(),
        })
    }

    /// Selects the plugin that handles `address` in `mode`.
    ///
    /// `role` restricts pattern matching to plugins of that role. Plugins
    /// named outright by the address are still checked against it. A glob
    /// without an explicit format is served only by [`GLOB_PLUGIN`].
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::UnsupportedMode`] when the address names a
    /// plugin that cannot serve `mode`, and [`PluginError::NotFound`] when
    /// no plugin handles the address.
    pub fn match_address(
        &self,
        address: &Address,
        role: Option<PluginRole>,
        mode: PluginMode,
    ) -> Result<&PluginMetadata, PluginError> {
        let role_allows = |plugin: &PluginMetadata| role.is_none_or(|wanted| plugin.role() == wanted);

        if let Some(format) = address.explicit_format()
            && let Some(plugin) = self.get(format).filter(|plugin| role_allows(plugin))
        {
            return Self::require_mode(plugin, mode);
        }

        if address.explicit_format().is_none() && address.kind() == AddressKind::Glob {
            return self
                .get(GLOB_PLUGIN)
                .filter(|plugin| role_allows(plugin))
                .ok_or_else(|| PluginError::NotFound {
                    address: address.raw().to_owned(),
                    mode,
                })
                .and_then(|plugin| Self::require_mode(plugin, mode));
        }

        if let Some(namespace) = address.profile_namespace()
            && let Some(plugin) = self
                .get(namespace)
                .filter(|plugin| role_allows(plugin) && plugin.supports(mode))
        {
            debug!(target: REGISTRY_TARGET, plugin = plugin.name(), "matched profile namespace");
            return Ok(plugin);
        }

        let subject = match_subject(address);
        if let Some(plugin) = self
            .plugins
            .iter()
            .filter(|plugin| role_allows(plugin) && plugin.supports(mode))
            .find(|plugin| plugin.matches(subject))
        {
            debug!(
                target: REGISTRY_TARGET,
                plugin = plugin.name(),
                subject,
                %mode,
                "matched address pattern"
            );
            return Ok(plugin);
        }

        if address.explicit_format().is_none()
            && let Some(format) = address.effective_format()
            && let Some(plugin) = self
                .get(format)
                .filter(|plugin| role_allows(plugin) && plugin.supports(mode))
        {
            debug!(target: REGISTRY_TARGET, plugin = plugin.name(), "matched inferred format");
            return Ok(plugin);
        }

        Err(PluginError::NotFound {
            address: address.raw().to_owned(),
            mode,
        })
    }

    /// Iterates plugins in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &PluginMetadata> {
        self.plugins.iter()
    }

    /// Returns the number of registered plugins.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` when no plugins are registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn find_exact(&self, name: &str) -> Option<&PluginMetadata> {
        self.plugins.iter().find(|plugin| plugin.name() == name)
    }

    fn require_mode(plugin: &PluginMetadata, mode: PluginMode) -> Result<&PluginMetadata, PluginError> {
        if plugin.supports(mode) {
            debug!(target: REGISTRY_TARGET, plugin = plugin.name(), "matched explicit format");
            Ok(plugin)
        } else {
            Err(PluginError::UnsupportedMode {
                name: plugin.name().to_owned(),
                mode,
            })
        }
    }
}

impl<'a> IntoIterator for &'a PluginRegistry {
    type Item = &'a PluginMetadata;
    type IntoIter = std::slice::Iter<'a, PluginMetadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.plugins.iter()
    }
}

/// The string match patterns are tested against.
///
/// Profiles match on the whole reference. Paths and locators match without
/// a trailing compression extension, so `data.csv.gz` is offered to the
/// plugin that matches `.csv`.
fn match_subject(address: &Address) -> &str {
    if address.kind() == AddressKind::Profile {
        return address.raw();
    }
    let path = address.raw_path();
    address
        .compression()
        .and_then(|codec| path.strip_suffix(codec.extension()))
        .and_then(|stem| stem.strip_suffix('.'))
        .unwrap_or(path)
}
