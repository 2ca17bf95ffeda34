//! Handler discovery, manifest caching and address matching for `jn`.
//!
//! Handlers are independent programs whose names end in `_`. They are
//! found by walking the configured search roots, never linked or imported.
//! Each one declares its capabilities:
//!
//! * **native binaries** answer `--jn-meta` with a JSON capability record,
//!   cached in a `<binary>.json` sidecar until the binary changes;
//! * **interpreted scripts** carry the record in a `# /// script` comment
//!   header and are never executed during discovery.
//!
//! The resulting [`PluginRegistry`] is an ordered list: project plugins
//! before user plugins before bundled ones, binaries before scripts of the
//! same name. [`PluginRegistry::match_address`] picks the first entry that
//! handles an [`Address`](jn_address::Address) in the requested mode.
//!
//! # Example
//!
//! ```rust,no_run
//! use jn_address::resolve;
//! use jn_config::Config;
//! use jn_plugins::{PluginMode, PluginRegistry};
//!
//! let config = Config::default();
//! let registry = PluginRegistry::load(&config);
//! let address = resolve("data.csv")?;
//! let plugin = registry.match_address(&address, None, PluginMode::Read)?;
//! println!("{} handles {address}", plugin.name());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod discovery;
pub mod error;
pub mod introspect;
pub mod manifest;
pub mod registry;
pub mod script;
pub mod sidecar;

#[cfg(test)]
mod tests;

pub use self::error::{DiscoveryError, PluginError};
pub use self::introspect::{INTROSPECTION_FLAG, Introspector, ProcessIntrospector};
pub use self::manifest::{
    IntrospectionRecord, PluginKind, PluginMetadata, PluginMode, PluginOrigin, PluginRole,
};
pub use self::registry::{GLOB_PLUGIN, PluginRegistry};
