//! The parsed form of a reference.

use std::collections::BTreeMap;
use std::fmt;

use url::form_urlencoded;

use crate::error::AddressError;

/// How a reference reaches its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    /// The orchestrator's own standard input or output (`-`).
    StdStream,
    /// A path on the local filesystem.
    LocalFile,
    /// A `scheme://` locator handled by a protocol plugin.
    Remote,
    /// A named `@namespace/name` profile.
    Profile,
    /// A shell glob over local files. Readable only.
    Glob,
}

impl AddressKind {
    /// Returns the lowercase name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StdStream => "stdio",
            Self::LocalFile => "file",
            Self::Remote => "remote",
            Self::Profile => "profile",
            Self::Glob => "glob",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stream compression codec recognised from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// `.gz`
    Gzip,
    /// `.bz2`
    Bzip2,
    /// `.xz`
    Xz,
}

impl Compression {
    /// Returns the extension (without the dot), which is also the codec's
    /// plugin stem.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Bzip2 => "bz2",
            Self::Xz => "xz",
        }
    }

    pub(crate) fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "gz" => Some(Self::Gzip),
            "bz2" => Some(Self::Bzip2),
            "xz" => Some(Self::Xz),
            _ => None,
        }
    }
}

/// Coordinates of a `@namespace/name` profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRef {
    pub(crate) namespace: String,
    pub(crate) name: String,
    pub(crate) query_params: BTreeMap<String, String>,
}

impl ProfileRef {
    /// Profile namespace, usually the plugin family (`gmail`).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Profile name within the namespace (`inbox`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL-decoded query parameters.
    #[must_use]
    pub const fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query_params
    }
}

/// A resolved reference.
///
/// Built by [`resolve`](crate::resolve) and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub(crate) raw: String,
    pub(crate) kind: AddressKind,
    pub(crate) raw_path: String,
    pub(crate) explicit_format: Option<String>,
    pub(crate) format_params: BTreeMap<String, String>,
    pub(crate) compression: Option<Compression>,
    pub(crate) inferred_format: Option<String>,
    pub(crate) profile: Option<ProfileRef>,
}

impl Address {
    /// The trimmed reference exactly as supplied.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Address classification.
    #[must_use]
    pub const fn kind(&self) -> AddressKind {
        self.kind
    }

    /// Path or locator with any `~format` suffix removed.
    ///
    /// Compression extensions are kept, since this is what gets opened or
    /// fetched.
    #[must_use]
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    /// Format named by a trailing `~format` suffix.
    #[must_use]
    pub fn explicit_format(&self) -> Option<&str> {
        self.explicit_format.as_deref()
    }

    /// Parameters carried after the format suffix (`~csv?delimiter=%3B`).
    #[must_use]
    pub const fn format_params(&self) -> &BTreeMap<String, String> {
        &self.format_params
    }

    /// Compression codec implied by the path's extension.
    #[must_use]
    pub const fn compression(&self) -> Option<Compression> {
        self.compression
    }

    /// Profile coordinates, present only for [`AddressKind::Profile`].
    #[must_use]
    pub const fn profile(&self) -> Option<&ProfileRef> {
        self.profile.as_ref()
    }

    /// Shorthand for the profile namespace.
    #[must_use]
    pub fn profile_namespace(&self) -> Option<&str> {
        self.profile.as_ref().map(ProfileRef::namespace)
    }

    /// Shorthand for the profile name.
    #[must_use]
    pub fn profile_name(&self) -> Option<&str> {
        self.profile.as_ref().map(ProfileRef::name)
    }

    /// Profile query parameters; `None` for other kinds.
    #[must_use]
    pub fn query_params(&self) -> Option<&BTreeMap<String, String>> {
        self.profile.as_ref().map(ProfileRef::query_params)
    }

    /// Returns the format used to pick a handler.
    ///
    /// The explicit `~format` wins. Otherwise local files and remote
    /// locators fall back to their lowercased final extension, looking
    /// through a compression extension. Every other kind yields `None`.
    #[must_use]
    pub fn effective_format(&self) -> Option<&str> {
        self.explicit_format
            .as_deref()
            .or(self.inferred_format.as_deref())
    }

    /// Like [`Self::effective_format`], but fails instead of guessing.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::UnknownFormat`] when no format can be found.
    pub fn require_format(&self) -> Result<&str, AddressError> {
        self.effective_format()
            .ok_or_else(|| AddressError::UnknownFormat {
                reference: self.raw.clone(),
            })
    }

    /// Checks that the address may be used as a pipeline output.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::GlobOutput`] for glob patterns.
    pub fn ensure_writable(&self) -> Result<(), AddressError> {
        if matches!(self.kind, AddressKind::Glob) {
            return Err(AddressError::GlobOutput {
                pattern: self.raw_path.clone(),
            });
        }
        Ok(())
    }

    /// Whether this address is the orchestrator's own standard stream.
    #[must_use]
    pub const fn is_stdio(&self) -> bool {
        matches!(self.kind, AddressKind::StdStream)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_path)?;
        if let Some(format) = &self.explicit_format {
            write!(f, "~{format}")?;
            if !self.format_params.is_empty() {
                let mut query = form_urlencoded::Serializer::new(String::new());
                query.extend_pairs(&self.format_params);
                write!(f, "?{}", query.finish())?;
            }
        }
        Ok(())
    }
}
