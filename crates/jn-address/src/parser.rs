//! Reference parsing.

use std::collections::BTreeMap;

use url::{Url, form_urlencoded};

use crate::address::{Address, AddressKind, Compression, ProfileRef};
use crate::error::AddressError;

const STDIO_ALIASES: [&str; 3] = ["-", "stdin", "stdout"];
const GLOB_METACHARACTERS: [char; 3] = ['*', '?', '['];

/// Shorthand variants that expand into a format parameter.
const VARIANT_PARAMS: [(&str, &str); 1] = [("table", "tablefmt")];

/// Resolves a user reference into an [`Address`].
///
/// The grammar is `base[~format[.variant]][?k=v&...]`, where the
/// parameters belong to the format suffix. The suffix is split off only
/// when `format` is a bare identifier, so paths like `~/data.csv` or
/// `https://host/~user/x.json` keep their tilde.
///
/// # Errors
///
/// Returns [`AddressError::Empty`] for blank input and
/// [`AddressError::MalformedProfile`] for an `@` reference without both a
/// namespace and a name.
pub fn resolve(reference: &str) -> Result<Address, AddressError> {
    let raw = reference.trim();
    if raw.is_empty() {
        return Err(AddressError::Empty);
    }

    let (base, suffix) = split_format_suffix(raw);
    if base.is_empty() {
        return Err(AddressError::Empty);
    }

    let kind = classify(base);
    let profile = match kind {
        AddressKind::Profile => Some(parse_profile(raw, base)?),
        _ => None,
    };
    let (compression, inferred_format) = match kind {
        AddressKind::LocalFile => formats_from_path(base),
        AddressKind::Remote => formats_from_path(&remote_path(base)),
        _ => (None, None),
    };
    let (explicit_format, format_params) = suffix.map_or_else(
        || (None, BTreeMap::new()),
        |explicit| (Some(explicit.format), explicit.params),
    );

    Ok(Address {
        raw: raw.to_owned(),
        kind,
        raw_path: base.to_owned(),
        explicit_format,
        format_params,
        compression,
        inferred_format,
        profile,
    })
}

struct FormatSuffix {
    format: String,
    params: BTreeMap<String, String>,
}

fn split_format_suffix(raw: &str) -> (&str, Option<FormatSuffix>) {
    let Some((base, token)) = raw.rsplit_once('~') else {
        return (raw, None);
    };
    let (spec, query) = match token.split_once('?') {
        Some((spec, query)) => (spec, Some(query)),
        None => (token, None),
    };
    let (format, variant) = match spec.split_once('.') {
        Some((format, variant)) => (format, Some(variant)),
        None => (spec, None),
    };
    if !is_identifier(format) || variant.is_some_and(|v| !is_variant(v)) {
        return (raw, None);
    }

    let mut params = query.map(parse_query).unwrap_or_default();
    if let Some(value) = variant
        && let Some((_, key)) = VARIANT_PARAMS.iter().find(|(name, _)| *name == format)
    {
        params.insert((*key).to_owned(), value.to_owned());
    }
    (
        base,
        Some(FormatSuffix {
            format: format.to_owned(),
            params,
        }),
    )
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_variant(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Decodes a query string; repeated keys are joined with commas.
fn parse_query(query: &str) -> BTreeMap<String, String> {
    let mut params: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(key.into_owned())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    params
}

fn classify(base: &str) -> AddressKind {
    if STDIO_ALIASES.contains(&base) {
        AddressKind::StdStream
    } else if base.starts_with('@') {
        AddressKind::Profile
    } else if has_scheme(base) {
        AddressKind::Remote
    } else if base.contains(GLOB_METACHARACTERS) {
        AddressKind::Glob
    } else {
        AddressKind::LocalFile
    }
}

/// Matches `^[a-zA-Z][a-zA-Z0-9+.-]*://`.
fn has_scheme(base: &str) -> bool {
    let Some((scheme, _)) = base.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

fn parse_profile(raw: &str, base: &str) -> Result<ProfileRef, AddressError> {
    let malformed = |reason| AddressError::MalformedProfile {
        reference: raw.to_owned(),
        reason,
    };
    let body = base.strip_prefix('@').unwrap_or(base);
    let (path, query) = match body.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (body, None),
    };
    let Some((namespace, name)) = path.split_once('/') else {
        return Err(malformed("expected @namespace/name"));
    };
    if namespace.is_empty() {
        return Err(malformed("namespace is empty"));
    }
    if name.is_empty() {
        return Err(malformed("name is empty"));
    }
    Ok(ProfileRef {
        namespace: namespace.to_owned(),
        name: name.to_owned(),
        query_params: query.map(parse_query).unwrap_or_default(),
    })
}

/// Path component of a remote locator, without query or fragment.
fn remote_path(base: &str) -> String {
    Url::parse(base).map_or_else(
        |_| {
            base.split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_owned()
        },
        |url| url.path().to_owned(),
    )
}

/// Reads compression and format from the final path segment.
///
/// `data.csv.gz` yields `(Some(Gzip), Some("csv"))`.
fn formats_from_path(path: &str) -> (Option<Compression>, Option<String>) {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let Some((stem, extension)) = split_extension(file_name) else {
        return (None, None);
    };
    match Compression::from_extension(extension) {
        Some(compression) => (
            Some(compression),
            split_extension(stem).map(|(_, inner)| inner.to_ascii_lowercase()),
        ),
        None => (None, Some(extension.to_ascii_lowercase())),
    }
}

fn split_extension(file_name: &str) -> Option<(&str, &str)> {
    file_name
        .rsplit_once('.')
        .filter(|(stem, extension)| !stem.is_empty() && !extension.is_empty())
}
