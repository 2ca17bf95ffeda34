//! Shell-style glob patterns and the directory walk that expands them.
//!
//! Patterns support `*`, `?`, `[...]` classes (`[!...]` negates), `{a,b}`
//! alternation and a `**` component that spans any number of directories.
//! A pattern is translated into an anchored [`Regex`] over `/`-separated
//! paths relative to the walk root.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use super::GlobError;

const PATTERN_TARGET: &str = "jn_handlers::glob::pattern";

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    text: String,
    regex: Regex,
    /// Leading components without metacharacters, walked directly.
    literal_prefix: Vec<String>,
    /// Whether the pattern itself asks for hidden entries.
    names_hidden: bool,
    recursive: bool,
    absolute: bool,
}

impl GlobPattern {
    /// Compiles `text`, stripping an optional `glob://` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`GlobError::Pattern`] for an empty pattern, an unclosed
    /// `{` group, or a translation the regex engine rejects.
    pub fn new(text: &str) -> Result<Self, GlobError> {
        let body = text.strip_prefix("glob://").unwrap_or(text);
        let absolute = body.starts_with('/');
        let relative = body.trim_start_matches('/');
        if relative.is_empty() {
            return Err(GlobError::Pattern {
                pattern: text.to_owned(),
                reason: "pattern is empty".to_owned(),
            });
        }
        let translated = translate(relative).map_err(|reason| GlobError::Pattern {
            pattern: text.to_owned(),
            reason: reason.to_owned(),
        })?;
        let regex = Regex::new(&translated).map_err(|error| GlobError::Pattern {
            pattern: text.to_owned(),
            reason: error.to_string(),
        })?;
        let components: Vec<&str> = relative.split('/').collect();
        let literal_prefix = components
            .iter()
            .take(components.len().saturating_sub(1))
            .take_while(|component| !has_metacharacter(component))
            .map(|component| (*component).to_owned())
            .collect();
        Ok(Self {
            text: text.to_owned(),
            regex,
            literal_prefix,
            names_hidden: components.iter().any(|component| {
                component.starts_with('.') && *component != "." && *component != ".."
            }),
            recursive: components.contains(&"**"),
            absolute,
        })
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether `relative`, a `/`-separated path, matches the pattern.
    #[must_use]
    pub fn matches(&self, relative: &str) -> bool {
        self.regex.is_match(relative)
    }

    /// Lists matching files under `root`, sorted by path.
    ///
    /// Absolute patterns ignore `root`. Hidden files and directories are
    /// skipped unless `hidden` is set or the pattern names a hidden
    /// component itself. Symbolic links to directories are not followed.
    ///
    /// # Errors
    ///
    /// Returns [`GlobError::Walk`] when a directory cannot be listed.
    pub fn expand(&self, root: &Path, hidden: bool) -> Result<Vec<GlobMatch>, GlobError> {
        let walk_root = if self.absolute {
            PathBuf::from("/")
        } else {
            root.to_path_buf()
        };
        let prefix = self.literal_prefix.join("/");
        let start = walk_root.join(&prefix);
        if !start.is_dir() {
            debug!(target: PATTERN_TARGET, start = %start.display(), "glob base is not a directory");
            return Ok(Vec::new());
        }
        let mut walk = Walk {
            pattern: self,
            include_hidden: hidden || self.names_hidden,
            max_depth: if self.recursive {
                usize::MAX
            } else {
                self.depth().saturating_sub(self.literal_prefix.len())
            },
            found: Vec::new(),
        };
        walk.visit(&start, &prefix, 1)?;
        let mut found = walk.found;
        found.sort_by(|left, right| left.relative.cmp(&right.relative));
        debug!(target: PATTERN_TARGET, pattern = %self.text, files = found.len(), "expanded glob");
        Ok(found
            .into_iter()
            .map(|candidate| GlobMatch {
                display: if self.absolute {
                    format!("/{}", candidate.relative)
                } else {
                    candidate.relative
                },
                path: candidate.path,
            })
            .collect())
    }

    fn depth(&self) -> usize {
        self.text
            .strip_prefix("glob://")
            .unwrap_or(&self.text)
            .trim_start_matches('/')
            .split('/')
            .count()
    }
}

/// One file matched by a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobMatch {
    /// Path to open.
    pub path: PathBuf,
    /// `/`-separated path as reported in `_path`: relative to the root for
    /// relative patterns, absolute otherwise.
    pub display: String,
}

struct Candidate {
    path: PathBuf,
    relative: String,
}

struct Walk<'a> {
    pattern: &'a GlobPattern,
    include_hidden: bool,
    max_depth: usize,
    found: Vec<Candidate>,
}

impl Walk<'_> {
    fn visit(&mut self, directory: &Path, relative: &str, depth: usize) -> Result<(), GlobError> {
        let walk_error = |error| GlobError::Walk {
            path: directory.to_path_buf(),
            source: Arc::new(error),
        };
        for listed in fs::read_dir(directory).map_err(walk_error)? {
            let entry = listed.map_err(walk_error)?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.starts_with('.') && !self.include_hidden {
                continue;
            }
            let child = if relative.is_empty() {
                file_name
            } else {
                format!("{relative}/{file_name}")
            };
            let path = entry.path();
            let file_type = entry.file_type().map_err(walk_error)?;
            if file_type.is_dir() {
                if depth < self.max_depth {
                    self.visit(&path, &child, depth.saturating_add(1))?;
                }
            } else if path.is_file() && self.pattern.matches(&child) {
                self.found.push(Candidate {
                    path,
                    relative: child,
                });
            }
        }
        Ok(())
    }
}

fn has_metacharacter(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Translates a relative glob into an anchored regular expression.
fn translate(glob: &str) -> Result<String, &'static str> {
    let mut out = String::from("^");
    let chars: Vec<char> = glob.chars().collect();
    let mut index = 0;
    let mut groups = 0_usize;
    while let Some(&current) = chars.get(index) {
        index = index.saturating_add(1);
        match current {
            '*' if chars.get(index) == Some(&'*') => {
                index = index.saturating_add(1);
                if chars.get(index) == Some(&'/') {
                    index = index.saturating_add(1);
                    out.push_str("(?:[^/]+/)*");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => index = push_class(&chars, index, &mut out),
            '{' => {
                groups = groups.saturating_add(1);
                out.push_str("(?:");
            }
            ',' if groups > 0 => out.push('|'),
            '}' if groups > 0 => {
                groups = groups.saturating_sub(1);
                out.push(')');
            }
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    if groups > 0 {
        return Err("unclosed '{' group");
    }
    out.push('$');
    Ok(out)
}

/// Appends a `[...]` class starting after the `[` at `start`, returning the
/// index after the closing `]`. An unclosed class is a literal `[`.
fn push_class(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut cursor = start;
    let negated = matches!(chars.get(cursor), Some('!' | '^'));
    if negated {
        cursor = cursor.saturating_add(1);
    }
    let body_start = cursor;
    // A leading `]` is part of the class.
    if chars.get(cursor) == Some(&']') {
        cursor = cursor.saturating_add(1);
    }
    while chars.get(cursor).is_some_and(|&member| member != ']') {
        cursor = cursor.saturating_add(1);
    }
    if chars.get(cursor).is_none() {
        out.push_str(r"\[");
        return start;
    }
    out.push('[');
    if negated {
        out.push('^');
    }
    for &member in chars.get(body_start..cursor).unwrap_or_default() {
        if matches!(member, '\\' | '[' | ']' | '^' | '&' | '~') {
            out.push('\\');
        }
        out.push(member);
    }
    out.push(']');
    cursor.saturating_add(1)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    #[case::star("*.jsonl", "a.jsonl", true)]
    #[case::star_stays_in_directory("*.jsonl", "logs/a.jsonl", false)]
    #[case::question("day?.jsonl", "day1.jsonl", true)]
    #[case::question_needs_one("day?.jsonl", "day.jsonl", false)]
    #[case::class("day[12].jsonl", "day2.jsonl", true)]
    #[case::negated_class("day[!12].jsonl", "day2.jsonl", false)]
    #[case::alternation("*.{json,jsonl}", "a.json", true)]
    #[case::double_star_zero_dirs("logs/**/*.jsonl", "logs/a.jsonl", true)]
    #[case::double_star_many_dirs("logs/**/*.jsonl", "logs/2024/01/a.jsonl", true)]
    #[case::dot_is_literal("a.jsonl", "abjsonl", false)]
    #[case::unclosed_class_is_literal("a[.jsonl", "a[.jsonl", true)]
    fn glob_matching(#[case] glob: &str, #[case] path: &str, #[case] expected: bool) {
        let pattern = GlobPattern::new(glob).expect("valid pattern");
        assert_eq!(pattern.matches(path), expected, "{glob} vs {path}");
    }

    #[rstest]
    #[case::empty("")]
    #[case::scheme_only("glob://")]
    #[case::unclosed_group("*.{json")]
    fn invalid_patterns_are_rejected(#[case] glob: &str) {
        assert!(matches!(
            GlobPattern::new(glob),
            Err(GlobError::Pattern { .. })
        ));
    }

    fn tree(files: &[&str]) -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        for file in files {
            let path = dir.path().join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("mkdir");
            }
            fs::write(&path, "{}\n").expect("write");
        }
        dir
    }

    fn expanded(dir: &TempDir, glob: &str, hidden: bool) -> Vec<String> {
        GlobPattern::new(glob)
            .expect("pattern")
            .expand(dir.path(), hidden)
            .expect("expand")
            .into_iter()
            .map(|found| found.display)
            .collect()
    }

    #[test]
    fn expansion_is_sorted_and_limited_to_files() {
        let dir = tree(&["logs/b.jsonl", "logs/a.jsonl", "logs/c.csv", "logs/sub/d.jsonl"]);
        assert_eq!(
            expanded(&dir, "logs/*.jsonl", false),
            ["logs/a.jsonl", "logs/b.jsonl"]
        );
    }

    #[test]
    fn double_star_descends() {
        let dir = tree(&["logs/a.jsonl", "logs/sub/d.jsonl", "logs/sub/deeper/e.jsonl"]);
        assert_eq!(
            expanded(&dir, "logs/**/*.jsonl", false),
            ["logs/a.jsonl", "logs/sub/d.jsonl", "logs/sub/deeper/e.jsonl"]
        );
    }

    #[test]
    fn hidden_entries_need_opting_in() {
        let dir = tree(&["data/a.jsonl", "data/.cache/b.jsonl", "data/.c.jsonl"]);
        assert_eq!(expanded(&dir, "data/**/*.jsonl", false), ["data/a.jsonl"]);
        assert_eq!(
            expanded(&dir, "data/**/*.jsonl", true),
            ["data/.c.jsonl", "data/.cache/b.jsonl", "data/a.jsonl"]
        );
        assert_eq!(expanded(&dir, "data/.cache/*.jsonl", false), ["data/.cache/b.jsonl"]);
    }

    #[test]
    fn missing_base_directory_matches_nothing() {
        let dir = tree(&[]);
        assert!(expanded(&dir, "absent/*.jsonl", false).is_empty());
    }
}
