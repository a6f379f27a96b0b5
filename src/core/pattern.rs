//! Glob-lite matching of relative paths against ignore/include patterns.
//!
//! Patterns are classified by shape, first match wins:
//!
//! 1. `dir/` matches the directory itself and everything below it.
//! 2. `/anchored` is matched from the start of the path; `*` stays inside one segment.
//! 3. `nested/path` (a `/` elsewhere) is matched anywhere in the path.
//! 4. `name` (no `/`) is matched against every single path segment.
//!
//! Patterns never fail: a wildcard that does not compile simply matches nothing.

use regex::Regex;

/// A pattern compiled once and tested against many paths.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    rule: Rule,
}

#[derive(Debug, Clone)]
enum Rule {
    Directory(String),
    AnchoredLiteral(String),
    AnchoredWildcard(Option<Regex>),
    NestedLiteral(String),
    NestedWildcard(Option<Regex>),
    SegmentLiteral(String),
    SegmentWildcard(Option<Regex>),
}

impl Pattern {
    /// Compiles `raw`; a trailing `/` marks it as a directory pattern.
    pub fn new(raw: &str) -> Self {
        Self::with_directory_flag(raw, raw.ends_with('/'))
    }

    /// Compiles `raw` with an explicit directory flag.
    pub fn with_directory_flag(raw: &str, is_directory_pattern: bool) -> Self {
        let pattern = raw.trim();

        let rule = if is_directory_pattern {
            let dir = pattern.strip_suffix('/').unwrap_or(pattern);
            Rule::Directory(dir.to_string())
        } else if let Some(anchored) = pattern.strip_prefix('/') {
            if anchored.contains('*') {
                Rule::AnchoredWildcard(compile(&format!(
                    "^{}",
                    wildcard_to_regex(anchored, "[^/]*")
                )))
            } else {
                Rule::AnchoredLiteral(anchored.to_string())
            }
        } else if pattern.contains('/') {
            if pattern.contains('*') {
                Rule::NestedWildcard(compile(&wildcard_to_regex(pattern, "[^/]*")))
            } else {
                Rule::NestedLiteral(format!("/{pattern}"))
            }
        } else if pattern.contains('*') {
            Rule::SegmentWildcard(compile(&format!(
                "^{}$",
                wildcard_to_regex(pattern, ".*")
            )))
        } else {
            Rule::SegmentLiteral(pattern.to_string())
        };

        Self {
            raw: raw.to_string(),
            rule,
        }
    }

    /// The pattern text this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Tests a slash-separated relative path against this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let normalized = path.replace('\\', "/");
        let path = normalized.as_str();

        match &self.rule {
            Rule::Directory(dir) => {
                path == dir
                    || path
                        .strip_prefix(dir.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            Rule::AnchoredLiteral(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            Rule::AnchoredWildcard(regex) | Rule::NestedWildcard(regex) => {
                regex.as_ref().is_some_and(|re| re.is_match(path))
            }
            Rule::NestedLiteral(needle) => format!("/{path}").contains(needle.as_str()),
            Rule::SegmentLiteral(name) => path.split('/').any(|segment| segment == name),
            Rule::SegmentWildcard(regex) => regex
                .as_ref()
                .is_some_and(|re| path.split('/').any(|segment| re.is_match(segment))),
        }
    }
}

/// Returns true when `path` matches `pattern`. A trailing `/` makes it a
/// directory pattern.
pub fn matches(path: &str, pattern: &str) -> bool {
    Pattern::new(pattern).matches(path)
}

/// Same as [`matches`] with the directory flag given explicitly.
pub fn matches_with(path: &str, pattern: &str, is_directory_pattern: bool) -> bool {
    Pattern::with_directory_flag(pattern, is_directory_pattern).matches(path)
}

// Only `.` is escaped; other regex syntax passes through, so `[Dd]ocs/*` works
// and something like `src(/*.rs` fails to compile and matches nothing.
fn wildcard_to_regex(pattern: &str, star: &str) -> String {
    pattern.replace('.', "\\.").replace('*', star)
}

fn compile(source: &str) -> Option<Regex> {
    match Regex::new(source) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::debug!("Ignoring pattern that does not compile ({}): {}", source, e);
            None
        }
    }
}
