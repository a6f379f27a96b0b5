//! Built-in ignore rules and `.gitignore` parsing.

use super::pattern::Pattern;

/// Paths that are never processed, whatever the user configures.
pub const ALWAYS_IGNORE_PATTERNS: &[&str] = &[
    ".git/",
    ".svn/",
    ".hg/",
    "node_modules/",
    "bower_components/",
    "vendor/",
    "dist/",
    "build/",
    "out/",
    "target/",
    "coverage/",
    "__pycache__/",
    "*.pyc",
    ".DS_Store",
    "Thumbs.db",
    ".env",
    ".idea/",
    ".vscode/",
    "*.log",
    "*.tmp",
    "*.temp",
    "package-lock.json",
    "yarn.lock",
];

/// The ordered rules of a root `.gitignore`, comments and blank lines removed.
///
/// Negation lines (`!pattern`) are kept so they can be reported, but they are
/// inert: they never re-include a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitignoreRuleSet {
    rules: Vec<String>,
}

impl GitignoreRuleSet {
    pub fn parse(content: &str) -> Self {
        let rules = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Rules that take part in matching (everything but negations).
    pub fn active_rules(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .map(String::as_str)
            .filter(|rule| !rule.starts_with('!'))
    }

    pub fn negated_count(&self) -> usize {
        self.rules.iter().filter(|rule| rule.starts_with('!')).count()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Compiles a list of `.gitignore`-style patterns, skipping blanks and comments.
pub fn compile_patterns<'a, I>(patterns: I) -> Vec<Pattern>
where
    I: IntoIterator<Item = &'a str>,
{
    patterns
        .into_iter()
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty() && !pattern.starts_with('#'))
        .map(Pattern::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drops_comments_and_blank_lines() {
        let rules = GitignoreRuleSet::parse("# build output\n\nbuild/\n  *.log  \r\n!keep.log\n");
        assert_eq!(rules.rules(), ["build/", "*.log", "!keep.log"]);
        assert_eq!(rules.len(), 3);
        assert_eq!(rules.negated_count(), 1);
    }

    #[test]
    fn negations_are_not_active() {
        let rules = GitignoreRuleSet::parse("*.log\n!important.log\n");
        let active: Vec<_> = rules.active_rules().collect();
        assert_eq!(active, ["*.log"]);
    }

    #[test]
    fn empty_content_yields_no_rules() {
        assert!(GitignoreRuleSet::parse("").is_empty());
        assert!(GitignoreRuleSet::parse("# only a comment\n").is_empty());
    }

    #[test]
    fn compile_patterns_skips_blank_entries() {
        let compiled = compile_patterns(["*.rs", "  ", "# note", "docs/"]);
        let raw: Vec<_> = compiled.iter().map(Pattern::as_str).collect();
        assert_eq!(raw, ["*.rs", "docs/"]);
    }
}
