//! The layered "should this path be processed" policy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ignore::{compile_patterns, GitignoreRuleSet, ALWAYS_IGNORE_PATTERNS};
use super::pattern::Pattern;
use crate::utils::file_detection::is_likely_binary_by_extension;

/// How user patterns are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// Only paths matching at least one pattern are kept (when patterns exist).
    Include,
    /// Paths matching any pattern are dropped.
    #[default]
    Exclude,
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "include" => Ok(FilterMode::Include),
            "exclude" => Ok(FilterMode::Exclude),
            other => Err(format!(
                "unknown filter mode '{other}' (expected 'include' or 'exclude')"
            )),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Include => f.write_str("Include"),
            FilterMode::Exclude => f.write_str("Exclude"),
        }
    }
}

/// An immutable snapshot of the filter settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub max_size_bytes: u64,
    pub user_patterns: Vec<String>,
    pub filter_mode: FilterMode,
    pub gitignore_rules: GitignoreRuleSet,
}

impl FilterConfig {
    pub fn new(max_size_bytes: u64, user_patterns: Vec<String>, filter_mode: FilterMode) -> Self {
        Self {
            max_size_bytes,
            user_patterns,
            filter_mode,
            gitignore_rules: GitignoreRuleSet::default(),
        }
    }

    pub fn with_gitignore_rules(mut self, rules: GitignoreRuleSet) -> Self {
        self.gitignore_rules = rules;
        self
    }
}

/// Splits a comma-separated pattern list, dropping empty entries.
pub fn parse_user_patterns(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .map(str::to_string)
        .collect()
}

/// Why a path was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    EmptyPath,
    AlwaysIgnored,
    TooLarge,
    BinaryExtension,
    UserPattern,
    Gitignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject(RejectReason),
}

impl Decision {
    pub fn is_accept(self) -> bool {
        matches!(self, Decision::Accept)
    }
}

/// Composes built-in ignores, size and binary checks, user patterns and
/// gitignore rules into one decision. All patterns are compiled up front.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    max_size_bytes: u64,
    filter_mode: FilterMode,
    always_ignore: Vec<Pattern>,
    user_patterns: Vec<Pattern>,
    gitignore: Vec<Pattern>,
}

impl FilterPolicy {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            max_size_bytes: config.max_size_bytes,
            filter_mode: config.filter_mode,
            always_ignore: ALWAYS_IGNORE_PATTERNS.iter().map(|p| Pattern::new(p)).collect(),
            user_patterns: compile_patterns(config.user_patterns.iter().map(String::as_str)),
            gitignore: compile_patterns(config.gitignore_rules.active_rules()),
        }
    }

    pub fn should_process(&self, path: &str, size: u64, basename: &str) -> bool {
        self.evaluate(path, size, basename).is_accept()
    }

    /// Runs the decision chain, stopping at the first rejection.
    pub fn evaluate(&self, path: &str, size: u64, basename: &str) -> Decision {
        if path.is_empty() || path == ".git" {
            return Decision::Reject(RejectReason::EmptyPath);
        }

        if self.always_ignore.iter().any(|p| p.matches(path)) {
            return Decision::Reject(RejectReason::AlwaysIgnored);
        }

        if size > self.max_size_bytes {
            return Decision::Reject(RejectReason::TooLarge);
        }

        if is_likely_binary_by_extension(basename) {
            return Decision::Reject(RejectReason::BinaryExtension);
        }

        if !self.user_patterns.is_empty() {
            let matches_any = self.user_patterns.iter().any(|p| p.matches(path));
            let rejected = match self.filter_mode {
                FilterMode::Include => !matches_any,
                FilterMode::Exclude => matches_any,
            };
            if rejected {
                return Decision::Reject(RejectReason::UserPattern);
            }
        }

        // The file defining the rules below stays inspectable.
        if path == ".gitignore" || path.ends_with("/.gitignore") {
            return Decision::Accept;
        }

        if self.gitignore.iter().any(|p| p.matches(path)) {
            return Decision::Reject(RejectReason::Gitignore);
        }

        Decision::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(patterns: &[&str], mode: FilterMode) -> FilterConfig {
        FilterConfig::new(
            1024,
            patterns.iter().map(|p| p.to_string()).collect(),
            mode,
        )
    }

    fn accepts(policy: &FilterPolicy, path: &str, size: u64) -> bool {
        let basename = path.rsplit('/').next().unwrap_or(path);
        policy.should_process(path, size, basename)
    }

    #[test]
    fn plain_file_is_accepted() {
        let policy = FilterPolicy::new(&config(&[], FilterMode::Exclude));
        assert!(policy.should_process("secret.key", 10, "secret.key"));
    }

    #[test]
    fn exclude_mode_rejects_matches() {
        let policy = FilterPolicy::new(&config(&["*.key"], FilterMode::Exclude));
        assert_eq!(
            policy.evaluate("secret.key", 10, "secret.key"),
            Decision::Reject(RejectReason::UserPattern)
        );
        assert!(accepts(&policy, "src/main.rs", 10));
    }

    #[test]
    fn include_mode_rejects_non_matches() {
        let policy = FilterPolicy::new(&config(&["*.js"], FilterMode::Include));
        assert!(!policy.should_process("secret.key", 10, "secret.key"));
        assert!(accepts(&policy, "web/app.js", 10));
    }

    #[test]
    fn include_mode_without_patterns_accepts_everything() {
        let policy = FilterPolicy::new(&config(&[], FilterMode::Include));
        assert!(accepts(&policy, "README.md", 10));
    }

    #[test]
    fn size_ceiling_is_inclusive() {
        let policy = FilterPolicy::new(&config(&[], FilterMode::Exclude));
        assert!(accepts(&policy, "exact.txt", 1024));
        assert_eq!(
            policy.evaluate("over.txt", 1025, "over.txt"),
            Decision::Reject(RejectReason::TooLarge)
        );
    }

    #[test]
    fn built_in_ignores_cannot_be_overridden() {
        let policy = FilterPolicy::new(&config(&["*"], FilterMode::Include));
        for path in [
            ".git/config",
            "node_modules/react/index.js",
            "target/debug/app.d",
            "logs/server.log",
            "web/package-lock.json",
            "config/.env",
        ] {
            assert_eq!(
                policy.evaluate(path, 1, path.rsplit('/').next().unwrap()),
                Decision::Reject(RejectReason::AlwaysIgnored),
                "{path}"
            );
        }
    }

    #[test]
    fn empty_path_and_git_sentinel_are_rejected() {
        let policy = FilterPolicy::new(&config(&[], FilterMode::Exclude));
        assert!(!policy.should_process("", 0, ""));
        assert!(!policy.should_process(".git", 0, ".git"));
    }

    #[test]
    fn binary_extensions_are_rejected_before_reading() {
        let policy = FilterPolicy::new(&config(&[], FilterMode::Exclude));
        assert_eq!(
            policy.evaluate("assets/logo.PNG", 10, "logo.PNG"),
            Decision::Reject(RejectReason::BinaryExtension)
        );
    }

    #[test]
    fn gitignore_rules_reject_but_never_the_gitignore_itself() {
        let rules = GitignoreRuleSet::parse("build/\n.gitignore\n*.gen.rs\n");
        let policy = FilterPolicy::new(
            &config(&[], FilterMode::Exclude).with_gitignore_rules(rules),
        );
        assert!(!accepts(&policy, "src/api.gen.rs", 10));
        assert!(accepts(&policy, ".gitignore", 10));
        assert!(accepts(&policy, "sub/.gitignore", 10));
        assert!(accepts(&policy, "src/api.rs", 10));
    }

    #[test]
    fn gitignore_directory_rule_rejects_everything_below() {
        let rules = GitignoreRuleSet::parse("generated/\n");
        let policy = FilterPolicy::new(
            &config(&[], FilterMode::Exclude).with_gitignore_rules(rules),
        );
        assert_eq!(
            policy.evaluate("generated/a/b.rs", 10, "b.rs"),
            Decision::Reject(RejectReason::Gitignore)
        );
        assert!(accepts(&policy, "src/generated.rs", 10));
    }

    #[test]
    fn gitignore_negations_are_inert() {
        let rules = GitignoreRuleSet::parse("*.txt\n!keep.txt\n");
        let policy = FilterPolicy::new(
            &config(&[], FilterMode::Exclude).with_gitignore_rules(rules),
        );
        assert!(!accepts(&policy, "keep.txt", 10));
    }

    #[test]
    fn user_exclude_still_applies_to_gitignore_file() {
        let policy = FilterPolicy::new(&config(&[".gitignore"], FilterMode::Exclude));
        assert!(!accepts(&policy, ".gitignore", 10));
    }

    #[test]
    fn include_match_is_still_subject_to_gitignore() {
        let rules = GitignoreRuleSet::parse("*.js\n");
        let policy = FilterPolicy::new(
            &config(&["*.js"], FilterMode::Include).with_gitignore_rules(rules),
        );
        assert_eq!(
            policy.evaluate("app.js", 10, "app.js"),
            Decision::Reject(RejectReason::Gitignore)
        );
    }

    #[test]
    fn parse_user_patterns_trims_and_drops_empty() {
        assert_eq!(
            parse_user_patterns(" *.rs, docs/ ,,  /README.md "),
            ["*.rs", "docs/", "/README.md"]
        );
        assert!(parse_user_patterns("").is_empty());
    }

    #[test]
    fn filter_mode_parses_case_insensitively() {
        assert_eq!("Include".parse::<FilterMode>(), Ok(FilterMode::Include));
        assert_eq!("exclude".parse::<FilterMode>(), Ok(FilterMode::Exclude));
        assert!("both".parse::<FilterMode>().is_err());
    }
}
