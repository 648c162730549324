//! Ordered glob pattern lists
//!
//! A `PatternList` holds user-registered globs in registration order. Matching
//! follows ripgrep/gitignore semantics: `*`, `**` and `!negation` are supported
//! and the last pattern that matches a path decides the outcome.

use std::path::{Component, Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;

/// Outcome of matching a path against a [`PatternList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternMatch<'a> {
    /// No pattern matched the path
    None,
    /// The last matching pattern was a positive pattern
    Matched(&'a str),
    /// The last matching pattern was a `!negation`
    Negated(&'a str),
}

impl<'a> PatternMatch<'a> {
    pub fn is_match(&self) -> bool {
        matches!(self, PatternMatch::Matched(_))
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, PatternMatch::Negated(_))
    }

    /// The pattern that decided the match, as registered.
    pub fn pattern(&self) -> Option<&'a str> {
        match self {
            PatternMatch::None => None,
            PatternMatch::Matched(p) | PatternMatch::Negated(p) => Some(p),
        }
    }
}

/// Errors raised when registering a pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,

    #[error("invalid glob '{pattern}': {message}")]
    Invalid { pattern: String, message: String },
}

/// Ordered, last-match-wins glob list.
#[derive(Debug, Clone)]
pub struct PatternList {
    patterns: Vec<String>,
    case_sensitive: bool,
    matcher: Gitignore,
}

impl Default for PatternList {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PatternList {
    /// Create an empty list (matches nothing).
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            patterns: Vec::new(),
            case_sensitive,
            matcher: Gitignore::empty(),
        }
    }

    /// Build a list from patterns in order, stopping at the first invalid one.
    pub fn from_patterns<I, S>(patterns: I, case_sensitive: bool) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new(case_sensitive);
        for pattern in patterns {
            list.add(pattern.as_ref())?;
        }
        Ok(list)
    }

    /// Register a pattern at the end of the list.
    ///
    /// An invalid pattern is rejected without touching the existing patterns.
    pub fn add(&mut self, pattern: &str) -> Result<(), PatternError> {
        let pattern = pattern.trim();
        if pattern.is_empty() || pattern == "!" {
            return Err(PatternError::Empty);
        }

        let mut candidate = self.patterns.clone();
        candidate.push(pattern.to_string());
        self.matcher = build_matcher(&candidate, self.case_sensitive)?;
        self.patterns = candidate;
        Ok(())
    }

    /// Match a path relative to the list's root. Parent directories are
    /// considered so that `drafts/` also covers `drafts/post.md`.
    pub fn matches(&self, rel_path: &Path) -> PatternMatch<'_> {
        if self.patterns.is_empty() {
            return PatternMatch::None;
        }
        let rel = normalize_relative(rel_path);
        if rel.as_os_str().is_empty() {
            return PatternMatch::None;
        }
        match self.matcher.matched_path_or_any_parents(&rel, false) {
            Match::None => PatternMatch::None,
            Match::Ignore(glob) => PatternMatch::Matched(glob.original()),
            Match::Whitelist(glob) => PatternMatch::Negated(glob.original()),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.iter().any(|p| p == pattern.trim())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn build_matcher(patterns: &[String], case_sensitive: bool) -> Result<Gitignore, PatternError> {
    let mut builder = GitignoreBuilder::new("");
    builder
        .case_insensitive(!case_sensitive)
        .map_err(|e| PatternError::Invalid {
            pattern: String::new(),
            message: e.to_string(),
        })?;

    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .map_err(|e| PatternError::Invalid {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
    }

    builder.build().map_err(|e| PatternError::Invalid {
        pattern: patterns.last().cloned().unwrap_or_default(),
        message: e.to_string(),
    })
}

/// Strip roots, `.` and `..` so the matcher only ever sees a relative path.
pub(crate) fn normalize_relative(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_matches_nothing() {
        let list = PatternList::default();
        assert_eq!(list.matches(Path::new("anything.html")), PatternMatch::None);
        assert!(list.is_empty());
    }

    #[test]
    fn last_matching_pattern_wins() {
        let list = PatternList::from_patterns(["assets/**", "!assets/secret/**"], true).unwrap();

        assert_eq!(
            list.matches(Path::new("assets/logo.png")),
            PatternMatch::Matched("assets/**")
        );
        assert_eq!(
            list.matches(Path::new("assets/secret/x.png")),
            PatternMatch::Negated("!assets/secret/**")
        );
    }

    #[test]
    fn later_positive_overrides_earlier_negation() {
        let list =
            PatternList::from_patterns(["!drafts/**", "drafts/keep.md"], true).unwrap();
        assert!(list.matches(Path::new("drafts/keep.md")).is_match());
        assert!(list.matches(Path::new("drafts/other.md")).is_negated());
    }

    #[test]
    fn unanchored_glob_matches_any_depth() {
        let list = PatternList::from_patterns(["*.bak"], true).unwrap();
        assert!(list.matches(Path::new("a/b/c.bak")).is_match());
        assert!(!list.matches(Path::new("a/b/c.md")).is_match());
    }

    #[test]
    fn directory_pattern_covers_children() {
        let list = PatternList::from_patterns(["drafts/"], true).unwrap();
        assert!(list.matches(Path::new("drafts/wip/post.md")).is_match());
    }

    #[test]
    fn case_insensitive_matching() {
        let sensitive = PatternList::from_patterns(["*.PNG"], true).unwrap();
        let insensitive = PatternList::from_patterns(["*.PNG"], false).unwrap();
        assert!(!sensitive.matches(Path::new("logo.png")).is_match());
        assert!(insensitive.matches(Path::new("logo.png")).is_match());
    }

    #[test]
    fn invalid_pattern_is_rejected_and_list_unchanged() {
        let mut list = PatternList::from_patterns(["*.tmp"], true).unwrap();
        let err = list.add("assets/{oops").unwrap_err();
        assert!(matches!(err, PatternError::Invalid { .. }));
        assert!(err.to_string().contains("assets/{oops"));
        assert_eq!(list.len(), 1);
        assert!(list.matches(Path::new("x.tmp")).is_match());
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let mut list = PatternList::default();
        assert_eq!(list.add("   "), Err(PatternError::Empty));
    }

    #[test]
    fn absolute_and_dotted_paths_are_normalized() {
        let list = PatternList::from_patterns(["assets/**"], true).unwrap();
        assert!(list.matches(Path::new("/assets/a.css")).is_match());
        assert!(list.matches(Path::new("./assets/a.css")).is_match());
    }
}
