//! Project ignore file value object
//!
//! The source root may carry a `.gitignore`. Its rules feed the classifier's
//! Ignore tier. A line that is not a valid glob is dropped and remembered, so
//! one typo never disables the rest of the file.

use std::fs;
use std::path::{Path, PathBuf};

use super::pattern_list::{PatternList, PatternMatch};

/// Ignore file read from the source root
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Larger ignore files are refused (64KB)
const MAX_FILE_SIZE: u64 = 64 * 1024;

/// A line of the ignore file that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub line: usize,
    pub pattern: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IgnoreError {
    #[error("{} is {size} bytes, over the {}KB limit", .path.display(), MAX_FILE_SIZE / 1024)]
    FileTooLarge { path: PathBuf, size: u64 },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rules derived from the project ignore file.
#[derive(Debug, Clone, Default)]
pub struct IgnorePatterns {
    rules: PatternList,
    origin: Option<PathBuf>,
    rejected: Vec<RejectedLine>,
}

impl IgnorePatterns {
    /// No rules; matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read `.gitignore` from `source_root`. A missing file yields no rules.
    pub fn load(source_root: &Path) -> Result<Self, IgnoreError> {
        let path = source_root.join(IGNORE_FILE_NAME);
        let size = match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return Ok(Self::empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(source) => return Err(IgnoreError::Io { path, source }),
        };
        if size > MAX_FILE_SIZE {
            return Err(IgnoreError::FileTooLarge { path, size });
        }

        match fs::read_to_string(&path) {
            Ok(content) => Ok(Self::from_content(&path, &content)),
            Err(source) => Err(IgnoreError::Io { path, source }),
        }
    }

    /// Parse ignore-file text. `origin` is only used for reporting.
    pub fn from_content(origin: &Path, content: &str) -> Self {
        let mut patterns = Self {
            origin: Some(origin.to_path_buf()),
            ..Self::default()
        };

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim_end();
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            if let Err(e) = patterns.rules.add(line) {
                tracing::warn!(
                    file = %origin.display(),
                    line = idx + 1,
                    error = %e,
                    "skipping ignore rule"
                );
                patterns.rejected.push(RejectedLine {
                    line: idx + 1,
                    pattern: line.to_string(),
                    message: e.to_string(),
                });
            }
        }
        patterns
    }

    /// The rule that ignores `rel_path`, if any. A trailing `!rule` that
    /// re-includes the path wins over earlier rules.
    pub fn matched_pattern(&self, rel_path: &Path) -> Option<String> {
        match self.rules.matches(rel_path) {
            PatternMatch::Matched(rule) => Some(rule.to_string()),
            PatternMatch::Negated(_) | PatternMatch::None => None,
        }
    }

    pub fn is_ignored(&self, rel_path: &Path) -> bool {
        self.matched_pattern(rel_path).is_some()
    }

    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    pub fn rejected(&self) -> &[RejectedLine] {
        &self.rejected
    }

    pub fn pattern_count(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
