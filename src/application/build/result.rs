//! Build Result
//!
//! Result types for build passes.

use std::path::PathBuf;

use serde::Serialize;

/// A page (or asset) that could not be produced. The rest of the build
/// carries on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Result of a build pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Outputs written for composed pages
    pub built: Vec<PathBuf>,
    /// Pages whose existing output was still fresh
    pub fresh: Vec<PathBuf>,
    /// Outputs written for copied files
    pub copied: Vec<PathBuf>,
    /// Outputs deleted because their input is gone
    pub removed: Vec<PathBuf>,
    /// Files classified as not part of the output
    pub skipped: usize,
    /// Files excluded by an ignore rule
    pub ignored: usize,
    pub failures: Vec<PageFailure>,
    pub warnings: Vec<String>,
}

impl BuildReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn has_changes(&self) -> bool {
        !self.built.is_empty() || !self.copied.is_empty() || !self.removed.is_empty()
    }

    /// Fold a later partial report into this one.
    pub fn absorb(&mut self, other: BuildReport) {
        self.built.extend(other.built);
        self.fresh.extend(other.fresh);
        self.copied.extend(other.copied);
        self.removed.extend(other.removed);
        self.skipped += other.skipped;
        self.ignored += other.ignored;
        self.failures.extend(other.failures);
        self.warnings.extend(other.warnings);
    }
}
