//! CacheEntry entity - durable build record for one input file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::dependency::EdgeKind;
use crate::domain::value_objects::ContentHash;

/// Snapshot of one dependency at the time its dependent was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub path: PathBuf,
    pub kind: EdgeKind,
    /// Digest when recorded; `None` when the file was missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<ContentHash>,
    /// A probed candidate that must stay missing for the page to be fresh
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub absent: bool,
}

/// What the cache remembers about a built input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub file_path: PathBuf,
    pub content_hash: ContentHash,
    pub dependencies: Vec<DependencyRecord>,
    pub output_path: Option<PathBuf>,
}

impl CacheEntry {
    pub fn new(file_path: impl Into<PathBuf>, content_hash: ContentHash) -> Self {
        Self {
            file_path: file_path.into(),
            content_hash,
            dependencies: Vec::new(),
            output_path: None,
        }
    }

    pub fn dependency_paths(&self) -> impl Iterator<Item = &Path> {
        self.dependencies.iter().map(|d| d.path.as_path())
    }
}
