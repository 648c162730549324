//! CacheStore port - persistence for the build cache
//!
//! The cache is two tables: content hashes (path → digest) and build records
//! (path → dependency snapshots + output). Stores must round-trip both
//! losslessly; any load failure is treated by callers as a cold cache.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::entities::CacheEntry;
use crate::domain::value_objects::ContentHash;
use crate::error::WeaveError;

pub type CacheStoreResult<T> = Result<T, CacheStoreError>;

#[derive(Debug)]
pub enum CacheStoreError {
    /// A document exists but cannot be parsed or has an unknown version
    Corrupted { path: PathBuf, message: String },
    /// I/O failure reading, writing or locking
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for CacheStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStoreError::Corrupted { path, message } => {
                write!(f, "corrupted cache document {}: {}", path.display(), message)
            }
            CacheStoreError::Io { path, source } => {
                write!(f, "cache I/O error at {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CacheStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheStoreError::Io { source, .. } => Some(source),
            CacheStoreError::Corrupted { .. } => None,
        }
    }
}

impl From<CacheStoreError> for WeaveError {
    fn from(err: CacheStoreError) -> Self {
        let path = match &err {
            CacheStoreError::Corrupted { path, .. } | CacheStoreError::Io { path, .. } => {
                path.clone()
            }
        };
        WeaveError::CacheIo {
            path,
            message: err.to_string(),
        }
    }
}

/// Everything a store persists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSnapshot {
    pub hashes: BTreeMap<PathBuf, ContentHash>,
    pub entries: BTreeMap<PathBuf, CacheEntry>,
}

impl CacheSnapshot {
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty() && self.entries.is_empty()
    }
}

pub trait CacheStore: Send + Sync {
    /// Load the persisted snapshot; a store that was never written yields an
    /// empty snapshot.
    fn load(&self) -> CacheStoreResult<CacheSnapshot>;

    fn save(&self, snapshot: &CacheSnapshot) -> CacheStoreResult<()>;

    /// Delete everything the store persisted.
    fn clear(&self) -> CacheStoreResult<()>;
}
