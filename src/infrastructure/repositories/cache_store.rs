//! JSON Cache Store
//!
//! Persists the build cache as two documents under the cache directory:
//!
//! - `hashes.json` - path → content digest
//! - `dependencies.json` - path → dependency snapshots and output path
//!
//! Saves take an advisory lock (`.lock`) so two concurrent builds never
//! interleave writes, and each document is replaced atomically.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{CacheEntry, DependencyRecord};
use crate::domain::ports::{CacheSnapshot, CacheStore, CacheStoreError, CacheStoreResult};
use crate::domain::value_objects::ContentHash;
use crate::infrastructure::fs::atomic_write;

pub const HASHES_FILE: &str = "hashes.json";
pub const DEPENDENCIES_FILE: &str = "dependencies.json";
const LOCK_FILE: &str = ".lock";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct HashesDocument {
    version: u32,
    #[serde(default)]
    hashes: BTreeMap<PathBuf, ContentHash>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    #[serde(default)]
    dependencies: Vec<DependencyRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DependenciesDocument {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<PathBuf, StoredEntry>,
}

pub struct JsonCacheStore {
    dir: PathBuf,
}

impl JsonCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn io_error(path: &Path, source: std::io::Error) -> CacheStoreError {
        CacheStoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn read_document<T: for<'de> Deserialize<'de>>(&self, name: &str) -> CacheStoreResult<Option<T>> {
        let path = self.dir.join(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(&path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CacheStoreError::Corrupted {
                path,
                message: e.to_string(),
            })
    }

    fn write_document<T: Serialize>(&self, name: &str, document: &T) -> CacheStoreResult<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(document).map_err(|e| CacheStoreError::Corrupted {
            path: path.clone(),
            message: e.to_string(),
        })?;
        atomic_write(&path, json.as_bytes()).map_err(|e| {
            Self::io_error(&path, std::io::Error::other(e.to_string()))
        })
    }

    fn check_version(&self, name: &str, version: u32) -> CacheStoreResult<()> {
        if version == FORMAT_VERSION {
            return Ok(());
        }
        Err(CacheStoreError::Corrupted {
            path: self.dir.join(name),
            message: format!(
                "unsupported cache version {} (expected {})",
                version, FORMAT_VERSION
            ),
        })
    }

    fn lock(&self) -> CacheStoreResult<fs::File> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(&self.dir, e))?;
        let lock_path = self.dir.join(LOCK_FILE);
        let lock_file = fs::File::create(&lock_path).map_err(|e| Self::io_error(&lock_path, e))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| Self::io_error(&lock_path, e))?;
        Ok(lock_file)
    }
}

impl CacheStore for JsonCacheStore {
    fn load(&self) -> CacheStoreResult<CacheSnapshot> {
        let hashes: Option<HashesDocument> = self.read_document(HASHES_FILE)?;
        let deps: Option<DependenciesDocument> = self.read_document(DEPENDENCIES_FILE)?;

        let mut snapshot = CacheSnapshot::default();
        if let Some(doc) = hashes {
            self.check_version(HASHES_FILE, doc.version)?;
            snapshot.hashes = doc.hashes;
        }
        if let Some(doc) = deps {
            self.check_version(DEPENDENCIES_FILE, doc.version)?;
            for (path, stored) in doc.entries {
                // A record without a hash can never be proven fresh.
                let Some(hash) = snapshot.hashes.get(&path).cloned() else {
                    continue;
                };
                let mut entry = CacheEntry::new(path.clone(), hash);
                entry.dependencies = stored.dependencies;
                entry.output_path = stored.output;
                snapshot.entries.insert(path, entry);
            }
        }
        Ok(snapshot)
    }

    fn save(&self, snapshot: &CacheSnapshot) -> CacheStoreResult<()> {
        let lock_file = self.lock()?;

        let hashes = HashesDocument {
            version: FORMAT_VERSION,
            hashes: snapshot.hashes.clone(),
        };
        let deps = DependenciesDocument {
            version: FORMAT_VERSION,
            entries: snapshot
                .entries
                .iter()
                .map(|(path, entry)| {
                    (
                        path.clone(),
                        StoredEntry {
                            dependencies: entry.dependencies.clone(),
                            output: entry.output_path.clone(),
                        },
                    )
                })
                .collect(),
        };

        let result = self
            .write_document(HASHES_FILE, &hashes)
            .and_then(|_| self.write_document(DEPENDENCIES_FILE, &deps));

        let _ = lock_file.unlock();
        result
    }

    fn clear(&self) -> CacheStoreResult<()> {
        for name in [HASHES_FILE, DEPENDENCIES_FILE] {
            let path = self.dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Self::io_error(&path, e)),
            }
        }
        Ok(())
    }
}
