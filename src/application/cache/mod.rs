//! Dependency-aware build cache
//!
//! Remembers, per built page, the digest of its source and a snapshot of the
//! digest of every file consulted while composing it. A page is fresh only
//! when its output exists, none of those digests moved and none of the
//! candidates that were probed and missing has appeared since. Freshness is
//! always judged against the snapshot taken at build time, so reverting a
//! change makes the page fresh again.
//!
//! Digests are read through the [`FileSystem`] port and memoized for the
//! duration of one build pass (see [`BuildCache::begin_pass`]).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info, warn};

use crate::domain::entities::{CacheEntry, DependencyGraph, DependencyRecord, DependencySet};
use crate::domain::ports::{CacheSnapshot, CacheStore, FileSystem};
use crate::domain::value_objects::ContentHash;
use crate::error::WeaveResult;


#[derive(Debug, Default)]
struct CacheState {
    snapshot: CacheSnapshot,
    graph: DependencyGraph,
}

impl CacheState {
    fn from_snapshot(snapshot: CacheSnapshot) -> Self {
        let mut graph = DependencyGraph::new();
        for (page, entry) in &snapshot.entries {
            let mut deps = DependencySet::new();
            for record in &entry.dependencies {
                if record.absent {
                    deps.insert_absent(record.path.clone(), record.kind);
                } else {
                    deps.insert(record.path.clone(), record.kind);
                }
            }
            graph.set(page.clone(), deps);
        }
        Self { snapshot, graph }
    }
}

pub struct BuildCache {
    fs: Arc<dyn FileSystem>,
    store: Option<Arc<dyn CacheStore>>,
    state: RwLock<CacheState>,
    memo: Mutex<HashMap<PathBuf, Option<ContentHash>>>,
}

impl BuildCache {
    /// A cache that is never persisted.
    pub fn in_memory(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            store: None,
            state: RwLock::new(CacheState::default()),
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_store(fs: Arc<dyn FileSystem>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::in_memory(fs)
        }
    }

    /// Load persisted state. Any failure leaves the cache cold.
    pub fn load(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let snapshot = match store.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "build cache unreadable, starting cold");
                CacheSnapshot::default()
            }
        };
        if snapshot.is_empty() {
            info!("build cache is cold");
        } else {
            debug!(entries = snapshot.entries.len(), "build cache loaded");
        }
        *self.write_state() = CacheState::from_snapshot(snapshot);
        self.begin_pass();
    }

    /// Persist the current state. Callers treat failure as a warning.
    pub fn save(&self) -> WeaveResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let state = self.read_state();
        store.save(&state.snapshot)?;
        debug!(entries = state.snapshot.entries.len(), "build cache saved");
        Ok(())
    }

    /// Forget everything, including what the store persisted.
    pub fn clear(&self) {
        *self.write_state() = CacheState::default();
        self.begin_pass();
        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                warn!(error = %e, "failed to clear persisted build cache");
            }
        }
    }

    /// Drop memoized digests so the next reads observe the disk again.
    pub fn begin_pass(&self) {
        self.memo.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Current digest of `path`, or `None` if it cannot be read.
    pub fn hash(&self, path: &Path) -> Option<ContentHash> {
        if let Some(hit) = self.memo.lock().unwrap_or_else(|e| e.into_inner()).get(path) {
            return hit.clone();
        }
        let hash = self.fs.read_bytes(path).ok().map(|b| ContentHash::from_bytes(&b));
        self.memo
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_path_buf(), hash.clone());
        hash
    }

    /// Record the files consulted while composing `page`, snapshotting their
    /// digests as of now.
    pub fn set_dependencies(&self, page: &Path, deps: &DependencySet) {
        let records: Vec<DependencyRecord> = deps
            .iter()
            .map(|(path, kind)| DependencyRecord {
                path: path.to_path_buf(),
                kind,
                hash: self.hash(path),
                absent: false,
            })
            .chain(deps.absent().map(|(path, kind)| DependencyRecord {
                path: path.to_path_buf(),
                kind,
                hash: None,
                absent: true,
            }))
            .collect();
        let page_hash = self.hash(page);

        let mut state = self.write_state();
        for record in &records {
            if let Some(hash) = &record.hash {
                state
                    .snapshot
                    .hashes
                    .insert(record.path.clone(), hash.clone());
            }
        }
        state.graph.set(page.to_path_buf(), deps.clone());

        let Some(page_hash) = page_hash else {
            state.snapshot.entries.remove(page);
            return;
        };
        let entry = state
            .snapshot
            .entries
            .entry(page.to_path_buf())
            .or_insert_with(|| CacheEntry::new(page, page_hash.clone()));
        entry.dependencies = records;
    }

    /// Mark `input` as built into `output`.
    pub fn record_build(&self, input: &Path, output: &Path) {
        let Some(hash) = self.hash(input) else {
            return;
        };
        let mut state = self.write_state();
        state
            .snapshot
            .hashes
            .insert(input.to_path_buf(), hash.clone());
        let entry = state
            .snapshot
            .entries
            .entry(input.to_path_buf())
            .or_insert_with(|| CacheEntry::new(input, hash.clone()));
        entry.content_hash = hash;
        entry.output_path = Some(output.to_path_buf());
    }

    /// Whether `output` can be reused for `input` without recomposing.
    pub fn is_up_to_date(&self, input: &Path, output: &Path) -> bool {
        if !self.fs.exists(output) {
            return false;
        }
        let state = self.read_state();
        let Some(entry) = state.snapshot.entries.get(input) else {
            return false;
        };
        if entry.output_path.as_deref() != Some(output) {
            return false;
        }
        if self.hash(input).as_ref() != Some(&entry.content_hash) {
            return false;
        }

        for record in &entry.dependencies {
            let now = self.hash(&record.path);
            let fresh = if record.absent {
                now.is_none()
            } else {
                matches!((&record.hash, &now), (Some(then), Some(now)) if then == now)
            };
            if !fresh {
                debug!(page = %input.display(), dependency = %record.path.display(), "stale dependency");
                return false;
            }
        }

        // Files reached only through another recorded node.
        let direct: BTreeSet<&Path> = entry.dependency_paths().collect();
        for dep in state.graph.transitive_dependencies(input) {
            if direct.contains(dep.as_path()) {
                continue;
            }
            match (state.snapshot.hashes.get(&dep), self.hash(&dep)) {
                (Some(then), Some(now)) if *then == now => {}
                _ => return false,
            }
        }
        true
    }

    /// Forget the build records of everything that depends on `path`
    /// (transitively) and of `path` itself. Returns the affected pages.
    pub fn invalidate_dependents(&self, path: &Path) -> BTreeSet<PathBuf> {
        let mut state = self.write_state();
        let mut affected = state.graph.transitive_dependents(path);
        if state.snapshot.entries.contains_key(path) {
            affected.insert(path.to_path_buf());
        }
        for page in &affected {
            state.snapshot.entries.remove(page);
        }
        affected
    }

    /// Drop every trace of a deleted input.
    pub fn remove(&self, page: &Path) {
        let mut state = self.write_state();
        state.snapshot.entries.remove(page);
        state.snapshot.hashes.remove(page);
        state.graph.remove(page);
    }

    pub fn graph(&self) -> DependencyGraph {
        self.read_state().graph.clone()
    }

    pub fn entry(&self, page: &Path) -> Option<CacheEntry> {
        self.read_state().snapshot.entries.get(page).cloned()
    }

    pub fn output_of(&self, page: &Path) -> Option<PathBuf> {
        self.read_state()
            .snapshot
            .entries
            .get(page)
            .and_then(|e| e.output_path.clone())
    }

    /// Every input with a build record.
    pub fn inputs(&self) -> Vec<PathBuf> {
        self.read_state().snapshot.entries.keys().cloned().collect()
    }

    /// Digests of every file as of its last recorded build.
    pub fn known_hashes(&self) -> BTreeMap<PathBuf, ContentHash> {
        self.read_state().snapshot.hashes.clone()
    }

    pub fn len(&self) -> usize {
        self.read_state().snapshot.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
