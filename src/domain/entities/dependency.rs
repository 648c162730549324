//! Dependency entities
//!
//! Composition returns the set of files it consulted for a page; the build
//! cache folds those sets into a site-wide `DependencyGraph` that answers
//! "which pages must be rebuilt when this file changes".
//!
//! A set also remembers the candidates that were probed and found missing
//! before a lookup settled (a nearer `_layout.html`, a `card.html` that would
//! shadow `_includes/card.html`). Such a file appearing later changes the
//! page just as an edit to a resolved dependency does.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How a page depends on a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Layout,
    Fragment,
    Asset,
}

/// A single dependent → dependency relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyEdge {
    pub dependent: PathBuf,
    pub dependency: PathBuf,
    pub kind: EdgeKind,
}

/// Files consulted while composing one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    entries: BTreeMap<PathBuf, EdgeKind>,
    /// Probed candidates that did not exist
    absent: BTreeMap<PathBuf, EdgeKind>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved dependency.
    pub fn insert(&mut self, path: impl Into<PathBuf>, kind: EdgeKind) {
        let path = path.into();
        self.absent.remove(&path);
        merge_kind(&mut self.entries, path, kind);
    }

    /// Record a candidate that was looked for and not found. Ignored when the
    /// same path is already a resolved dependency.
    pub fn insert_absent(&mut self, path: impl Into<PathBuf>, kind: EdgeKind) {
        let path = path.into();
        if !self.entries.contains_key(&path) {
            merge_kind(&mut self.absent, path, kind);
        }
    }

    pub fn extend(&mut self, other: DependencySet) {
        for (path, kind) in other.entries {
            self.insert(path, kind);
        }
        for (path, kind) in other.absent {
            self.insert_absent(path, kind);
        }
    }

    /// Whether `path` was consulted, resolved or probed.
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path) || self.absent.contains_key(path)
    }

    pub fn is_absent(&self, path: &Path) -> bool {
        self.absent.contains_key(path)
    }

    /// Kind of a resolved dependency.
    pub fn kind_of(&self, path: &Path) -> Option<EdgeKind> {
        self.entries.get(path).copied()
    }

    /// Probed candidates that did not exist.
    pub fn absent(&self) -> impl Iterator<Item = (&Path, EdgeKind)> {
        self.absent.iter().map(|(p, k)| (p.as_path(), *k))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, EdgeKind)> {
        self.entries.iter().map(|(p, k)| (p.as_path(), *k))
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    /// Number of resolved dependencies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.absent.is_empty()
    }

    pub fn edges_for(&self, page: &Path) -> Vec<DependencyEdge> {
        self.iter()
            .map(|(dependency, kind)| DependencyEdge {
                dependent: page.to_path_buf(),
                dependency: dependency.to_path_buf(),
                kind,
            })
            .collect()
    }
}

/// A file seen both as layout and fragment keeps the layout kind.
fn merge_kind(map: &mut BTreeMap<PathBuf, EdgeKind>, path: PathBuf, kind: EdgeKind) {
    map.entry(path)
        .and_modify(|existing| {
            if kind < *existing {
                *existing = kind;
            }
        })
        .or_insert(kind);
}

impl FromIterator<(PathBuf, EdgeKind)> for DependencySet {
    fn from_iter<T: IntoIterator<Item = (PathBuf, EdgeKind)>>(iter: T) -> Self {
        let mut set = DependencySet::new();
        for (path, kind) in iter {
            set.insert(path, kind);
        }
        set
    }
}

/// Site-wide page → dependency graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    forward: BTreeMap<PathBuf, DependencySet>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the recorded dependencies of `page`.
    pub fn set(&mut self, page: impl Into<PathBuf>, deps: DependencySet) {
        self.forward.insert(page.into(), deps);
    }

    pub fn remove(&mut self, page: &Path) -> Option<DependencySet> {
        self.forward.remove(page)
    }

    pub fn dependencies_of(&self, page: &Path) -> Option<&DependencySet> {
        self.forward.get(page)
    }

    /// Whether `path` appears anywhere in the graph, as a page or a dependency.
    pub fn is_known(&self, path: &Path) -> bool {
        self.forward.contains_key(path) || self.forward.values().any(|deps| deps.contains(path))
    }

    /// Pages that list `path` directly.
    pub fn direct_dependents(&self, path: &Path) -> BTreeSet<PathBuf> {
        self.forward
            .iter()
            .filter(|(_, deps)| deps.contains(path))
            .map(|(page, _)| page.clone())
            .collect()
    }

    /// Pages affected by a change to `path`, following dependents of
    /// dependents. `path` itself is never included.
    pub fn transitive_dependents(&self, path: &Path) -> BTreeSet<PathBuf> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([path.to_path_buf()]);

        while let Some(current) = queue.pop_front() {
            for dependent in self.direct_dependents(&current) {
                if dependent != path && seen.insert(dependent.clone()) {
                    queue.push_back(dependent);
                }
            }
        }
        seen
    }

    /// Every file `page` depends on, following dependencies that are
    /// themselves pages with recorded entries.
    pub fn transitive_dependencies(&self, page: &Path) -> BTreeSet<PathBuf> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([page.to_path_buf()]);

        while let Some(current) = queue.pop_front() {
            if let Some(deps) = self.forward.get(&current) {
                for dep in deps.paths() {
                    if dep != page && seen.insert(dep.to_path_buf()) {
                        queue.push_back(dep.to_path_buf());
                    }
                }
            }
        }
        seen
    }

    pub fn pages(&self) -> impl Iterator<Item = &Path> {
        self.forward.keys().map(PathBuf::as_path)
    }

    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.forward
            .iter()
            .flat_map(|(page, deps)| deps.edges_for(page))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}
