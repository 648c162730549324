//! Content-change filter
//!
//! Editors touch files without changing them (save-on-focus, atomic writes
//! through a temp file). Events are judged against the disk: a file whose
//! digest matches the last one seen is dropped, and the event kind is taken
//! from what is actually there.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::domain::ports::FileSystem;
use crate::domain::value_objects::ContentHash;

use super::event::{ChangeKind, WatchEvent};

#[derive(Debug, Default)]
pub struct ChangeFilter {
    hashes: HashMap<PathBuf, ContentHash>,
}

impl ChangeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from digests already known, e.g. the build cache.
    pub fn seed(&mut self, hashes: impl IntoIterator<Item = (PathBuf, ContentHash)>) {
        self.hashes.extend(hashes);
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// The event to act on, or `None` when nothing really changed.
    pub fn admit(&mut self, fs: &dyn FileSystem, event: WatchEvent) -> Option<WatchEvent> {
        if fs.is_dir(&event.path) {
            return None;
        }
        let known = self.hashes.contains_key(&event.path);

        let current = if fs.is_file(&event.path) {
            fs.read_bytes(&event.path)
                .ok()
                .map(|bytes| ContentHash::from_bytes(&bytes))
        } else {
            None
        };

        let kind = match current {
            Some(hash) => {
                if self.hashes.get(&event.path) == Some(&hash) {
                    return None;
                }
                self.hashes.insert(event.path.clone(), hash);
                if known {
                    ChangeKind::Change
                } else {
                    ChangeKind::Add
                }
            }
            None if known => {
                self.hashes.remove(&event.path);
                ChangeKind::Remove
            }
            // Created and deleted again before we looked.
            None => return None,
        };

        Some(WatchEvent { kind, ..event })
    }
}
