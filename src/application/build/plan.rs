//! Rebuild plans and cancellation

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::error::{WeaveError, WeaveResult};

/// What an incremental pass has to redo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildPlan {
    /// Rescan and rebuild everything
    pub full: bool,
    /// Files whose own content changed or that were added
    pub changed: BTreeSet<PathBuf>,
    /// Pages to recompose because something they depend on changed
    pub pages: BTreeSet<PathBuf>,
    /// Inputs that no longer exist
    pub removed: BTreeSet<PathBuf>,
}

impl RebuildPlan {
    pub fn full() -> Self {
        Self {
            full: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.full && self.changed.is_empty() && self.pages.is_empty() && self.removed.is_empty()
    }

    /// Union with a newer plan. A path removed later and re-added (or the
    /// reverse) keeps only its latest state.
    pub fn merge(&mut self, newer: RebuildPlan) {
        self.full |= newer.full;
        for path in newer.removed {
            self.changed.remove(&path);
            self.pages.remove(&path);
            self.removed.insert(path);
        }
        for path in newer.changed {
            self.removed.remove(&path);
            self.changed.insert(path);
        }
        self.pages.extend(newer.pages);
    }

    /// Every input the plan touches.
    pub fn paths(&self) -> BTreeSet<PathBuf> {
        self.changed
            .iter()
            .chain(&self.pages)
            .chain(&self.removed)
            .cloned()
            .collect()
    }
}

/// Shared flag a running pass polls between pages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> WeaveResult<()> {
        if self.is_cancelled() {
            Err(WeaveError::Cancelled)
        } else {
            Ok(())
        }
    }
}
