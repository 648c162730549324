//! Watch event types and options

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;
use serde::Serialize;

use crate::application::build::{BuildOptions, BuildReport};
use crate::domain::services::ImpactLevel;

/// What happened to a watched file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Change,
    Remove,
}

impl ChangeKind {
    /// Kind of a later event folded onto an earlier one for the same path.
    fn coalesce(self, newer: ChangeKind) -> ChangeKind {
        match (self, newer) {
            (ChangeKind::Add, ChangeKind::Change) => ChangeKind::Add,
            (ChangeKind::Remove, ChangeKind::Add) => ChangeKind::Change,
            (_, newer) => newer,
        }
    }
}

/// A single file change seen by the watcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub timestamp: DateTime<Utc>,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            timestamp: Utc::now(),
        }
    }

    /// Translate a raw `notify` event. Access notifications and
    /// metadata-only changes are dropped.
    pub fn from_notify(kind: &EventKind, paths: &[PathBuf]) -> Vec<WatchEvent> {
        let kinds: Vec<ChangeKind> = match kind {
            EventKind::Create(_) => vec![ChangeKind::Add],
            EventKind::Remove(_) => vec![ChangeKind::Remove],
            EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => vec![ChangeKind::Remove],
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => vec![ChangeKind::Add],
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                vec![ChangeKind::Remove, ChangeKind::Add]
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                return paths
                    .iter()
                    .map(|p| {
                        let kind = if p.exists() {
                            ChangeKind::Add
                        } else {
                            ChangeKind::Remove
                        };
                        WatchEvent::new(p.clone(), kind)
                    })
                    .collect();
            }
            EventKind::Modify(_) | EventKind::Any => vec![ChangeKind::Change],
            EventKind::Access(_) | EventKind::Other => return Vec::new(),
        };

        paths
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let kind = kinds.get(i).or(kinds.last()).copied();
                WatchEvent::new(p.clone(), kind.unwrap_or(ChangeKind::Change))
            })
            .collect()
    }
}

/// Watch options
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Build settings shared with every rebuild
    pub build: BuildOptions,
    /// Output as NDJSON
    pub json: bool,
}

impl WatchOptions {
    pub fn new(build: BuildOptions) -> Self {
        Self { build, json: false }
    }

    /// Set JSON output mode
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.build.config.watch.debounce_ms)
    }
}

/// Watch-loop progress, one NDJSON line per value
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchReport {
    /// Watch started
    WatchStarted { source: String, output: String },
    /// A debounced file change
    FileChanged {
        path: String,
        kind: ChangeKind,
        timestamp: DateTime<Utc>,
    },
    /// Impact of a change on already built pages
    Impact {
        path: String,
        dependents: usize,
        level: ImpactLevel,
    },
    RebuildStarted { full: bool, inputs: usize },
    RebuildComplete {
        built: usize,
        copied: usize,
        fresh: usize,
        removed: usize,
        failures: Vec<String>,
        warnings: Vec<String>,
        duration_ms: u64,
    },
    /// A newer change superseded the running rebuild
    RebuildCancelled,
    /// Error occurred
    Error { message: String },
    /// Watch stopped
    Shutdown,
}

impl WatchReport {
    pub fn file_changed(event: &WatchEvent) -> Self {
        WatchReport::FileChanged {
            path: event.path.display().to_string(),
            kind: event.kind,
            timestamp: event.timestamp,
        }
    }

    pub fn rebuild_complete(report: &BuildReport, elapsed: Duration) -> Self {
        WatchReport::RebuildComplete {
            built: report.built.len(),
            copied: report.copied.len(),
            fresh: report.fresh.len(),
            removed: report.removed.len(),
            failures: report
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.path.display(), f.message))
                .collect(),
            warnings: report.warnings.clone(),
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Convert to JSON string with "command": "watch" field included
    pub fn to_json(&self) -> String {
        let mut value =
            serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({"event": "error"}));
        if let Some(obj) = value.as_object_mut() {
            obj.insert("command".to_string(), serde_json::json!("watch"));
        }
        serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Watcher state for debouncing
#[derive(Debug)]
pub struct WatcherState {
    debounce: Duration,
    pending: BTreeMap<PathBuf, WatchEvent>,
    last_change: Option<Instant>,
}

impl WatcherState {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: BTreeMap::new(),
            last_change: None,
        }
    }

    /// Queue an event, folding it onto an earlier one for the same path.
    pub fn add_change(&mut self, event: WatchEvent) {
        match self.pending.get_mut(&event.path) {
            Some(existing) => {
                existing.kind = existing.kind.coalesce(event.kind);
                existing.timestamp = event.timestamp;
            }
            None => {
                self.pending.insert(event.path.clone(), event);
            }
        }
        self.last_change = Some(Instant::now());
    }

    /// Whether the quiet period after the last change has passed.
    pub fn should_flush(&self) -> bool {
        match self.last_change {
            Some(last) => !self.pending.is_empty() && last.elapsed() >= self.debounce,
            None => false,
        }
    }

    /// Take all pending events, ordered by path.
    pub fn take_changes(&mut self) -> Vec<WatchEvent> {
        self.last_change = None;
        std::mem::take(&mut self.pending).into_values().collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_pending(&self, path: &Path) -> bool {
        self.pending.contains_key(path)
    }
}
