//! Watch Use Case implementation

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::application::build::{BuildUseCase, CancelToken};
use crate::domain::services::normalize_path;
use crate::error::{WeaveError, WeaveResult};

use super::event::{WatchEvent, WatchOptions, WatchReport, WatcherState};
use super::filter::ChangeFilter;
use super::planner::{is_watched, plan_changes};
use super::scheduler::{RebuildScheduler, SchedulerEvent};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Watch Use Case
///
/// Builds the site once, then rebuilds what each debounced batch of changes
/// affects. This is the main entry point for the `weave watch` command.
pub struct WatchUseCase {
    options: WatchOptions,
    build: Arc<BuildUseCase>,
}

impl WatchUseCase {
    pub fn new(options: WatchOptions) -> WeaveResult<Self> {
        let build = Arc::new(BuildUseCase::local(options.build.clone())?);
        Ok(Self::with_build(options, build))
    }

    pub fn with_build(options: WatchOptions, build: Arc<BuildUseCase>) -> Self {
        Self { options, build }
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    pub fn build(&self) -> &Arc<BuildUseCase> {
        &self.build
    }

    /// Start watching (blocking)
    ///
    /// Blocks until `running` is cleared. Progress goes to `on_event`;
    /// failures while handling changes go to `errors` and never end the loop.
    /// Superseded rebuilds are reported as cancelled, not as errors.
    pub fn start<F>(
        &self,
        running: Arc<AtomicBool>,
        errors: Sender<WeaveError>,
        on_event: F,
    ) -> WeaveResult<()>
    where
        F: Fn(WatchReport),
    {
        let build = &self.build;
        on_event(WatchReport::WatchStarted {
            source: build.source_root().display().to_string(),
            output: build.output_root().display().to_string(),
        });

        on_event(WatchReport::RebuildStarted {
            full: true,
            inputs: 0,
        });
        let started = Instant::now();
        let initial = build.build(&CancelToken::new())?;
        on_event(WatchReport::rebuild_complete(&initial, started.elapsed()));

        let mut filter = ChangeFilter::new();
        filter.seed(build.cache().known_hashes());
        debug!(known = filter.len(), "change filter seeded");

        let (tx, rx) = channel();
        let watch_errors = errors.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    for change in WatchEvent::from_notify(&event.kind, &event.paths) {
                        let _ = tx.send(change);
                    }
                }
                Err(e) => {
                    let _ = watch_errors.send(watch_error(e));
                }
            },
            Config::default(),
        )
        .map_err(watch_error)?;
        watcher
            .watch(build.source_root(), RecursiveMode::Recursive)
            .map_err(watch_error)?;
        info!(source = %build.source_root().display(), "watching for changes");

        let mut state = WatcherState::new(self.options.debounce());
        let mut scheduler = RebuildScheduler::new(build.clone());

        while running.load(Ordering::SeqCst) {
            if let Ok(event) = rx.recv_timeout(POLL_INTERVAL) {
                let event = WatchEvent {
                    path: event_path(&event.path),
                    ..event
                };
                if is_watched(build, &event.path) {
                    if let Some(event) = filter.admit(build.file_system(), event) {
                        state.add_change(event);
                    }
                }
            }

            if state.should_flush() {
                let events = state.take_changes();
                for event in &events {
                    info!(path = %event.path.display(), kind = ?event.kind, "file changed");
                    on_event(WatchReport::file_changed(event));
                }

                let batch = plan_changes(build, &events);
                for impact in &batch.impacts {
                    on_event(WatchReport::Impact {
                        path: impact.path.display().to_string(),
                        dependents: impact.dependent_pages.len(),
                        level: impact.impact_level,
                    });
                }
                scheduler.submit(batch.plan);
            }

            scheduler.poll();
            for event in scheduler.drain_events() {
                report(event, &errors, &on_event);
            }
        }

        scheduler.shutdown();
        for event in scheduler.drain_events() {
            report(event, &errors, &on_event);
        }
        on_event(WatchReport::Shutdown);
        Ok(())
    }
}

fn report<F>(event: SchedulerEvent, errors: &Sender<WeaveError>, on_event: &F)
where
    F: Fn(WatchReport),
{
    match event {
        SchedulerEvent::Started { full, inputs } => {
            on_event(WatchReport::RebuildStarted { full, inputs });
        }
        SchedulerEvent::Finished(outcome) => match outcome.result {
            Ok(report) => {
                info!(
                    built = report.built.len(),
                    removed = report.removed.len(),
                    failed = report.failures.len(),
                    "rebuild finished"
                );
                on_event(WatchReport::rebuild_complete(&report, outcome.elapsed));
            }
            Err(e) if e.is_cancelled() => {
                debug!("rebuild superseded");
                on_event(WatchReport::RebuildCancelled);
            }
            Err(e) => {
                warn!(error = %e, "rebuild failed");
                on_event(WatchReport::Error {
                    message: e.to_string(),
                });
                let _ = errors.send(e);
            }
        },
    }
}

/// Canonical form of an event path so it matches cache keys. Removed files
/// can no longer be canonicalized, so their parent is.
fn event_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return normalize_path(&canonical);
    }
    match (path.parent().map(|p| p.canonicalize()), path.file_name()) {
        (Some(Ok(parent)), Some(name)) => normalize_path(&parent.join(name)),
        _ => normalize_path(path),
    }
}

fn watch_error(e: notify::Error) -> WeaveError {
    WeaveError::Io(std::io::Error::other(e.to_string()))
}
