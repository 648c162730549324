//! Watch Use Case
//!
//! Continuous rebuilds while sources change. It orchestrates:
//! - File system monitoring (via `notify` crate)
//! - A content-hash filter that drops editor save noise
//! - Debouncing (100ms default, `[watch] debounce_ms`)
//! - Change impact analysis into a `RebuildPlan`
//! - Cancellable rebuilds on a worker thread
//!
//! ## Architecture
//!
//! - `WatchUseCase` - Main orchestrator
//! - `ChangeFilter` - Drops events whose content did not change
//! - `plan_changes` - Maps a batch of events to the pages to rebuild
//! - `RebuildScheduler` - Runs one rebuild at a time, superseding overlaps
//! - `WatchReport` - Progress emitted during watch operation
//!
//! ## Usage
//!
//! ```ignore
//! let use_case = WatchUseCase::new(WatchOptions::new(build_options))?;
//! let (errors, error_rx) = std::sync::mpsc::channel();
//! use_case.start(running, errors, |report| println!("{}", report.to_json()))?;
//! ```

mod event;
mod filter;
mod planner;
mod scheduler;
mod use_case;


pub use event::{ChangeKind, WatchEvent, WatchOptions, WatchReport, WatcherState};
pub use filter::ChangeFilter;
pub use planner::{is_watched, plan_changes, PlannedBatch};
pub use scheduler::{JobOutcome, RebuildScheduler, SchedulerEvent};
pub use use_case::WatchUseCase;
