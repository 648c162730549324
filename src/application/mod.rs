//! Application Layer
//!
//! Use cases that orchestrate the business flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Use Cases
//!
//! - `BuildUseCase` - Full and incremental site builds (scan, classify,
//!   compose, copy, prune, persist the cache)
//! - `WatchUseCase` - Orchestrates file watching with incremental rebuilds
//!
//! ## Services
//!
//! - `BuildCache` - Content-hash freshness and the dependency graph

pub mod build;
pub mod cache;
pub mod watch;

pub use build::{
    output_path, BuildOptions, BuildReport, BuildUseCase, CancelToken, PageFailure, RebuildPlan,
};
pub use cache::BuildCache;
pub use watch::{
    ChangeKind, WatchEvent, WatchOptions, WatchReport, WatchUseCase, WatcherState,
};
