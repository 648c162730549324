//! Weave - static site assembler
//!
//! Weave builds a site from a tree of HTML and markdown sources by cascading
//! composition: pages import fragments, fragments fill named slots, and pages
//! are wrapped in layouts picked by a fixed precedence. A content-hash
//! dependency graph keeps rebuilds incremental, including in watch mode.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod parser;

// Re-exports for convenience
pub use application::{
    BuildOptions, BuildReport, BuildUseCase, CancelToken, RebuildPlan, WatchOptions,
    WatchUseCase,
};
pub use config::Config;
pub use domain::entities::{DependencyGraph, Frontmatter};
pub use domain::services::{
    ChangeImpact, ChangeImpactAnalyzer, ClassificationResult, Composer, FileAction,
    FileClassifier, HeadSet, ImpactLevel, LayoutResolver,
};
pub use error::{WeaveError, WeaveResult};
pub use parser::{parse_frontmatter, split_frontmatter};
