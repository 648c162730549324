//! Domain Entities
//!
//! - `SourceFile` - a file from the source tree, with optional frontmatter
//! - `DependencySet` / `DependencyGraph` - files consulted per page
//! - `CacheEntry` - durable build record of one input

mod cache_entry;
mod dependency;
mod source_file;

pub use cache_entry::{CacheEntry, DependencyRecord};
pub use dependency::{DependencyEdge, DependencyGraph, DependencySet, EdgeKind};
pub use source_file::{is_markdown_path, FileKind, Frontmatter, LayoutDirective, SourceFile};
