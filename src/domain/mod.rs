//! Domain Layer
//!
//! The composition and invalidation logic of Weave, free of process-level
//! concerns (config files, watchers, threads).
//!
//! ## Structure
//!
//! - `entities/` - Source files, frontmatter, dependency graph, cache entries
//! - `value_objects/` - Immutable value types (ContentHash, PatternList)
//! - `services/` - Classifier, layout resolver, composer, impact analyzer
//! - `ports/` - Interface definitions for infrastructure
//!
//! ## Design Principles
//!
//! 1. **Ports & Adapters** - File and markdown access goes through traits
//! 2. **Explicit results** - Services return what they consulted instead of
//!    mutating shared state

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
