//! Value Objects
//!
//! Immutable types compared by value.

mod config_warning;
mod hash;
mod ignore_patterns;
mod pattern_list;

pub use config_warning::ConfigWarning;
pub use hash::ContentHash;
pub use ignore_patterns::{IgnoreError, IgnorePatterns, RejectedLine, IGNORE_FILE_NAME};
pub(crate) use pattern_list::normalize_relative;
pub use pattern_list::{PatternError, PatternList, PatternMatch};
