//! Build Module
//!
//! Orchestrates a site build for Weave.
//!
//! ## Structure
//!
//! - `options` - Configuration types (`BuildOptions`)
//! - `plan` - Incremental work (`RebuildPlan`) and `CancelToken`
//! - `result` - Result types (`BuildReport`, `PageFailure`)
//! - `site` - Source scanning, template discovery and output mapping
//! - `use_case` - Core use case logic (`BuildUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use weave::application::build::{BuildOptions, BuildUseCase, CancelToken};
//!
//! let use_case = BuildUseCase::local(BuildOptions::new(root, config))?;
//! let report = use_case.build(&CancelToken::new())?;
//! ```

mod options;
mod plan;
mod result;
mod site;
mod use_case;

pub use options::BuildOptions;
pub use plan::{CancelToken, RebuildPlan};
pub use result::{BuildReport, PageFailure};
pub use site::output_path;
pub use use_case::BuildUseCase;

#[cfg(test)]
mod tests;
