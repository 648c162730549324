//! Error types for Weave
//!
//! Uses `thiserror` for library errors. Variants follow the failure taxonomy of
//! the build: some are fatal for a single registration or page, some are always
//! recovered, and a few abort the whole pass.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::ports::FsError;
use crate::domain::value_objects::PatternError;

/// Result type alias for Weave operations
pub type WeaveResult<T> = Result<T, WeaveError>;

/// Main error type for Weave operations
#[derive(Error, Debug)]
pub enum WeaveError {
    /// Bad pattern or configuration value (fatal only for that registration)
    #[error("invalid {context}: {message}")]
    Validation { context: String, message: String },

    /// An import chain revisits a file already being composed
    #[error("circular import: {}", format_chain(.chain))]
    CircularImport { chain: Vec<PathBuf> },

    /// Imports nested deeper than the configured ceiling
    #[error("import depth {depth} exceeds maximum of {max} while composing {file}")]
    DepthExceeded {
        depth: usize,
        max: usize,
        file: PathBuf,
    },

    /// Import target could not be located
    #[error("fragment '{reference}' not found (imported from {from}); searched: {}", format_candidates(.candidates))]
    FragmentNotFound {
        reference: String,
        from: PathBuf,
        candidates: Vec<PathBuf>,
    },

    /// Cache persistence failure (callers always recover with a cold cache)
    #[error("cache I/O error at {path}: {message}")]
    CacheIo { path: PathBuf, message: String },

    /// File system port failure
    #[error(transparent)]
    FileSystem(#[from] FsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid frontmatter YAML
    #[error("invalid frontmatter in {file}: {message}")]
    Frontmatter { file: PathBuf, message: String },

    /// Invalid configuration file
    #[error("invalid configuration in {file}: {message}")]
    Config { file: PathBuf, message: String },

    /// Source directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// A rebuild was superseded by a newer change
    #[error("build cancelled")]
    Cancelled,

    /// The background rebuild thread panicked
    #[error("rebuild worker panicked: {message}")]
    WorkerPanicked { message: String },
}

impl WeaveError {
    /// Whether the error aborts the current page but leaves the rest of the
    /// build running.
    pub fn is_page_fatal(&self) -> bool {
        matches!(
            self,
            Self::CircularImport { .. }
                | Self::DepthExceeded { .. }
                | Self::FragmentNotFound { .. }
                | Self::Frontmatter { .. }
                | Self::FileSystem(_)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<PatternError> for WeaveError {
    fn from(err: PatternError) -> Self {
        WeaveError::Validation {
            context: "pattern".to_string(),
            message: err.to_string(),
        }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_candidates(candidates: &[PathBuf]) -> String {
    if candidates.is_empty() {
        return "(none)".to_string();
    }
    format_chain(candidates).replace(" -> ", ", ")
}
