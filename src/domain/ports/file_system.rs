//! FileSystem port - abstraction over file I/O operations
//!
//! The composition engine, resolver and cache only need a minimal capability:
//! read, existence checks and directory listing. Writes are used by the build
//! driver when emitting output.

use std::path::{Path, PathBuf};

/// Result type for file system operations
pub type FsResult<T> = Result<T, FsError>;

/// File system operation errors
#[derive(Debug)]
pub enum FsError {
    /// File not found
    NotFound(PathBuf),
    /// Permission denied
    PermissionDenied(PathBuf),
    /// I/O error on a specific path
    Io { path: PathBuf, source: std::io::Error },
    /// Other error
    Other(String),
}

impl FsError {
    /// Attach a path to an I/O error, mapping the common kinds.
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => FsError::PermissionDenied(path.to_path_buf()),
            _ => FsError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Absence is a legitimate answer for probes; everything else is a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}

impl std::fmt::Display for FsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FsError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            FsError::PermissionDenied(path) => {
                write!(f, "Permission denied: {}", path.display())
            }
            FsError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            FsError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Abstract file system interface
///
/// Implementations:
/// - `LocalFs` - standard file I/O
pub trait FileSystem: Send + Sync {
    /// Read file content as UTF-8 text
    fn read(&self, path: &Path) -> FsResult<String>;

    /// Read raw file bytes
    fn read_bytes(&self, path: &Path) -> FsResult<Vec<u8>>;

    /// Write content to file atomically, creating parent directories
    fn write(&self, path: &Path, content: &[u8]) -> FsResult<()>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path is a regular file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if a path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// List the immediate entries of a directory, sorted by path
    fn list_dir(&self, path: &Path) -> FsResult<Vec<PathBuf>>;

    /// Copy a file, creating parent directories of the destination
    fn copy(&self, from: &Path, to: &Path) -> FsResult<()>;

    /// Remove a file
    fn remove(&self, path: &Path) -> FsResult<()>;

    /// Remove a directory tree (no-op if missing)
    fn remove_dir_all(&self, path: &Path) -> FsResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_error_display() {
        let err = FsError::NotFound(PathBuf::from("test.txt"));
        assert!(err.to_string().contains("test.txt"));
    }

    #[test]
    fn fs_error_from_io_keeps_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let fs_err = FsError::io(Path::new("a/b.html"), io_err);
        assert!(fs_err.is_not_found());
        assert_eq!(fs_err.to_string(), "File not found: a/b.html");
    }

    #[test]
    fn fs_error_other_kinds_are_not_absence() {
        let io_err = std::io::Error::other("disk on fire");
        let fs_err = FsError::io(Path::new("x"), io_err);
        assert!(!fs_err.is_not_found());
        assert!(fs_err.to_string().contains("disk on fire"));
    }
}
