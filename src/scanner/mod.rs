//! Scanner module for directory traversal.
//!
//! This module provides the file-system side of indexing:
//! - Parallel directory walking using jwalk, in sorted order
//! - Gitignore-style filtering via the `ignore` crate
//! - File-mask (extension) filtering
//!
//! # Example
//!
//! ```no_run
//! use fragdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     extensions: ["md".to_string()].into_iter().collect(),
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("docs"), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod walker;

use std::collections::BTreeSet;
use std::path::PathBuf;

pub use walker::Walker;

use crate::options::DuplicateFinderOptions;

/// A file selected for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Glob patterns to ignore (gitignore-style), in addition to the
    /// root's `.gitignore`.
    pub ignore_patterns: Vec<String>,

    /// Lowercase extensions to include; empty means all files.
    pub extensions: BTreeSet<String>,
}

impl From<&DuplicateFinderOptions> for WalkerConfig {
    fn from(options: &DuplicateFinderOptions) -> Self {
        Self {
            follow_symlinks: options.follow_symlinks,
            skip_hidden: options.skip_hidden,
            ignore_patterns: options.ignore_patterns.clone(),
            extensions: options.file_mask.clone(),
        }
    }
}

/// Errors that can occur during directory scanning.
///
/// All of them are non-fatal to a run; the affected entry is skipped.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path disappeared during the walk.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }

    /// The path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::PermissionDenied(path) | Self::NotFound(path) | Self::Io { path, .. } => path,
        }
    }
}
