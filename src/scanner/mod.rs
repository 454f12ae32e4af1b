//! Scanner module for directory traversal and lazy content reads.
//!
//! This module provides functionality for:
//! - Deterministic, single-threaded directory walking using walkdir
//! - File descriptors with memoized prefix and CRC-32 checksum
//! - Per-entry walk outcomes (candidate, skip with reason, error)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`] - Directory traversal and entry classification
//! - [`descriptor`] - [`FileDescriptor`] with lazily computed content data
//! - [`checksum`] - Streaming CRC-32 and prefix reads
//!
//! # Example
//!
//! ```no_run
//! use dupfind::scanner::{WalkOutcome, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     min_size: 1024, // Skip files under 1KB
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for outcome in walker.walk() {
//!     match outcome {
//!         WalkOutcome::Candidate(file) => println!("{}: {} bytes", file.path().display(), file.size()),
//!         WalkOutcome::Skipped { path, reason } => println!("skip {}: {}", path.display(), reason),
//!         WalkOutcome::Failed(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod checksum;
pub mod descriptor;
pub mod walker;

use std::fmt;
use std::fs::FileType;
use std::path::PathBuf;

// Re-export main types
pub use checksum::{checksum_file, read_prefix, PREFIX_SIZE};
pub use descriptor::{FileDescriptor, ReadCounts};
pub use walker::{SkipReason, WalkOutcome, Walker};

/// Substring excluded from every scan unless the configuration overrides it.
///
/// Kept for parity with the legacy tool, which refused to descend into
/// Windows "Application Data" junctions.
pub const DEFAULT_EXCLUDED_SUBSTRING: &str = "Application Data";

/// Kind of filesystem entry a descriptor was built from.
///
/// Symlinks are never followed, so a link shows up as [`EntryKind::Other`]
/// together with sockets, FIFOs and device nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory (walked into, never compared)
    Directory,
    /// Symlink, socket, FIFO, block or character device
    Other,
}

impl EntryKind {
    /// Classify a `FileType` obtained without following symlinks.
    #[must_use]
    pub fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_file() {
            Self::File
        } else if file_type.is_dir() {
            Self::Directory
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Configuration for directory walking.
///
/// Controls the size threshold and the excluded path substrings.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Minimum file size to include (in bytes).
    /// Files strictly smaller than this are skipped.
    pub min_size: u64,

    /// Path substrings that disqualify an entry (and, for directories,
    /// everything below it).
    pub excluded_substrings: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            min_size: 0,
            excluded_substrings: vec![DEFAULT_EXCLUDED_SUBSTRING.to_string()],
        }
    }
}

impl WalkerConfig {
    /// Create a new configuration.
    ///
    /// # Arguments
    ///
    /// * `min_size` - Minimum file size filter
    /// * `excluded_substrings` - Path substrings to exclude
    #[must_use]
    pub fn new(min_size: u64, excluded_substrings: Vec<String>) -> Self {
        Self {
            min_size,
            excluded_substrings,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A directory loop was detected.
    #[error("Filesystem loop at {0}")]
    Loop(PathBuf),

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
    /// Path of the entry that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Loop(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}

/// Errors that can occur while reading file content.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Map an I/O error to the matching variant for `path`.
    #[must_use]
    pub fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
