//! Directory walker implementation using walkdir for deterministic traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct, which visits every entry under
//! a root directory and classifies it into a [`WalkOutcome`]: a comparison
//! candidate, an entry skipped for a stated [`SkipReason`], or a per-entry
//! error that does not stop the walk.
//!
//! # Features
//!
//! - Single-threaded, depth-first walk sorted by file name (reproducible order)
//! - Symlinks are never followed and never compared
//! - Excluded path substrings (excluded directories are not descended into)
//! - Minimum size filter (inclusive threshold)
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupfind::scanner::{WalkOutcome, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let candidates = walker
//!     .walk()
//!     .filter(|outcome| matches!(outcome, WalkOutcome::Candidate(_)))
//!     .count();
//! println!("{candidates} files to compare");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use super::descriptor::FileDescriptor;
use super::{EntryKind, ScanError, WalkerConfig};

/// Why an entry did not become a comparison candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Symlink, socket, FIFO or device node.
    NotRegular,
    /// Path contains an excluded substring.
    Excluded,
    /// Directories are walked into, never compared.
    Directory,
    /// File is smaller than the configured minimum.
    BelowMinSize {
        /// Size of the file
        size: u64,
        /// Configured threshold
        min: u64,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRegular => write!(f, "not a regular file"),
            Self::Excluded => write!(f, "excluded path"),
            Self::Directory => write!(f, "directory"),
            Self::BelowMinSize { size, min } => {
                write!(f, "size {size} below minimum {min}")
            }
        }
    }
}

/// Result of visiting one entry.
#[derive(Debug)]
pub enum WalkOutcome {
    /// A regular file that should be offered to the match engine.
    Candidate(FileDescriptor),
    /// An entry that was deliberately passed over.
    Skipped {
        /// Entry path
        path: PathBuf,
        /// Why it was skipped
        reason: SkipReason,
    },
    /// The entry could not be inspected. The walk continues with its siblings.
    Failed(ScanError),
}

/// Directory walker for deterministic file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walk ends at the next entry.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Root directory of the walk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the directory tree, yielding one outcome per entry.
    ///
    /// The root itself is yielded first (as a skipped directory), then its
    /// children in file-name order, depth first.
    pub fn walk(&self) -> Walk<'_> {
        let inner = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Walk {
            walker: self,
            inner,
        }
    }

    /// Classify a visited entry.
    fn classify(&self, path: PathBuf, metadata: &std::fs::Metadata) -> WalkOutcome {
        let file = FileDescriptor::from_metadata(path, metadata);

        if !file.is_regular_candidate(&self.config.excluded_substrings) {
            let reason = if file.kind() == EntryKind::Other {
                log::trace!("Not a regular file, ignoring: {}", file.path().display());
                SkipReason::NotRegular
            } else {
                log::trace!("Excluded path, ignoring: {}", file.path().display());
                SkipReason::Excluded
            };
            return WalkOutcome::Skipped {
                path: file.path().to_path_buf(),
                reason,
            };
        }

        if file.is_dir() {
            log::trace!("Walking into {}", file.path().display());
            return WalkOutcome::Skipped {
                path: file.path().to_path_buf(),
                reason: SkipReason::Directory,
            };
        }

        if file.size() < self.config.min_size {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                file.size(),
                file.path().display()
            );
            return WalkOutcome::Skipped {
                path: file.path().to_path_buf(),
                reason: SkipReason::BelowMinSize {
                    size: file.size(),
                    min: self.config.min_size,
                },
            };
        }

        WalkOutcome::Candidate(file)
    }

    /// Handle walkdir errors.
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        use std::io::ErrorKind;

        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if error.loop_ancestor().is_some() {
            log::warn!("Filesystem loop detected at {}", path.display());
            return ScanError::Loop(path);
        }

        match error.into_io_error() {
            Some(io) if io.kind() == ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(io) if io.kind() == ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path)
            }
            Some(io) => {
                log::warn!("I/O error for {}: {}", path.display(), io);
                ScanError::Io { path, source: io }
            }
            None => {
                log::warn!("Walker error for {}", path.display());
                ScanError::Io {
                    path,
                    source: std::io::Error::other("directory walk failed"),
                }
            }
        }
    }
}

/// Iterator over the outcomes of a walk.
///
/// Created by [`Walker::walk`].
pub struct Walk<'a> {
    walker: &'a Walker,
    inner: walkdir::IntoIter,
}

impl Iterator for Walk<'_> {
    type Item = WalkOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        if self.walker.is_shutdown_requested() {
            log::debug!("Walker: Shutdown requested, stopping iteration");
            return None;
        }

        let entry = match self.inner.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(WalkOutcome::Failed(self.walker.handle_walk_error(e))),
        };

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(WalkOutcome::Failed(self.walker.handle_walk_error(e))),
        };

        let outcome = self.walker.classify(entry.into_path(), &metadata);

        // Nothing below an excluded directory can qualify either.
        if matches!(
            outcome,
            WalkOutcome::Skipped {
                reason: SkipReason::Excluded,
                ..
            }
        ) && metadata.is_dir()
        {
            self.inner.skip_current_dir();
        }

        Some(outcome)
    }
}
