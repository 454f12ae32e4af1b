//! Safe removal of a confirmed duplicate.
//!
//! # Safety
//!
//! Before anything is removed:
//! - the original must still exist, so at least one copy always survives
//! - the duplicate must not be the original under another spelling
//! - the duplicate must still have the size recorded during the walk
//!
//! Removal goes to the system trash unless permanent deletion was asked for.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::actions::delete::{delete_duplicate, DeleteConfig};
//! use dupfind::duplicates::DuplicatePair;
//!
//! fn remove(pair: &DuplicatePair) {
//!     match delete_duplicate(pair, &DeleteConfig::trash()) {
//!         Ok(result) => println!("Moved to trash: {}", result.path.display()),
//!         Err(e) => eprintln!("Failed: {}", e),
//!     }
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::duplicates::DuplicatePair;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File size changed since it was scanned.
    #[error("file modified since scan: {path} (size {expected} -> {actual})")]
    Modified {
        /// Duplicate path
        path: PathBuf,
        /// Size seen during the walk
        expected: u64,
        /// Size now
        actual: u64,
    },

    /// The original is gone, so the duplicate may be the last copy.
    #[error("original no longer exists: {0}")]
    OriginalMissing(PathBuf),

    /// Duplicate and original resolve to the same file.
    #[error("refusing to delete {0}: it is the original")]
    SameFile(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// Path that could not be trashed
        path: PathBuf,
        /// Message from the trash backend
        message: String,
    },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {source}")]
    PermanentDeleteFailed {
        /// Path that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

/// Configuration for deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteConfig {
    /// Use permanent deletion instead of trash.
    pub permanent: bool,
}

impl DeleteConfig {
    /// Move files to the system trash.
    #[must_use]
    pub fn trash() -> Self {
        Self { permanent: false }
    }

    /// Remove files permanently.
    #[must_use]
    pub fn permanent() -> Self {
        Self { permanent: true }
    }
}

/// Delete the duplicate half of a pair after re-checking it.
///
/// # Errors
///
/// - [`DeleteError::OriginalMissing`] if the original vanished
/// - [`DeleteError::SameFile`] if both paths name the same directory entry
/// - [`DeleteError::Modified`] if the duplicate's size changed
/// - [`DeleteError::NotFound`] / [`DeleteError::PermissionDenied`] from the filesystem
/// - [`DeleteError::TrashFailed`] / [`DeleteError::PermanentDeleteFailed`] from removal
pub fn delete_duplicate(
    pair: &DuplicatePair,
    config: &DeleteConfig,
) -> Result<DeleteResult, DeleteError> {
    let path = pair.duplicate.path();
    let original = pair.original.path();

    verify_preserves_copy(path, original)?;

    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
    if metadata.len() != pair.size() {
        log::warn!(
            "File modified since scan: {} (size changed from {} to {})",
            path.display(),
            pair.size(),
            metadata.len()
        );
        return Err(DeleteError::Modified {
            path: path.to_path_buf(),
            expected: pair.size(),
            actual: metadata.len(),
        });
    }

    if config.permanent {
        fs::remove_file(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                DeleteError::from_io(path, e)
            }
            _ => DeleteError::PermanentDeleteFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        log::info!("Permanently deleted: {} ({} bytes)", path.display(), pair.size());
    } else {
        trash::delete(path).map_err(|e| {
            log::error!("Trash operation failed for {}: {}", path.display(), e);
            DeleteError::TrashFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        log::info!("Moved to trash: {} ({} bytes)", path.display(), pair.size());
    }

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size: pair.size(),
        permanent: config.permanent,
    })
}

/// Make sure removing `duplicate` leaves `original` in place.
fn verify_preserves_copy(duplicate: &Path, original: &Path) -> Result<(), DeleteError> {
    if fs::symlink_metadata(original).is_err() {
        log::warn!(
            "Original {} is gone, keeping {}",
            original.display(),
            duplicate.display()
        );
        return Err(DeleteError::OriginalMissing(original.to_path_buf()));
    }

    let same = match (fs::canonicalize(duplicate), fs::canonicalize(original)) {
        (Ok(a), Ok(b)) => a == b,
        _ => duplicate == original,
    };
    if same {
        return Err(DeleteError::SameFile(duplicate.to_path_buf()));
    }

    Ok(())
}
