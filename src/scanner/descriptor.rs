//! File descriptors with lazily computed, memoized content data.
//!
//! A [`FileDescriptor`] is created from directory metadata alone. The leading
//! bytes and the full-content checksum are read only when a comparison needs
//! them, and once read they are cached for the lifetime of the descriptor.
//!
//! A failed read is not cached: the value stays absent and the next access
//! tries again. Files are assumed not to change during a scan, so a cached
//! value never needs invalidating.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use super::checksum::{checksum_file, read_prefix, PREFIX_SIZE};
use super::{EntryKind, HashError};

/// Number of content reads a descriptor has performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadCounts {
    /// Prefix reads attempted (successful or not)
    pub prefix: usize,
    /// Full checksum reads attempted (successful or not)
    pub checksum: usize,
}

/// One filesystem entry visited by the walk.
#[derive(Debug)]
pub struct FileDescriptor {
    path: PathBuf,
    size: u64,
    kind: EntryKind,
    prefix: OnceLock<Vec<u8>>,
    checksum: OnceLock<u32>,
    prefix_reads: AtomicUsize,
    checksum_reads: AtomicUsize,
}

impl FileDescriptor {
    /// Create a descriptor from already known attributes.
    ///
    /// No content is read.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, kind: EntryKind) -> Self {
        Self {
            path,
            size,
            kind,
            prefix: OnceLock::new(),
            checksum: OnceLock::new(),
            prefix_reads: AtomicUsize::new(0),
            checksum_reads: AtomicUsize::new(0),
        }
    }

    /// Create a descriptor from `symlink_metadata`-style metadata.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupfind::scanner::FileDescriptor;
    /// use std::path::PathBuf;
    ///
    /// let path = PathBuf::from("/tmp/report.pdf");
    /// let metadata = std::fs::symlink_metadata(&path).unwrap();
    /// let file = FileDescriptor::from_metadata(path, &metadata);
    /// println!("{} bytes", file.size());
    /// ```
    #[must_use]
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        Self::new(
            path,
            metadata.len(),
            EntryKind::from_file_type(metadata.file_type()),
        )
    }

    /// Path of the entry.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes as reported by metadata at walk time.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Kind of the entry.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Whether this is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Whether the entry may take part in a scan at all.
    ///
    /// Only regular files and directories qualify, and only when their path
    /// contains none of the `excluded` substrings.
    #[must_use]
    pub fn is_regular_candidate(&self, excluded: &[String]) -> bool {
        if self.kind == EntryKind::Other {
            return false;
        }
        let path = self.path.to_string_lossy();
        !excluded
            .iter()
            .any(|needle| !needle.is_empty() && path.contains(needle.as_str()))
    }

    /// Leading bytes of the file, read on first use.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read. The prefix
    /// stays absent and the next call retries.
    pub fn prefix(&self) -> Result<&[u8], HashError> {
        if let Some(prefix) = self.prefix.get() {
            return Ok(prefix);
        }

        self.prefix_reads.fetch_add(1, Ordering::Relaxed);
        let prefix = read_prefix(&self.path, PREFIX_SIZE)?;
        log::trace!("Read prefix of {}", self.path.display());
        Ok(self.prefix.get_or_init(|| prefix))
    }

    /// CRC-32 of the full content, computed on first use.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read. The checksum
    /// stays absent and the next call retries.
    pub fn checksum(&self) -> Result<u32, HashError> {
        if let Some(&crc) = self.checksum.get() {
            return Ok(crc);
        }

        self.checksum_reads.fetch_add(1, Ordering::Relaxed);
        let crc = checksum_file(&self.path)?;
        log::trace!("Computed CRC {:08x} for {}", crc, self.path.display());
        Ok(*self.checksum.get_or_init(|| crc))
    }

    /// Cached prefix, if one has been read successfully.
    #[must_use]
    pub fn cached_prefix(&self) -> Option<&[u8]> {
        self.prefix.get().map(Vec::as_slice)
    }

    /// Cached checksum, if one has been computed successfully.
    #[must_use]
    pub fn cached_checksum(&self) -> Option<u32> {
        self.checksum.get().copied()
    }

    /// How many content reads this descriptor has attempted.
    #[must_use]
    pub fn read_counts(&self) -> ReadCounts {
        ReadCounts {
            prefix: self.prefix_reads.load(Ordering::Relaxed),
            checksum: self.checksum_reads.load(Ordering::Relaxed),
        }
    }
}
