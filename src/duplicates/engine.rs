//! Match engine: decides whether a new file duplicates a bucket member.
//!
//! # Overview
//!
//! Comparison is incremental and stops at the first cheap difference:
//! 1. **Key** - size and (optionally) extension select a bucket
//! 2. **Prefix** - the first [`PREFIX_SIZE`](crate::scanner::PREFIX_SIZE) bytes are compared
//! 3. **Checksum** - only for equal prefixes, the full-content CRC-32 decides
//!
//! Equality is checksum-level, not byte-for-byte: two same-size files with
//! identical prefixes and colliding CRC-32 values would be reported as
//! duplicates.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::duplicates::{BucketTable, MatchEngine};
//! use dupfind::scanner::FileDescriptor;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let mut table = BucketTable::new();
//! let mut engine = MatchEngine::new(true);
//!
//! for name in ["/data/a.txt", "/data/b.txt"] {
//!     let path = PathBuf::from(name);
//!     let metadata = std::fs::symlink_metadata(&path).unwrap();
//!     let file = Arc::new(FileDescriptor::from_metadata(path, &metadata));
//!     if let Some(original) = engine.offer(Arc::clone(&file), &mut table).unwrap() {
//!         println!("{} == {}", file.path().display(), original.path().display());
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::buckets::BucketTable;
use super::key::ClassificationKey;
use super::FinderError;
use crate::scanner::{FileDescriptor, HashError};

/// Outcome of comparing two descriptors.
#[derive(Debug)]
pub enum Comparison {
    /// Prefixes and checksums match.
    Equal,
    /// Leading bytes differ; no checksum was computed.
    PrefixMismatch,
    /// Leading bytes match but checksums differ.
    ChecksumMismatch,
    /// One of the files could not be read. Never treated as equal.
    Unreadable(HashError),
}

impl Comparison {
    /// Whether the files were proven equal.
    #[must_use]
    pub fn is_equal(&self) -> bool {
        matches!(self, Self::Equal)
    }
}

/// Compare two descriptors, reading as little content as possible.
///
/// The prefix check runs first and short-circuits; checksums are only
/// computed when the prefixes are identical.
#[must_use]
pub fn compare(a: &FileDescriptor, b: &FileDescriptor) -> Comparison {
    let prefix_a = match a.prefix() {
        Ok(p) => p,
        Err(e) => return Comparison::Unreadable(e),
    };
    let prefix_b = match b.prefix() {
        Ok(p) => p,
        Err(e) => return Comparison::Unreadable(e),
    };
    if prefix_a != prefix_b {
        return Comparison::PrefixMismatch;
    }

    let crc_a = match a.checksum() {
        Ok(c) => c,
        Err(e) => return Comparison::Unreadable(e),
    };
    let crc_b = match b.checksum() {
        Ok(c) => c,
        Err(e) => return Comparison::Unreadable(e),
    };

    if crc_a == crc_b {
        Comparison::Equal
    } else {
        Comparison::ChecksumMismatch
    }
}

/// Counters describing the work done by a [`MatchEngine`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Files offered
    pub offered: usize,
    /// Files inserted as new representatives
    pub inserted: usize,
    /// Files matched to an existing representative
    pub duplicates: usize,
    /// Pairwise comparisons performed
    pub comparisons: usize,
    /// Comparisons settled by the prefix alone
    pub prefix_rejections: usize,
    /// Comparisons that reached the checksum stage and differed there
    pub checksum_rejections: usize,
    /// Comparisons abandoned because a file could not be read
    pub read_failures: usize,
}

/// Classifies offered files against a [`BucketTable`].
#[derive(Debug, Default)]
pub struct MatchEngine {
    extension_sensitive: bool,
    shutdown_flag: Option<Arc<AtomicBool>>,
    stats: EngineStats,
}

impl MatchEngine {
    /// Create an engine.
    ///
    /// # Arguments
    ///
    /// * `extension_sensitive` - Whether files with different extensions may match
    #[must_use]
    pub fn new(extension_sensitive: bool) -> Self {
        Self {
            extension_sensitive,
            shutdown_flag: None,
            stats: EngineStats::default(),
        }
    }

    /// Set the shutdown flag, checked before every comparison.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Whether extensions take part in the key.
    #[must_use]
    pub fn extension_sensitive(&self) -> bool {
        self.extension_sensitive
    }

    /// Work counters so far.
    #[must_use]
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Offer a file to the table.
    ///
    /// Returns the representative it duplicates, or `None` after inserting it
    /// as a new representative. A duplicate is never inserted, so only the
    /// first-seen copy of any content stays eligible for later matches.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if shutdown is requested while
    /// the bucket is being scanned. The file is not inserted in that case.
    pub fn offer(
        &mut self,
        file: Arc<FileDescriptor>,
        table: &mut BucketTable,
    ) -> Result<Option<Arc<FileDescriptor>>, FinderError> {
        self.stats.offered += 1;
        let key = ClassificationKey::for_descriptor(&file, self.extension_sensitive);

        if let Some(bucket) = table.bucket(&key) {
            for candidate in bucket {
                if self.is_shutdown_requested() {
                    log::debug!("Match engine: Shutdown requested, abandoning bucket scan");
                    return Err(FinderError::Interrupted);
                }

                self.stats.comparisons += 1;
                match compare(candidate, &file) {
                    Comparison::Equal => {
                        log::debug!(
                            "{} == {}",
                            file.path().display(),
                            candidate.path().display()
                        );
                        self.stats.duplicates += 1;
                        return Ok(Some(Arc::clone(candidate)));
                    }
                    Comparison::PrefixMismatch => self.stats.prefix_rejections += 1,
                    Comparison::ChecksumMismatch => self.stats.checksum_rejections += 1,
                    Comparison::Unreadable(e) => {
                        log::debug!("Error accessing {}: {}", file.path().display(), e);
                        self.stats.read_failures += 1;
                    }
                }
            }
        }

        log::trace!("New representative for [{}]: {}", key, file.path().display());
        table.insert(key, file);
        self.stats.inserted += 1;
        Ok(None)
    }
}
