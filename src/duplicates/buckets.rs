//! Bucket table of not-yet-matched representatives.
//!
//! # Overview
//!
//! The table maps each [`ClassificationKey`] to the files seen so far under
//! that key which have not matched anything. Only one representative per
//! distinct content survives in a bucket: a file found equal to a member is
//! reported and never inserted.
//!
//! The table is owned by a single pipeline and mutated only from the walking
//! thread. Sharing it between walkers would need a lock around
//! [`crate::duplicates::MatchEngine::offer`].

use std::collections::HashMap;
use std::sync::Arc;

use super::key::ClassificationKey;
use crate::scanner::FileDescriptor;

/// Mapping from classification key to ordered representatives.
#[derive(Debug, Default)]
pub struct BucketTable {
    buckets: HashMap<ClassificationKey, Vec<Arc<FileDescriptor>>>,
    entries: usize,
}

impl BucketTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Representatives for `key`, in insertion order.
    #[must_use]
    pub fn bucket(&self, key: &ClassificationKey) -> Option<&[Arc<FileDescriptor>]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Append a representative, creating the bucket on first use.
    pub fn insert(&mut self, key: ClassificationKey, file: Arc<FileDescriptor>) {
        self.buckets.entry(key).or_default().push(file);
        self.entries += 1;
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total representatives across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Whether the table holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Iterate over every bucket.
    pub fn iter(&self) -> impl Iterator<Item = (&ClassificationKey, &[Arc<FileDescriptor>])> {
        self.buckets.iter().map(|(k, v)| (k, v.as_slice()))
    }
}
