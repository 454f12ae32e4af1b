//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Classification keys (size and optional extension)
//! - The bucket table of not-yet-matched representatives
//! - Incremental prefix / checksum comparison
//! - The streaming producer pipeline
//!
//! # Architecture
//!
//! - [`key`] - [`ClassificationKey`]
//! - [`buckets`] - [`BucketTable`]
//! - [`engine`] - [`MatchEngine`] and the [`compare`] predicate
//! - [`pipeline`] - [`ScanPipeline`], its states and [`ScanSummary`]

pub mod buckets;
pub mod engine;
pub mod key;
pub mod pipeline;

use std::path::PathBuf;

pub use buckets::BucketTable;
pub use engine::{compare, Comparison, EngineStats, MatchEngine};
pub use key::ClassificationKey;
pub use pipeline::{
    DuplicatePair, PipelineConfig, PipelineState, ScanHandle, ScanPipeline, ScanSummary,
    SkipCounts, SkippedEntry, DEFAULT_CHANNEL_CAPACITY,
};

/// Errors that end a scan.
///
/// Per-entry problems never show up here; they are collected in
/// [`ScanSummary::errors`] and the walk carries on.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The receiving end of the duplicate channel went away.
    #[error("Result consumer disconnected")]
    ConsumerDisconnected,

    /// The walking thread panicked.
    #[error("Scan worker panicked")]
    WorkerPanicked,

    /// The pipeline has already been run.
    #[error("Scan pipeline already ran")]
    AlreadyRun,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred outside of any single entry.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
