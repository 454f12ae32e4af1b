//! Streaming scan pipeline: walk, classify, emit duplicate pairs.
//!
//! # Overview
//!
//! A [`ScanPipeline`] owns one [`BucketTable`] and one [`MatchEngine`]. It walks
//! the tree, offers each candidate to the engine and sends every confirmed
//! duplicate as a [`DuplicatePair`] over a bounded channel while the walk is
//! still running. A full channel suspends the walk until the consumer catches
//! up.
//!
//! ```text
//! Idle ──run──▶ Walking ──walk done / error──▶ Draining ──sender dropped──▶ Closed
//! ```
//!
//! Sends are attempted in short slices so that a shutdown request is noticed
//! even while the producer is blocked on a full channel.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::duplicates::{PipelineConfig, ScanPipeline};
//!
//! let pipeline = ScanPipeline::new(".", PipelineConfig::default());
//! let handle = pipeline.spawn().unwrap();
//!
//! for pair in handle.receiver() {
//!     println!("{} duplicates {}", pair.duplicate.path().display(), pair.original.path().display());
//! }
//!
//! let summary = handle.join().unwrap();
//! println!("{} duplicates", summary.duplicates);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, SendTimeoutError, Sender};

use super::buckets::BucketTable;
use super::engine::{EngineStats, MatchEngine};
use super::FinderError;
use crate::progress::ProgressCallback;
use crate::scanner::{FileDescriptor, ScanError, SkipReason, WalkOutcome, Walker, WalkerConfig};

/// Default capacity of the duplicate channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// How long a single blocked send waits before re-checking for shutdown.
const SEND_SLICE: Duration = Duration::from_millis(50);

/// Lifecycle of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Created; the bucket table is empty.
    Idle,
    /// Walking the tree and emitting pairs.
    Walking,
    /// Traversal finished; the sender is being released.
    Draining,
    /// Sender dropped; nothing more will be sent.
    Closed,
}

/// A confirmed duplicate and the representative it matched.
#[derive(Debug, Clone)]
pub struct DuplicatePair {
    /// File found later in the walk
    pub duplicate: Arc<FileDescriptor>,
    /// First-seen file with the same content
    pub original: Arc<FileDescriptor>,
}

impl DuplicatePair {
    /// Size of the duplicate in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.duplicate.size()
    }
}

/// Configuration for a [`ScanPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Walk options (minimum size, excluded substrings)
    pub walker: WalkerConfig,
    /// Whether extensions take part in classification
    pub extension_sensitive: bool,
    /// Capacity of the duplicate channel (at least 1)
    pub channel_capacity: usize,
    /// Keep the path of every skipped non-directory in [`ScanSummary::skipped`]
    pub record_skipped: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            walker: WalkerConfig::default(),
            extension_sensitive: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            record_skipped: false,
        }
    }
}

impl PipelineConfig {
    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.walker.min_size = min_size;
        self
    }

    /// Set extension sensitivity.
    #[must_use]
    pub fn with_extension_sensitive(mut self, sensitive: bool) -> Self {
        self.extension_sensitive = sensitive;
        self
    }

    /// Replace the excluded path substrings.
    #[must_use]
    pub fn with_excluded_substrings(mut self, excluded: Vec<String>) -> Self {
        self.walker.excluded_substrings = excluded;
        self
    }

    /// Set the channel capacity. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Record skipped paths individually. Off by default; counts are always kept.
    #[must_use]
    pub fn with_skip_recording(mut self, record: bool) -> Self {
        self.record_skipped = record;
        self
    }
}

/// Skip counts by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    /// Symlinks and special files
    pub not_regular: usize,
    /// Paths matching an excluded substring
    pub excluded: usize,
    /// Directories (root included)
    pub directories: usize,
    /// Files below the minimum size
    pub below_min_size: usize,
}

impl SkipCounts {
    fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::NotRegular => self.not_regular += 1,
            SkipReason::Excluded => self.excluded += 1,
            SkipReason::Directory => self.directories += 1,
            SkipReason::BelowMinSize { .. } => self.below_min_size += 1,
        }
    }

    /// Total skipped entries.
    #[must_use]
    pub fn total(&self) -> usize {
        self.not_regular + self.excluded + self.directories + self.below_min_size
    }
}

/// An entry passed over during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Entry path
    pub path: PathBuf,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// Summary of one pipeline run.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Entries visited, root included
    pub visited: usize,
    /// Regular files offered to the match engine
    pub candidates: usize,
    /// Duplicate pairs sent
    pub duplicates: usize,
    /// Total size of the sent duplicates
    pub duplicate_bytes: u64,
    /// Skip counts by reason
    pub skip_counts: SkipCounts,
    /// Skipped entries other than directories, in walk order. Empty unless
    /// [`PipelineConfig::with_skip_recording`] is enabled.
    pub skipped: Vec<SkippedEntry>,
    /// Per-entry traversal errors, in walk order
    pub errors: Vec<ScanError>,
    /// Match engine counters
    pub engine: EngineStats,
    /// Distinct classification keys at the end of the walk
    pub buckets: usize,
    /// Representatives held by the table at the end of the walk
    pub representatives: usize,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl ScanSummary {
    /// Whether any entry could not be inspected or read.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.engine.read_failures > 0
    }

    /// Skip reason recorded for `path`, if it was skipped as a non-directory
    /// while skip recording was enabled.
    #[must_use]
    pub fn skip_reason(&self, path: &Path) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|entry| entry.path == path)
            .map(|entry| entry.reason)
    }
}

/// Walks one tree and streams duplicate pairs.
pub struct ScanPipeline {
    root: PathBuf,
    config: PipelineConfig,
    table: BucketTable,
    state: PipelineState,
    shutdown_flag: Arc<AtomicBool>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ScanPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanPipeline")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("state", &self.state)
            .field("representatives", &self.table.len())
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ScanPipeline {
    /// Create an idle pipeline for `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: PipelineConfig) -> Self {
        Self {
            root: root.into(),
            config,
            table: BucketTable::new(),
            state: PipelineState::Idle,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            progress_callback: None,
        }
    }

    /// Share a shutdown flag with the rest of the process.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = flag;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Root of the walk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Bucket table built so far.
    #[must_use]
    pub fn table(&self) -> &BucketTable {
        &self.table
    }

    /// Allocate a channel with the configured capacity.
    #[must_use]
    pub fn channel(&self) -> (Sender<DuplicatePair>, Receiver<DuplicatePair>) {
        crossbeam_channel::bounded(self.config.channel_capacity.max(1))
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Run the walk on the calling thread, sending pairs into `tx`.
    ///
    /// The sender is dropped before this returns, whatever the outcome, so a
    /// consumer iterating the receiver always terminates.
    ///
    /// # Errors
    ///
    /// - [`FinderError::AlreadyRun`] if the pipeline is not idle
    /// - [`FinderError::PathNotFound`] / [`FinderError::NotADirectory`] for a bad root
    /// - [`FinderError::Interrupted`] if shutdown was requested
    /// - [`FinderError::ConsumerDisconnected`] if the receiver was dropped
    pub fn run(&mut self, tx: Sender<DuplicatePair>) -> Result<ScanSummary, FinderError> {
        if self.state != PipelineState::Idle {
            return Err(FinderError::AlreadyRun);
        }

        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        self.state = PipelineState::Walking;
        log::info!("Starting duplicate scan of {}", self.root.display());
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start("walking", 0);
        }

        let result = self.walk_into(&tx, &mut summary);

        self.state = PipelineState::Draining;
        drop(tx);
        self.state = PipelineState::Closed;

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end("walking");
        }

        summary.buckets = self.table.bucket_count();
        summary.representatives = self.table.len();
        summary.duration = start_time.elapsed();

        match result {
            Ok(()) => {
                log::info!(
                    "Scan complete: {} entries, {} candidates, {} duplicates, {} errors in {:.2?}",
                    summary.visited,
                    summary.candidates,
                    summary.duplicates,
                    summary.errors.len(),
                    summary.duration
                );
                Ok(summary)
            }
            Err(e) => {
                log::info!(
                    "Scan stopped after {} entries and {} duplicates: {}",
                    summary.visited,
                    summary.duplicates,
                    e
                );
                Err(e)
            }
        }
    }

    fn walk_into(
        &mut self,
        tx: &Sender<DuplicatePair>,
        summary: &mut ScanSummary,
    ) -> Result<(), FinderError> {
        if !self.root.exists() {
            return Err(FinderError::PathNotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(FinderError::NotADirectory(self.root.clone()));
        }

        let walker = Walker::new(&self.root, self.config.walker.clone())
            .with_shutdown_flag(Arc::clone(&self.shutdown_flag));
        let mut engine = MatchEngine::new(self.config.extension_sensitive)
            .with_shutdown_flag(Arc::clone(&self.shutdown_flag));

        let result = self.drive(&walker, &mut engine, tx, summary);
        summary.engine = engine.stats().clone();
        result?;

        // The walker ends silently on shutdown.
        if self.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        Ok(())
    }

    fn drive(
        &mut self,
        walker: &Walker,
        engine: &mut MatchEngine,
        tx: &Sender<DuplicatePair>,
        summary: &mut ScanSummary,
    ) -> Result<(), FinderError> {
        for outcome in walker.walk() {
            summary.visited += 1;

            match outcome {
                WalkOutcome::Candidate(file) => {
                    summary.candidates += 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback.on_progress(summary.visited, &file.path().to_string_lossy());
                        callback.on_item_completed(file.size());
                    }

                    let file = Arc::new(file);
                    if let Some(original) = engine.offer(Arc::clone(&file), &mut self.table)? {
                        let pair = DuplicatePair {
                            duplicate: file,
                            original,
                        };
                        summary.duplicates += 1;
                        summary.duplicate_bytes += pair.size();
                        self.send(tx, pair)?;

                        if let Some(ref callback) = self.progress_callback {
                            callback.on_message(&format!("{} duplicates", summary.duplicates));
                        }
                    }
                }
                WalkOutcome::Skipped { path, reason } => {
                    summary.skip_counts.record(reason);
                    if self.config.record_skipped && reason != SkipReason::Directory {
                        summary.skipped.push(SkippedEntry { path, reason });
                    }
                }
                WalkOutcome::Failed(e) => {
                    summary.errors.push(e);
                }
            }
        }
        Ok(())
    }

    /// Send one pair, waiting in slices while the channel is full.
    fn send(&self, tx: &Sender<DuplicatePair>, pair: DuplicatePair) -> Result<(), FinderError> {
        let mut pending = pair;
        loop {
            if self.is_shutdown_requested() {
                log::debug!("Pipeline: Shutdown requested while sending");
                return Err(FinderError::Interrupted);
            }
            match tx.send_timeout(pending, SEND_SLICE) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(p)) => pending = p,
                Err(SendTimeoutError::Disconnected(_)) => {
                    if self.is_shutdown_requested() {
                        return Err(FinderError::Interrupted);
                    }
                    log::debug!("Pipeline: Receiver dropped, stopping walk");
                    return Err(FinderError::ConsumerDisconnected);
                }
            }
        }
    }

    /// Run the pipeline on its own thread.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Io`] if the thread cannot be spawned.
    pub fn spawn(self) -> Result<ScanHandle, FinderError> {
        let (tx, rx) = self.channel();
        let mut pipeline = self;
        let handle = std::thread::Builder::new()
            .name("dupfind-walker".to_string())
            .spawn(move || pipeline.run(tx))?;

        Ok(ScanHandle {
            receiver: rx,
            handle,
        })
    }
}

/// A pipeline running on a background thread.
///
/// Created by [`ScanPipeline::spawn`].
#[derive(Debug)]
pub struct ScanHandle {
    receiver: Receiver<DuplicatePair>,
    handle: JoinHandle<Result<ScanSummary, FinderError>>,
}

impl ScanHandle {
    /// Receiving end of the duplicate channel.
    #[must_use]
    pub fn receiver(&self) -> &Receiver<DuplicatePair> {
        &self.receiver
    }

    /// Wait for the walk to finish.
    ///
    /// The receiver is dropped first, so a producer still blocked on a full
    /// channel stops with [`FinderError::ConsumerDisconnected`] instead of
    /// waiting forever.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's own error, or [`FinderError::WorkerPanicked`].
    pub fn join(self) -> Result<ScanSummary, FinderError> {
        let Self { receiver, handle } = self;
        drop(receiver);
        handle.join().map_err(|_| FinderError::WorkerPanicked)?
    }
}
