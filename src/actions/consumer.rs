//! Consumer side of the duplicate channel.
//!
//! [`ResultConsumer`] receives [`DuplicatePair`]s in discovery order, applies
//! the configured [`Action`] to the duplicate half of each pair and keeps the
//! running totals that are reported once the channel closes.
//!
//! Output and prompt answers go through generic writer / reader parameters so
//! tests can drive the consumer with in-memory buffers.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytesize::ByteSize;
use crossbeam_channel::{Receiver, RecvTimeoutError};

use super::delete::{delete_duplicate, DeleteConfig, DeleteError};
use super::Action;
use crate::duplicates::{DuplicatePair, FinderError};

/// How long a single receive waits before re-checking for shutdown.
const RECV_SLICE: Duration = Duration::from_millis(50);

/// Totals kept by the consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Pairs received
    pub duplicates: usize,
    /// Sum of duplicate sizes
    pub duplicate_bytes: u64,
    /// Duplicates removed
    pub deleted: usize,
    /// Bytes removed
    pub deleted_bytes: u64,
    /// Deletions declined at the prompt
    pub declined: usize,
    /// Deletions that failed
    pub delete_failures: usize,
}

/// Applies an [`Action`] to each received pair.
pub struct ResultConsumer<W, R> {
    action: Action,
    delete_config: DeleteConfig,
    assume_yes: bool,
    out: W,
    input: R,
    shutdown_flag: Option<Arc<AtomicBool>>,
    stats: ConsumerStats,
    warned: bool,
}

impl<W: Write, R: BufRead> ResultConsumer<W, R> {
    /// Create a consumer writing results to `out` and reading prompt answers
    /// from `input`.
    pub fn new(action: Action, out: W, input: R) -> Self {
        Self {
            action,
            delete_config: DeleteConfig::default(),
            assume_yes: false,
            out,
            input,
            shutdown_flag: None,
            stats: ConsumerStats::default(),
            warned: false,
        }
    }

    /// Set how deletions are carried out.
    #[must_use]
    pub fn with_delete_config(mut self, config: DeleteConfig) -> Self {
        self.delete_config = config;
        self
    }

    /// Skip the per-file delete prompt.
    #[must_use]
    pub fn with_assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    /// Set the shutdown flag, checked between receives.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Totals so far.
    #[must_use]
    pub fn stats(&self) -> &ConsumerStats {
        &self.stats
    }

    /// Give back the writer, e.g. to inspect a test buffer.
    pub fn into_output(self) -> W {
        self.out
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Drain `rx` until the producer closes it.
    ///
    /// # Errors
    ///
    /// - [`FinderError::Interrupted`] if shutdown was requested; pairs still
    ///   queued are not acted on
    /// - [`FinderError::Io`] if the output cannot be written
    pub fn consume(&mut self, rx: &Receiver<DuplicatePair>) -> Result<(), FinderError> {
        loop {
            if self.is_shutdown_requested() {
                log::debug!("Consumer: Shutdown requested, {} pairs handled", self.stats.duplicates);
                return Err(FinderError::Interrupted);
            }
            match rx.recv_timeout(RECV_SLICE) {
                Ok(pair) => self.handle(&pair)?,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }

    /// Apply the action to one pair and update the totals.
    ///
    /// Delete failures are logged and counted, never returned.
    ///
    /// # Errors
    ///
    /// Returns an error only when writing to the output fails.
    pub fn handle(&mut self, pair: &DuplicatePair) -> io::Result<()> {
        self.stats.duplicates += 1;
        self.stats.duplicate_bytes += pair.size();

        match self.action {
            Action::Print => writeln!(
                self.out,
                "{}\t{}",
                ByteSize::b(pair.size()),
                pair.duplicate.path().display()
            ),
            Action::Verbose | Action::DontAsk => {
                writeln!(self.out, "{}", pair.duplicate.path().display())
            }
            Action::Delete => self.delete(pair),
        }
    }

    fn delete(&mut self, pair: &DuplicatePair) -> io::Result<()> {
        if !self.warned {
            log::warn!(
                "Duplicates are matched by size, leading bytes and CRC-32, not byte-for-byte"
            );
            self.warned = true;
        }

        if !self.assume_yes && !self.confirm(pair)? {
            log::debug!("Keeping {}", pair.duplicate.path().display());
            self.stats.declined += 1;
            return Ok(());
        }

        match delete_duplicate(pair, &self.delete_config) {
            Ok(result) => {
                self.stats.deleted += 1;
                self.stats.deleted_bytes += result.size;
                writeln!(self.out, "{}", result.path.display())
            }
            Err(e) => {
                self.log_delete_failure(&e);
                self.stats.delete_failures += 1;
                Ok(())
            }
        }
    }

    fn log_delete_failure(&self, error: &DeleteError) {
        match error {
            DeleteError::OriginalMissing(_) | DeleteError::Modified { .. } => {
                log::warn!("Skipped: {error}");
            }
            _ => log::error!("Delete failed: {error}"),
        }
    }

    /// Ask on the output, read one line of input. End of input means no.
    fn confirm(&mut self, pair: &DuplicatePair) -> io::Result<bool> {
        write!(
            self.out,
            "Delete {} (same as {})? [y/N] ",
            pair.duplicate.path().display(),
            pair.original.path().display()
        )?;
        self.out.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            writeln!(self.out)?;
            return Ok(false);
        }
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    /// Write the closing totals line.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn report(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "\nFound {} duplicate(s), totaling {}.",
            self.stats.duplicates,
            ByteSize::b(self.stats.duplicate_bytes)
        )?;
        if self.action.is_destructive() {
            writeln!(
                self.out,
                "Deleted {} file(s), freed {}. {} kept, {} failed.",
                self.stats.deleted,
                ByteSize::b(self.stats.deleted_bytes),
                self.stats.declined,
                self.stats.delete_failures
            )?;
        }
        self.out.flush()
    }
}
