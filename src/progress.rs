//! Progress reporting using indicatif.
//!
//! The pipeline reports through the [`ProgressCallback`] trait; [`Progress`]
//! renders it as a single stderr spinner showing entries visited, bytes
//! offered for comparison and duplicates found so far.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Receives progress updates from a running scan.
///
/// The walking thread calls these methods, so implementations must be
/// cheap and must not block.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (currently always "walking")
    /// * `total` - Number of items, or 0 when unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each comparison candidate.
    ///
    /// # Arguments
    ///
    /// * `current` - Entries visited so far (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called with the size of each comparison candidate.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called with a short status line (e.g. the running duplicate count).
    fn on_message(&self, _message: &str) {}
}

/// Spinner on stderr.
pub struct Progress {
    spinner: Mutex<Option<ProgressBar>>,
    bytes: AtomicU64,
    status: Mutex<String>,
    quiet: bool,
    draw_target: fn() -> ProgressDrawTarget,
}

impl Progress {
    /// Create a reporter drawing to stderr.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupfind::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            spinner: Mutex::new(None),
            bytes: AtomicU64::new(0),
            status: Mutex::new(String::new()),
            quiet,
            draw_target: ProgressDrawTarget::stderr,
        }
    }

    /// Create a reporter that tracks state but never draws.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            draw_target: ProgressDrawTarget::hidden,
            ..Self::new(false)
        }
    }

    /// Bytes of candidates seen so far.
    #[must_use]
    pub fn bytes_seen(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} entries {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn render_message(&self, path: &str) -> String {
        let bytes = ByteSize::b(self.bytes_seen());
        let status = self.status.lock().map(|s| s.clone()).unwrap_or_default();
        if status.is_empty() {
            format!("({bytes}) {}", truncate_path(path, 40))
        } else {
            format!("({bytes}, {status}) {}", truncate_path(path, 40))
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::with_draw_target(None, (self.draw_target)());
        pb.set_style(Self::spinner_style());
        pb.set_message(format!("{phase}..."));
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut spinner) = self.spinner.lock() {
            *spinner = Some(pb);
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        let message = self.render_message(path);
        if let Ok(spinner) = self.spinner.lock() {
            if let Some(ref pb) = *spinner {
                pb.set_position(current as u64);
                pb.set_message(message);
            }
        }
    }

    fn on_item_completed(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Ok(mut spinner) = self.spinner.lock() {
            if let Some(pb) = spinner.take() {
                pb.finish_and_clear();
                log::debug!("{phase} finished after {} entries", pb.position());
            }
        }
    }

    fn on_message(&self, message: &str) {
        if let Ok(mut status) = self.status.lock() {
            *status = message.to_string();
        }
    }
}

/// Shorten a path to its file name when it does not fit in `max_len` chars.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let chars: Vec<char> = file_name.chars().collect();
    if chars.len() + 4 > max_len {
        let keep = max_len.saturating_sub(3);
        let tail: String = chars[chars.len().saturating_sub(keep)..].iter().collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
