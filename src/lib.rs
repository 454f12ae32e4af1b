//! dupfind - Duplicate File Finder
//!
//! Walks a directory tree and reports files with identical content. Files are
//! classified cheaply first (size, then extension) and only same-class files
//! have their first kilobyte, then their full CRC-32, compared. Duplicates are
//! streamed to the configured action while the walk is still running.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::ResultConsumer;
use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{FinderError, ScanPipeline};
use crate::error::ExitCode;
use crate::progress::Progress;

/// Run the application with the process's stdin and stdout.
///
/// # Errors
///
/// Returns an error for invalid configuration, an interrupted scan or an
/// unexpected failure. [`ExitCode::for_error`] maps it to an exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    run_with_io(cli, io::stdout().lock(), io::stdin().lock())
}

/// Run the application, writing results to `out` and reading delete
/// confirmations from `input`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with_io<W: Write, R: BufRead>(cli: Cli, out: W, input: R) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())?.with_cli_overrides(&cli);
    let settings = config.resolve(cli.path.as_deref())?;
    log::debug!("Resolved settings: {:?}", settings);

    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;

    let mut pipeline = ScanPipeline::new(settings.root.clone(), settings.pipeline)
        .with_shutdown_flag(handler.get_flag());
    if cli.progress && !cli.quiet {
        pipeline = pipeline.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let mut consumer = ResultConsumer::new(settings.action, out, input)
        .with_delete_config(settings.delete)
        .with_assume_yes(settings.assume_yes)
        .with_shutdown_flag(handler.get_flag());

    let handle = pipeline.spawn().context("Failed to start scan")?;
    let consumed = consumer.consume(handle.receiver());
    let scanned = handle.join();

    if !matches!(consumed, Err(FinderError::Io(_))) {
        consumer.report().context("Failed to write report")?;
    }
    consumed.context("Failed to process duplicates")?;
    let summary = scanned.with_context(|| format!("Scan of {} failed", settings.root.display()))?;

    if summary.has_errors() {
        log::warn!(
            "{} entries could not be inspected and {} comparisons failed to read a file",
            summary.errors.len(),
            summary.engine.read_failures
        );
        for error in &summary.errors {
            log::debug!("  {error}");
        }
        return Ok(ExitCode::PartialSuccess);
    }

    Ok(ExitCode::Success)
}
