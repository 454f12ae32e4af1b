//! Command-line interface definitions for dupfind.
//!
//! Every scan option is optional here: a flag that is not given falls back to
//! the environment, then the config file, then the built-in default (see
//! [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Print duplicates under the current directory
//! dupfind
//!
//! # Only files of at least 1 MiB, ignoring extensions
//! dupfind ~/Downloads -s 1MiB -e false
//!
//! # Move duplicates to the trash without asking
//! dupfind ~/Pictures -a delete --yes
//! ```

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Find files with identical content.
///
/// Files are compared by size, then (optionally) extension, then their first
/// kilobyte, then a CRC-32 of the whole content. Each duplicate is reported
/// against the first copy found in a sorted, depth-first walk.
#[derive(Debug, Parser)]
#[command(name = "dupfind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to search (default: current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Minimum file size to check (e.g. 512, 4K, 1MiB)
    ///
    /// Supports suffixes: B, K, KB, KiB, M, MB, MiB, G, GB, GiB, T, TB, TiB
    #[arg(short = 's', long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Action for each duplicate: print, delete, verbose, dontask (exact, lowercase)
    #[arg(short, long, value_name = "ACTION")]
    pub action: Option<String>,

    /// Don't compare files with different extensions
    #[arg(
        short = 'e',
        long,
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 1
    )]
    pub extension_sensitive: Option<bool>,

    /// Skip paths containing this substring (repeatable; replaces the default list)
    #[arg(long = "exclude", value_name = "SUBSTR")]
    pub exclude: Vec<String>,

    /// Capacity of the duplicate queue between walker and action
    #[arg(long, value_name = "N")]
    pub channel_capacity: Option<usize>,

    /// Delete permanently instead of moving to the trash
    ///
    /// Warning: Files cannot be recovered after permanent deletion.
    #[arg(long)]
    pub permanent: bool,

    /// Don't ask before deleting
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Configuration file (default: platform config dir, dupfind/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show a progress spinner on stderr
    #[arg(long)]
    pub progress: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors and results
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Parse a human-readable size string into bytes.
///
/// Decimal suffixes (K, KB, M, MB, ...) are powers of 1000, binary suffixes
/// (KiB, MiB, ...) powers of 1024. Suffixes are case-insensitive and
/// fractional values are accepted.
///
/// # Examples
///
/// ```
/// use dupfind::cli::parse_size;
///
/// assert_eq!(parse_size("4K").unwrap(), 4_000);
/// assert_eq!(parse_size("1.5MiB").unwrap(), 1_572_864);
/// assert!(parse_size("12 parsecs").is_err());
/// ```
///
/// # Errors
///
/// Returns a message suitable for clap when the number or suffix is invalid.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1_000,
        "KIB" => 1 << 10,
        "M" | "MB" => 1_000_000,
        "MIB" => 1 << 20,
        "G" | "GB" => 1_000_000_000,
        "GIB" => 1 << 30,
        "T" | "TB" => 1_000_000_000_000,
        "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    let bytes = num * multiplier as f64;
    if !bytes.is_finite() || bytes > u64::MAX as f64 {
        return Err(format!("Size too large: '{s}'"));
    }
    Ok(bytes as u64)
}
