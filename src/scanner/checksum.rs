//! Streaming CRC-32 checksums and prefix reads.
//!
//! # Overview
//! Content reads are the only expensive part of duplicate detection, so they
//! come in two sizes: a bounded prefix read used as a cheap inequality filter,
//! and a full streaming CRC-32 (IEEE polynomial, as in zlib and Go's
//! `hash/crc32`) used as the final tie-breaker.
//!
//! Every function opens its own handle and drops it before returning.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::HashError;

/// Number of leading bytes compared before any full read.
pub const PREFIX_SIZE: usize = 1024;

/// Buffer size for streaming reads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Read up to `limit` leading bytes of a file.
///
/// Short files yield a short prefix; the returned vector holds exactly the
/// bytes that were read.
///
/// # Errors
///
/// Returns [`HashError`] if the file cannot be opened or read.
pub fn read_prefix(path: &Path, limit: usize) -> Result<Vec<u8>, HashError> {
    let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;

    let mut prefix = Vec::with_capacity(limit);
    file.take(limit as u64)
        .read_to_end(&mut prefix)
        .map_err(|e| HashError::from_io(path, e))?;

    Ok(prefix)
}

/// Compute the CRC-32 of everything a reader yields.
///
/// # Errors
///
/// Propagates any read error other than `Interrupted`.
pub fn checksum_reader<R: Read>(mut reader: R) -> std::io::Result<u32> {
    let mut hasher = crc32fast::Hasher::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize())
}

/// Compute the CRC-32 of a file's full content.
///
/// # Errors
///
/// Returns [`HashError`] if the file cannot be opened or read.
pub fn checksum_file(path: &Path) -> Result<u32, HashError> {
    let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
    let reader = BufReader::with_capacity(BUFFER_SIZE, file);

    checksum_reader(reader).map_err(|e| HashError::from_io(path, e))
}
