//! Storage Medium Module
//!
//! The append-only byte store underneath the log.
//!
//! ## Responsibilities
//! - Append bytes at the end
//! - Read back an arbitrary byte range
//! - Report the current length (the next write offset)
//!
//! ## Implementations
//! - `MemoryMedium`: growable buffer, for tests and embedding
//! - `FileMedium`: a single log file on disk

mod file;
mod memory;

use std::io::{self, Read};

use crate::error::{CaskError, Result};

pub use file::FileMedium;
pub use memory::MemoryMedium;

/// Append-only byte store
///
/// All implementations must satisfy these invariants:
/// - Existing bytes are never rewritten; `len` never decreases, except
///   through `truncate` during recovery.
/// - `read_range` returns exactly `end - start` bytes or fails. A short read
///   is an error, never a partial result.
/// - All I/O errors are propagated, never silently ignored.
pub trait Medium: Send {
    /// Append `bytes` at the current end
    fn append(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read the half-open range `[start, end)`
    ///
    /// Fails with `InvalidRange` unless `start <= end <= len()`.
    /// Takes `&mut self` because file reads move the shared cursor.
    fn read_range(&mut self, start: u64, end: u64) -> Result<Vec<u8>>;

    /// Current length in bytes
    fn len(&self) -> Result<u64>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Flush appended bytes to durable storage
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    /// Drop every byte from `len` on
    ///
    /// Only used by recovery to cut off a torn tail.
    fn truncate(&mut self, len: u64) -> Result<()>;
}

/// Check `[start, end)` against a medium of length `len`
pub(crate) fn check_range(start: u64, end: u64, len: u64) -> Result<()> {
    if start <= end && end <= len {
        Ok(())
    } else {
        Err(CaskError::InvalidRange { start, end, len })
    }
}

/// Streams a medium from offset 0 as `std::io::Read`
///
/// The length is captured on creation; bytes appended later are not seen.
pub struct MediumReader<'a, M: Medium + ?Sized> {
    medium: &'a mut M,
    position: u64,
    len: u64,
}

impl<'a, M: Medium + ?Sized> MediumReader<'a, M> {
    pub fn new(medium: &'a mut M) -> Result<Self> {
        let len = medium.len()?;
        Ok(Self {
            medium,
            position: 0,
            len,
        })
    }

    pub fn position(&self) -> u64 {
        self.position
    }
}

impl<M: Medium + ?Sized> Read for MediumReader<'_, M> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.position >= self.len {
            return Ok(0);
        }

        let end = self.len.min(self.position + buf.len() as u64);
        let bytes = self
            .medium
            .read_range(self.position, end)
            .map_err(into_io_error)?;

        buf[..bytes.len()].copy_from_slice(&bytes);
        self.position = end;
        Ok(bytes.len())
    }
}

fn into_io_error(err: CaskError) -> io::Error {
    match err {
        CaskError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}
