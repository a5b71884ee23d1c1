//! File-backed medium
//!
//! One log file opened for read + append.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

use super::{check_range, Medium};

/// A log file on disk
pub struct FileMedium {
    /// Path of the log file
    path: PathBuf,
    /// Opened in append mode: every write lands at end-of-file regardless of
    /// where the last read left the cursor
    file: File,
}

impl FileMedium {
    /// Open or create the log file at `path`
    ///
    /// The parent directory must exist.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        debug!(path = %path.display(), "opened log file");

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Medium for FileMedium {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes)?;
        Ok(())
    }

    fn read_range(&mut self, start: u64, end: u64) -> Result<Vec<u8>> {
        check_range(start, end, self.len()?)?;

        let mut buf = vec![0u8; (end - start) as usize];
        self.file.seek(SeekFrom::Start(start))?;
        self.file.read_exact(&mut buf)?;

        Ok(buf)
    }

    fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    fn truncate(&mut self, len: u64) -> Result<()> {
        check_range(0, len, self.len()?)?;
        self.file.set_len(len)?;
        self.file.sync_all()?;
        Ok(())
    }
}
