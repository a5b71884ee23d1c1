//! Log Reader
//!
//! Sequentially decodes records from a log stream.

use std::io::Read;

use crate::error::Result;
use crate::keydir::IndexEntry;

use super::Entry;

/// A decoded record together with where it sits in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Absolute offset of the record header
    pub offset: u64,
    pub entry: Entry,
}

impl LogRecord {
    /// Absolute offset of the value bytes
    pub fn value_offset(&self) -> u64 {
        self.entry.value_offset(self.offset)
    }

    /// Offset one past the last byte of this record
    pub fn end(&self) -> u64 {
        self.offset + self.entry.encoded_len()
    }

    /// Keydir location of this record's value
    pub fn index_entry(&self) -> IndexEntry {
        // Decoded lengths came from a u32 header field
        IndexEntry::new(self.entry.value.len() as u32, self.value_offset())
    }
}

/// Reads records from a log stream
///
/// The stream must be positioned at a record boundary. `position` only
/// advances past fully decoded records, so after a `CorruptRecord` error it
/// still marks the end of the well-formed prefix.
pub struct LogReader<R> {
    reader: R,
    position: u64,
    done: bool,
}

impl<R: Read> LogReader<R> {
    /// Read a log from its beginning
    pub fn new(reader: R) -> Self {
        Self::with_position(reader, 0)
    }

    /// Read a stream that starts at absolute `position` in the log
    pub fn with_position(reader: R, position: u64) -> Self {
        Self {
            reader,
            position,
            done: false,
        }
    }

    /// Read the next record from the log
    pub fn next_entry(&mut self) -> Result<Option<LogRecord>> {
        if self.done {
            return Ok(None);
        }

        match Entry::decode(&mut self.reader, self.position) {
            Ok(Some(entry)) => {
                let record = LogRecord {
                    offset: self.position,
                    entry,
                };
                self.position = record.end();
                Ok(Some(record))
            }
            Ok(None) => {
                self.done = true;
                Ok(None)
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    /// Absolute offset of the next record to be read
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for LogReader<R> {
    type Item = Result<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}
