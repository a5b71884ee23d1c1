//! Log Recovery
//!
//! Rebuilds the keydir by replaying the log from its first record.

use std::io::Read;

use tracing::{debug, warn};

use crate::error::{CaskError, Result};
use crate::keydir::KeyDir;

use super::LogReader;

/// Why replay stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStop {
    /// The stream ended on a record boundary
    EndOfLog,

    /// A record was cut short; nothing from `offset` on was applied
    Corrupt { offset: u64, reason: String },
}

/// Result of a replay
#[derive(Debug)]
pub struct ReplayResult {
    /// Keydir built from every well-formed record, last writer wins
    pub keydir: KeyDir,

    /// Number of records applied
    pub entries_recovered: u64,

    /// Length of the well-formed prefix of the log
    pub valid_len: u64,

    pub stop: ReplayStop,
}

impl ReplayResult {
    /// True if the whole stream decoded without corruption
    pub fn is_clean(&self) -> bool {
        self.stop == ReplayStop::EndOfLog
    }

    /// Take the keydir, turning a corrupt stop into `CorruptRecord`
    pub fn into_keydir(self) -> Result<KeyDir> {
        match self.stop {
            ReplayStop::EndOfLog => Ok(self.keydir),
            ReplayStop::Corrupt { offset, reason } => {
                Err(CaskError::CorruptRecord { offset, reason })
            }
        }
    }
}

/// Replay a log stream positioned at offset 0 of its medium
///
/// Offsets in the returned keydir are absolute positions in that medium,
/// so it can serve reads for an engine writing to the same medium.
///
/// A truncated record ends replay and is reported in `stop`; the records
/// before it are kept. Failures of the stream itself are returned as `Err`.
pub fn replay<R: Read>(reader: R) -> Result<ReplayResult> {
    let mut log = LogReader::new(reader);
    let mut keydir = KeyDir::new();
    let mut entries_recovered = 0u64;

    let stop = loop {
        match log.next_entry() {
            Ok(Some(record)) => {
                let location = record.index_entry();
                keydir.insert(record.entry.key, location);
                entries_recovered += 1;
            }
            Ok(None) => break ReplayStop::EndOfLog,
            Err(CaskError::CorruptRecord { offset, reason }) => {
                warn!(offset, %reason, "replay stopped at corrupt record");
                break ReplayStop::Corrupt { offset, reason };
            }
            Err(e) => return Err(e),
        }
    };

    let valid_len = log.position();
    debug!(
        entries = entries_recovered,
        keys = keydir.len(),
        valid_len,
        "replay finished"
    );

    Ok(ReplayResult {
        keydir,
        entries_recovered,
        valid_len,
        stop,
    })
}
