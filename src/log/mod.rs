//! Log Module
//!
//! The append-only record log and its replay.
//!
//! ## Responsibilities
//! - Encode and decode individual (key, value) records
//! - Walk a log stream record by record, tracking byte positions
//! - Rebuild the keydir from an existing log (startup recovery)
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Record 1                                    │
//! │ ┌─────────────┬─────────────┬─────┬───────┐ │
//! │ │ KeyLen (4)  │ ValLen (4)  │ Key │ Value │ │
//! │ └─────────────┴─────────────┴─────┴───────┘ │
//! ├─────────────────────────────────────────────┤
//! │ Record 2                                    │
//! │ ┌─────────────┬─────────────┬─────┬───────┐ │
//! │ │ KeyLen (4)  │ ValLen (4)  │ Key │ Value │ │
//! │ └─────────────┴─────────────┴─────┴───────┘ │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Lengths are unsigned 32-bit big-endian. There is no file header and no
//! per-record checksum; a record is only known to be damaged when the stream
//! ends before the bytes its header declares.

mod entry;
mod reader;
mod recovery;

pub use entry::{encode, Entry, HEADER_SIZE};
pub use reader::{LogReader, LogRecord};
pub use recovery::{replay, ReplayResult, ReplayStop};

pub(crate) use entry::value_offset;
