//! Error types for caskdb
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using CaskError
pub type Result<T> = std::result::Result<T, CaskError>;

/// Unified error type for caskdb operations
#[derive(Debug, Error)]
pub enum CaskError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    /// A record header was read but the bytes it declares are missing
    #[error("corrupt record at offset {offset}: {reason}")]
    CorruptRecord { offset: u64, reason: String },

    /// Key or value does not fit in the 32-bit length field
    #[error("{field} too large: {len} bytes (max {max})", max = u32::MAX)]
    EntryTooLarge { field: &'static str, len: usize },

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("key not found: {}", String::from_utf8_lossy(.0))]
    KeyNotFound(Vec<u8>),

    /// Medium asked for bytes outside `[0, len)`
    #[error("invalid range [{start}, {end}) for medium of length {len}")]
    InvalidRange { start: u64, end: u64, len: u64 },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CaskError {
    /// Shorthand for building a `CorruptRecord` error
    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        CaskError::CorruptRecord {
            offset,
            reason: reason.into(),
        }
    }
}
