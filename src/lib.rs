//! # caskdb
//!
//! A log-structured key-value store in the Bitcask family:
//! - Append-only record log, never rewritten in place
//! - In-memory keydir pointing at each key's newest value
//! - Log replay to rebuild the keydir on startup
//! - Single-writer/multi-reader concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                              │
//! │                 put(key, value) / get(key)                  │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │                              │
//!                ▼                              ▼
//!   ┌────────────────────────┐      ┌────────────────────────┐
//!   │         KeyDir         │      │      Entry Codec       │
//!   │ key → (len, offset)    │      │ [klen][vlen][key][val] │
//!   │        (RwLock)        │      └───────────┬────────────┘
//!   └────────────▲───────────┘                  │
//!                │                              ▼
//!   ┌────────────┴───────────┐      ┌────────────────────────┐
//!   │       Log Replay       │◀─────│         Medium         │
//!   │  (startup recovery)    │      │  (memory / log file)   │
//!   └────────────────────────┘      └────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use caskdb::Engine;
//!
//! let engine = Engine::in_memory();
//! engine.put(b"name", b"Jono").unwrap();
//! assert_eq!(engine.get(b"name").unwrap(), b"Jono");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod engine;
pub mod keydir;
pub mod log;
pub mod medium;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::Engine;
pub use error::{CaskError, Result};
pub use keydir::{IndexEntry, KeyDir};
pub use log::replay;
pub use medium::{FileMedium, Medium, MemoryMedium};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of caskdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
