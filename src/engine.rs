//! Engine Module
//!
//! The core storage engine that ties the log medium to the keydir.
//!
//! ## Responsibilities
//! - Append encoded records to the medium on put
//! - Keep the keydir pointing at each key's newest value
//! - Serve point lookups through the keydir
//! - Replay the existing log on startup

use std::fs;
use std::io::BufReader;
use std::path::Path;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::{Config, RecoveryPolicy, SyncStrategy};
use crate::error::{CaskError, Result};
use crate::keydir::{IndexEntry, KeyDir};
use crate::log::{self, ReplayResult, ReplayStop};
use crate::medium::{FileMedium, Medium, MediumReader, MemoryMedium};

/// Read buffer used while replaying a medium
const REPLAY_BUFFER_SIZE: usize = 64 * 1024;

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/sync): Serialized by the `state` mutex
///   - Reading the medium length and appending happen under one lock, so
///     the offset recorded for a record is the offset it was written at
///   - The keydir is updated before the lock is released, so keydir order
///     always matches log order
///
/// - **Reads** (get): Keydir lookups take a read lock (many concurrent readers)
///   - The value read itself takes the `log` mutex, because file reads
///     move the shared cursor
///
/// An engine assumes exclusive ownership of its medium. Two engines over the
/// same log file, in one process or several, are not supported.
pub struct Engine<M: Medium = FileMedium> {
    /// Engine configuration
    config: Config,

    /// Medium plus write bookkeeping (exclusive access needed)
    state: Mutex<LogState<M>>,

    /// Key → value location (many readers, one writer)
    keydir: RwLock<KeyDir>,
}

struct LogState<M> {
    medium: M,
    /// Appends since the last sync
    unsynced: usize,
}

impl Engine<FileMedium> {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the log's parent directory if needed
    /// 2. Open/create the log file
    /// 3. Replay the log into a fresh keydir
    /// 4. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        if let Some(parent) = config.log_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let medium = FileMedium::open(&config.log_path)?;
        Self::with_medium(medium, config)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified log file
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().log_path(path).build();
        Self::open(config)
    }
}

impl Engine<MemoryMedium> {
    /// Fresh engine over an empty in-memory medium
    pub fn in_memory() -> Self {
        Self::assemble(MemoryMedium::new(), KeyDir::new(), Config::default())
    }
}

impl<M: Medium> Engine<M> {
    /// Build an engine over `medium`, replaying whatever it already holds
    ///
    /// A corrupt record fails with `CorruptRecord` under
    /// `RecoveryPolicy::Strict`. Under `RecoveryPolicy::TruncateTail` the
    /// medium is cut back to the last well-formed record.
    pub fn with_medium(mut medium: M, config: Config) -> Result<Self> {
        config.validate()?;

        let ReplayResult {
            keydir,
            entries_recovered,
            valid_len,
            stop,
        } = {
            let reader =
                BufReader::with_capacity(REPLAY_BUFFER_SIZE, MediumReader::new(&mut medium)?);
            log::replay(reader)?
        };

        if let ReplayStop::Corrupt { offset, reason } = stop {
            match config.recovery_policy {
                RecoveryPolicy::Strict => {
                    return Err(CaskError::CorruptRecord { offset, reason });
                }
                RecoveryPolicy::TruncateTail => {
                    let len = medium.len()?;
                    warn!(
                        offset,
                        dropped_bytes = len - valid_len,
                        %reason,
                        "truncating corrupt log tail"
                    );
                    medium.truncate(valid_len)?;
                }
            }
        }

        info!(
            entries = entries_recovered,
            keys = keydir.len(),
            log_len = valid_len,
            "engine opened"
        );

        Ok(Self::assemble(medium, keydir, config))
    }

    /// Build an engine from a medium and a keydir the caller already has
    ///
    /// No replay happens. Every location in `keydir` must point at bytes
    /// present in `medium`, as is the case for the output of `log::replay`
    /// run over the same medium.
    pub fn from_parts(medium: M, keydir: KeyDir, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(medium, keydir, config))
    }

    fn assemble(medium: M, keydir: KeyDir, config: Config) -> Self {
        Self {
            config,
            state: Mutex::new(LogState {
                medium,
                unsynced: 0,
            }),
            keydir: RwLock::new(keydir),
        }
    }

    /// Get the value for a key
    ///
    /// Fails with `KeyNotFound` if the key was never put.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        // Presence is checked before any offset arithmetic
        let location = self
            .keydir
            .read()
            .get(key)
            .ok_or_else(|| CaskError::KeyNotFound(key.to_vec()))?;

        let mut state = self.state.lock();
        state
            .medium
            .read_range(location.value_offset, location.value_end())
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Encode the record
    /// 2. Acquire the log lock
    /// 3. Append at the current end of the medium (a failed append is
    ///    rolled back so no partial record is left behind)
    /// 4. Point the keydir at the new value
    /// 5. Sync per the configured strategy
    ///
    /// The previous value for `key`, if any, stays in the log unreferenced.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let record = log::encode(key, value)?;

        let mut state = self.state.lock();

        let record_start = state.medium.len()?;
        if let Err(e) = state.medium.append(&record) {
            // Drop whatever part of the record reached the medium
            if let Err(cleanup) = state.medium.truncate(record_start) {
                warn!(offset = record_start, error = %cleanup, "failed to remove partial record");
            }
            return Err(e);
        }
        state.unsynced += 1;

        // encode() has already checked the value length fits in a u32
        let location = IndexEntry::new(
            value.len() as u32,
            log::value_offset(record_start, key.len()),
        );
        self.keydir.write().insert(key.to_vec(), location);

        debug!(
            key_len = key.len(),
            value_len = value.len(),
            offset = record_start,
            "put"
        );

        let due = match self.config.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNWrites { count } => state.unsynced >= count,
            SyncStrategy::Manual => false,
        };
        if due {
            Self::sync_locked(&mut state)?;
        }

        Ok(())
    }

    /// Force sync to durable storage
    pub fn sync(&self) -> Result<()> {
        let mut state = self.state.lock();
        Self::sync_locked(&mut state)
    }

    fn sync_locked(state: &mut LogState<M>) -> Result<()> {
        state.medium.sync()?;
        debug!(writes = state.unsynced, "log synced");
        state.unsynced = 0;
        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Syncs any unsynced writes to disk
    pub fn close(self) -> Result<()> {
        self.sync()
    }

    /// Give back the medium, e.g. to replay it or reopen it
    pub fn into_medium(self) -> M {
        self.state.into_inner().medium
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Check if a key has a live value
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.keydir.read().contains_key(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.keydir.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keydir.read().is_empty()
    }

    /// All live keys, sorted
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.keydir.read().keys().map(|k| k.to_vec()).collect()
    }

    /// Copy of the current keydir
    pub fn keydir_snapshot(&self) -> KeyDir {
        self.keydir.read().clone()
    }

    /// Current log length in bytes, including superseded records
    pub fn log_len(&self) -> Result<u64> {
        self.state.lock().medium.len()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
