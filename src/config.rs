//! Configuration for caskdb
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{CaskError, Result};

/// Main configuration for a caskdb instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the log file opened by `Engine::open`.
    /// Engines built over an explicit medium ignore it.
    pub log_path: PathBuf,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the log
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Recovery Configuration
    // -------------------------------------------------------------------------
    /// What to do when startup replay hits a corrupt record
    pub recovery_policy: RecoveryPolicy,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced writes (balanced durability/performance)
    EveryNWrites { count: usize },

    /// Only sync on `Engine::sync` or `Engine::close`
    Manual,
}

/// Startup recovery policy for a log with a corrupt record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Refuse to open; surface the `CorruptRecord` error
    Strict,

    /// Cut the log back to the end of the last well-formed record and continue
    TruncateTail,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("./caskdb_data/cask.log"),
            sync_strategy: SyncStrategy::EveryNWrites { count: 100 },
            recovery_policy: RecoveryPolicy::Strict,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if let SyncStrategy::EveryNWrites { count: 0 } = self.sync_strategy {
            return Err(CaskError::Config(
                "sync interval must be at least 1 write".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the log file path
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the recovery policy
    pub fn recovery_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.config.recovery_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
