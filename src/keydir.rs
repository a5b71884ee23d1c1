//! KeyDir Module
//!
//! In-memory index from key to the location of its live value in the log.
//!
//! ## Data Structure Choice
//! BTreeMap for V1:
//! - Sorted key listing for free
//! - Simple and correct first, optimize later

use std::collections::btree_map;
use std::collections::BTreeMap;

/// Location of a value in the medium
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Length of the value in bytes
    pub value_len: u32,

    /// Absolute offset of the first value byte (not the record start)
    pub value_offset: u64,
}

impl IndexEntry {
    pub fn new(value_len: u32, value_offset: u64) -> Self {
        Self {
            value_len,
            value_offset,
        }
    }

    /// Offset one past the last value byte
    pub fn value_end(&self) -> u64 {
        self.value_offset + u64::from(self.value_len)
    }
}

/// Key → value location for every live key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDir {
    entries: BTreeMap<Vec<u8>, IndexEntry>,
}

impl KeyDir {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `key` at a new value, returning the location it replaces
    pub fn insert(&mut self, key: Vec<u8>, entry: IndexEntry) -> Option<IndexEntry> {
        self.entries.insert(key, entry)
    }

    pub fn get(&self, key: &[u8]) -> Option<IndexEntry> {
        self.entries.get(key).copied()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.keys().map(|k| k.as_slice())
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Vec<u8>, IndexEntry> {
        self.entries.iter()
    }

    /// Total bytes of live values (excludes headers, keys and superseded values)
    pub fn live_value_bytes(&self) -> u64 {
        self.entries.values().map(|e| u64::from(e.value_len)).sum()
    }
}
