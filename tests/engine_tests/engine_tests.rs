//! Tests for Engine
//!
//! These tests verify:
//! - Basic put/get operations and the exact bytes written
//! - Last-write-wins and missing keys
//! - Replay equivalence between a live and a rebuilt keydir
//! - Reopening a log file (startup recovery)
//! - Recovery policies for corrupt tails
//! - Concurrent access patterns

use std::fs::{self, OpenOptions};
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::thread;

use caskdb::config::{Config, RecoveryPolicy, SyncStrategy};
use caskdb::engine::Engine;
use caskdb::log::{replay, Entry, HEADER_SIZE};
use caskdb::medium::{Medium, MemoryMedium};
use caskdb::{CaskError, IndexEntry};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .log_path(temp_dir.path().join("cask.log"))
        .sync_strategy(SyncStrategy::EveryWrite) // Sync every write for test reliability
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn memory_engine_with_log(
    log: &[u8],
    policy: RecoveryPolicy,
) -> caskdb::Result<Engine<MemoryMedium>> {
    let config = Config::builder().recovery_policy(policy).build();
    Engine::with_medium(MemoryMedium::from_bytes(log), config)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_put_writes_single_entry() {
    let engine = Engine::in_memory();

    engine.put(b"a", b"b").unwrap();

    let medium = engine.into_medium();
    assert_eq!(medium.as_bytes(), &Entry::new("a", "b").encode().unwrap()[..]);
}

#[test]
fn test_put_records_value_location() {
    let engine = Engine::in_memory();

    engine.put(b"a", b"b").unwrap();

    let keydir = engine.keydir_snapshot();
    assert_eq!(keydir.get(b"a"), Some(IndexEntry::new(1, HEADER_SIZE + 1)));
}

#[test]
fn test_put_then_get() {
    let engine = Engine::in_memory();

    engine.put(b"a", b"b").unwrap();

    assert_eq!(engine.get(b"a").unwrap(), b"b");
}

#[test]
fn test_unrelated_write_does_not_disturb_lookup() {
    let engine = Engine::in_memory();

    engine.put(b"name", b"Jono").unwrap();
    engine.put(b"blah", b"blahblah").unwrap();

    assert_eq!(engine.get(b"blah").unwrap(), b"blahblah");
    assert_eq!(engine.get(b"name").unwrap(), b"Jono");
}

#[test]
fn test_last_write_wins() {
    let engine = Engine::in_memory();

    engine.put(b"k", b"v1").unwrap();
    engine.put(b"k", b"v2").unwrap();

    assert_eq!(engine.get(b"k").unwrap(), b"v2");
    assert_eq!(engine.len(), 1);
    // Superseded record is still in the log
    assert_eq!(engine.log_len().unwrap(), 2 * (HEADER_SIZE + 1 + 2));
}

#[test]
fn test_get_missing_key() {
    let engine = Engine::in_memory();

    match engine.get(b"nope") {
        Err(CaskError::KeyNotFound(key)) => assert_eq!(key, b"nope"),
        other => panic!("expected KeyNotFound, got {:?}", other),
    }
}

#[test]
fn test_empty_key_and_value() {
    let engine = Engine::in_memory();

    engine.put(b"", b"empty key").unwrap();
    engine.put(b"empty value", b"").unwrap();

    assert_eq!(engine.get(b"").unwrap(), b"empty key");
    assert!(engine.get(b"empty value").unwrap().is_empty());
}

#[test]
fn test_keys_and_contains() {
    let engine = Engine::in_memory();
    assert!(engine.is_empty());

    engine.put(b"b", b"2").unwrap();
    engine.put(b"a", b"1").unwrap();
    engine.put(b"b", b"3").unwrap();

    assert!(engine.contains_key(b"a"));
    assert!(!engine.contains_key(b"c"));
    assert_eq!(engine.keys(), vec![b"a".to_vec(), b"b".to_vec()]);
}

// =============================================================================
// Replay Equivalence Tests
// =============================================================================

#[test]
fn test_replay_matches_live_keydir() {
    let engine = Engine::in_memory();
    engine.put(b"k1", b"v1").unwrap();
    engine.put(b"k2", b"v2").unwrap();
    engine.put(b"k1", b"v3").unwrap();

    let live = engine.keydir_snapshot();
    let medium = engine.into_medium();

    let replayed = replay(Cursor::new(medium.as_bytes())).unwrap();
    assert!(replayed.is_clean());
    assert_eq!(replayed.keydir, live);

    let rebuilt = Engine::from_parts(medium, replayed.keydir, Config::default()).unwrap();
    assert_eq!(rebuilt.get(b"k1").unwrap(), b"v3");
    assert_eq!(rebuilt.get(b"k2").unwrap(), b"v2");
}

#[test]
fn test_with_medium_replays_existing_log() {
    let engine = Engine::in_memory();
    engine.put(b"k1", b"v1").unwrap();
    engine.put(b"k2", b"v2").unwrap();
    let medium = engine.into_medium();

    let engine = Engine::with_medium(medium, Config::default()).unwrap();
    engine.put(b"k3", b"v3").unwrap();

    assert_eq!(engine.get(b"k1").unwrap(), b"v1");
    assert_eq!(engine.get(b"k2").unwrap(), b"v2");
    assert_eq!(engine.get(b"k3").unwrap(), b"v3");
}

// =============================================================================
// File Persistence Tests
// =============================================================================

#[test]
fn test_open_creates_log_and_parent_dir() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("mydb").join("cask.log");

    let _engine = Engine::open_path(&log_path).unwrap();

    assert!(log_path.exists());
}

#[test]
fn test_reopen_recovers_data() {
    let (_temp, engine) = setup_temp_engine();
    let log_path = engine.config().log_path.clone();

    engine.put(b"name", b"Jono").unwrap();
    engine.put(b"blah", b"blahblah").unwrap();
    engine.put(b"name", b"Jonathan").unwrap();
    engine.close().unwrap();

    let engine = Engine::open_path(&log_path).unwrap();
    assert_eq!(engine.get(b"name").unwrap(), b"Jonathan");
    assert_eq!(engine.get(b"blah").unwrap(), b"blahblah");
    assert_eq!(engine.len(), 2);
}

#[test]
fn test_writes_after_reopen_extend_log() {
    let (_temp, engine) = setup_temp_engine();
    let log_path = engine.config().log_path.clone();
    engine.put(b"first", b"1").unwrap();
    engine.close().unwrap();

    let engine = Engine::open_path(&log_path).unwrap();
    engine.put(b"second", b"2").unwrap();
    engine.close().unwrap();

    let engine = Engine::open_path(&log_path).unwrap();
    assert_eq!(engine.get(b"first").unwrap(), b"1");
    assert_eq!(engine.get(b"second").unwrap(), b"2");
}

// =============================================================================
// Recovery Policy Tests
// =============================================================================

#[test]
fn test_strict_policy_rejects_corrupt_tail() {
    let mut log = Entry::new("a", "1").encode().unwrap().to_vec();
    log.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 50, b'b']);

    let result = memory_engine_with_log(&log, RecoveryPolicy::Strict);

    assert!(matches!(result, Err(CaskError::CorruptRecord { offset: 10, .. })));
}

#[test]
fn test_truncate_policy_cuts_tail_and_continues() {
    let mut log = Entry::new("a", "1").encode().unwrap().to_vec();
    log.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 50, b'b']);

    let engine = memory_engine_with_log(&log, RecoveryPolicy::TruncateTail).unwrap();
    assert_eq!(engine.log_len().unwrap(), 10);
    assert_eq!(engine.get(b"a").unwrap(), b"1");

    engine.put(b"c", b"3").unwrap();
    let medium = engine.into_medium();

    // Log is well-formed again
    let replayed = replay(Cursor::new(medium.as_bytes())).unwrap();
    assert!(replayed.is_clean());
    assert_eq!(replayed.keydir.len(), 2);
}

#[test]
fn test_truncate_policy_on_file() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("cask.log");
    {
        let engine = Engine::open_path(&log_path).unwrap();
        engine.put(b"kept", b"value").unwrap();
        engine.close().unwrap();
    }

    // Simulate a torn write
    let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
    file.write_all(&[0, 0, 0, 4, 0, 0]).unwrap();
    drop(file);

    assert!(Engine::open_path(&log_path).is_err());

    let config = Config::builder()
        .log_path(&log_path)
        .recovery_policy(RecoveryPolicy::TruncateTail)
        .build();
    let engine = Engine::open(config).unwrap();

    assert_eq!(engine.get(b"kept").unwrap(), b"value");
    assert_eq!(fs::metadata(&log_path).unwrap().len(), HEADER_SIZE + 4 + 5);
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_zero_sync_interval_rejected() {
    let config = Config::builder()
        .sync_strategy(SyncStrategy::EveryNWrites { count: 0 })
        .build();

    let result = Engine::with_medium(MemoryMedium::new(), config);

    assert!(matches!(result, Err(CaskError::Config(_))));
}

#[test]
fn test_manual_sync_strategy() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .log_path(temp_dir.path().join("cask.log"))
        .sync_strategy(SyncStrategy::Manual)
        .build();
    let engine = Engine::open(config).unwrap();

    engine.put(b"k", b"v").unwrap();
    engine.sync().unwrap();

    assert_eq!(engine.get(b"k").unwrap(), b"v");
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_and_readers() {
    let engine = Arc::new(Engine::in_memory());
    let mut handles = Vec::new();

    for t in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                let key = format!("t{}-k{}", t, i);
                let value = format!("value-{}-{}", t, i);
                engine.put(key.as_bytes(), value.as_bytes()).unwrap();
                assert_eq!(engine.get(key.as_bytes()).unwrap(), value.as_bytes());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.len(), 400);

    // Keydir order matches log order
    let live = engine.keydir_snapshot();
    let engine = Arc::try_unwrap(engine).ok().unwrap();
    let medium = engine.into_medium();
    let replayed = replay(Cursor::new(medium.as_bytes())).unwrap();
    assert_eq!(replayed.keydir, live);
}

#[test]
fn test_concurrent_overwrites_same_key() {
    let engine = Arc::new(Engine::in_memory());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..50 {
                    engine
                        .put(b"shared", format!("{}-{}", t, i).as_bytes())
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let live_value = engine.get(b"shared").unwrap();
    let engine = Arc::try_unwrap(engine).ok().unwrap();
    let mut medium = engine.into_medium();

    // The keydir points at the last record in the log
    let replayed = replay(Cursor::new(medium.as_bytes().to_vec())).unwrap();
    let location = replayed.keydir.get(b"shared").unwrap();
    let replayed_value = medium
        .read_range(location.value_offset, location.value_end())
        .unwrap();
    assert_eq!(replayed_value, live_value);
}
