//! End-to-end engine tests: write/read paths, flush triggering, tombstone
//! shadowing, and crash recovery against real temp directories.

use crate::{Config, Engine};
use std::path::Path;
use tempfile::tempdir;

fn config(dir: &Path) -> Config {
    Config::new(dir)
}

// -------------------- Basic read-your-writes --------------------

#[test]
fn basic_round_trip() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(config(dir.path())).unwrap();

    engine.put(b"alpha".to_vec(), b"one".to_vec()).unwrap();
    assert_eq!(engine.get(b"alpha"), Some(b"one".to_vec()));
    assert_eq!(engine.get(b"missing"), None);
}

#[test]
fn overwrite_in_memtable() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(config(dir.path())).unwrap();

    engine.put(b"k".to_vec(), b"v1".to_vec()).unwrap();
    engine.put(b"k".to_vec(), b"v2".to_vec()).unwrap();
    assert_eq!(engine.get(b"k"), Some(b"v2".to_vec()));
    assert_eq!(engine.memtable_len(), 1);
}

#[test]
fn delete_in_memtable() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(config(dir.path())).unwrap();

    engine.put(b"k".to_vec(), b"v".to_vec()).unwrap();
    engine.delete(b"k".to_vec()).unwrap();
    assert_eq!(engine.get(b"k"), None);
}

#[test]
fn delete_of_absent_key_is_ok() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(config(dir.path())).unwrap();

    engine.delete(b"never-written".to_vec()).unwrap();
    assert_eq!(engine.get(b"never-written"), None);
}

// -------------------- Flush trigger & tombstone shadowing --------------------

#[test]
fn size_trigger_flushes_and_clears() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(config(dir.path()).with_memtable_threshold(32)).unwrap();

    // 4 + 29 = 33 bytes > 32: the put itself must trigger the flush.
    engine.put(b"key1".to_vec(), vec![b'x'; 29]).unwrap();

    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(engine.memtable_len(), 0);
    assert_eq!(engine.memtable_size(), 0);
    assert_eq!(engine.get(b"key1"), Some(vec![b'x'; 29]));
}

#[test]
fn delete_shadows_flushed_value() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(config(dir.path())).unwrap();

    // 16 bytes per record (5-byte key + 11-byte value): the 65th put brings
    // the counter to 1040 > 1024 and flushes exactly once.
    for i in 0..65u32 {
        engine
            .put(
                format!("key{:02}", i).into_bytes(),
                format!("value-of-{:02}", i).into_bytes(),
            )
            .unwrap();
    }
    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(engine.memtable_len(), 0);

    engine.delete(b"key05".to_vec()).unwrap();
    assert_eq!(engine.get(b"key05"), None);
    assert_eq!(engine.get(b"key06"), Some(b"value-of-06".to_vec()));
}

#[test]
fn newest_sstable_wins() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(config(dir.path())).unwrap();

    engine.put(b"a".to_vec(), b"1".to_vec()).unwrap();
    engine.flush().unwrap();
    engine.put(b"a".to_vec(), b"2".to_vec()).unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.sstable_count(), 2);
    assert_eq!(engine.get(b"a"), Some(b"2".to_vec()));
}

#[test]
fn tombstone_shadows_across_many_sstables() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(config(dir.path())).unwrap();

    engine.put(b"k".to_vec(), b"v1".to_vec()).unwrap();
    engine.flush().unwrap();
    engine.put(b"k".to_vec(), b"v2".to_vec()).unwrap();
    engine.flush().unwrap();
    engine.delete(b"k".to_vec()).unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.sstable_count(), 3);
    assert_eq!(engine.get(b"k"), None);
}

#[test]
fn flush_is_idempotent() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(config(dir.path())).unwrap();

    // Empty memtable: a no-op.
    engine.flush().unwrap();
    assert_eq!(engine.sstable_count(), 0);

    engine.put(b"k".to_vec(), b"v".to_vec()).unwrap();
    engine.flush().unwrap();
    engine.flush().unwrap();
    assert_eq!(engine.sstable_count(), 1);
}

#[test]
fn sparse_index_lookup_through_engine() {
    let dir = tempdir().unwrap();
    let mut engine =
        Engine::open(config(dir.path()).with_memtable_threshold(1024 * 1024)).unwrap();

    for i in 0..200u32 {
        engine
            .put(
                format!("key{:03}", i).into_bytes(),
                format!("value-{:03}-{}", i, "x".repeat(10)).into_bytes(),
            )
            .unwrap();
    }
    engine.flush().unwrap();
    assert_eq!(engine.memtable_len(), 0);

    assert_eq!(
        engine.get(b"key137"),
        Some(format!("value-137-{}", "x".repeat(10)).into_bytes())
    );
    assert_eq!(engine.get(b"key137a"), None);
}

// -------------------- Crash recovery --------------------

#[test]
fn wal_replay_after_crash() {
    let dir = tempdir().unwrap();

    // Phase 1: write data and drop the engine without flushing (simulated
    // crash — only the WAL and disk survive).
    {
        let mut engine = Engine::open(config(dir.path())).unwrap();
        engine.put(b"x".to_vec(), b"1".to_vec()).unwrap();
        engine.put(b"y".to_vec(), b"2".to_vec()).unwrap();
        assert_eq!(engine.sstable_count(), 0);
    }

    // Phase 2: reopen and verify WAL recovery.
    {
        let engine = Engine::open(config(dir.path())).unwrap();
        assert_eq!(engine.get(b"x"), Some(b"1".to_vec()));
        assert_eq!(engine.get(b"y"), Some(b"2".to_vec()));
        assert_eq!(engine.memtable_len(), 2);
    }
}

#[test]
fn deletes_survive_crash() {
    let dir = tempdir().unwrap();

    {
        let mut engine = Engine::open(config(dir.path())).unwrap();
        engine.put(b"keep".to_vec(), b"v".to_vec()).unwrap();
        engine.put(b"gone".to_vec(), b"v".to_vec()).unwrap();
        engine.delete(b"gone".to_vec()).unwrap();
    }

    let engine = Engine::open(config(dir.path())).unwrap();
    assert_eq!(engine.get(b"keep"), Some(b"v".to_vec()));
    assert_eq!(engine.get(b"gone"), None);
}

#[test]
fn sstables_from_prior_sessions_are_discovered() {
    let dir = tempdir().unwrap();

    {
        let mut engine = Engine::open(config(dir.path())).unwrap();
        engine.put(b"a".to_vec(), b"1".to_vec()).unwrap();
        engine.flush().unwrap();
        engine.put(b"b".to_vec(), b"2".to_vec()).unwrap();
        engine.flush().unwrap();
    }

    let mut engine = Engine::open(config(dir.path())).unwrap();
    assert_eq!(engine.sstable_count(), 2);
    assert_eq!(engine.get(b"a"), Some(b"1".to_vec()));
    assert_eq!(engine.get(b"b"), Some(b"2".to_vec()));

    // The id counter resumes past the discovered files instead of reusing
    // their names.
    engine.put(b"c".to_vec(), b"3".to_vec()).unwrap();
    engine.flush().unwrap();
    assert!(dir.path().join("sstable_2.sst").exists());
    assert_eq!(engine.get(b"a"), Some(b"1".to_vec()));
}

#[test]
fn newest_sstable_still_wins_after_reopen() {
    let dir = tempdir().unwrap();

    {
        let mut engine = Engine::open(config(dir.path())).unwrap();
        engine.put(b"a".to_vec(), b"old".to_vec()).unwrap();
        engine.flush().unwrap();
        engine.put(b"a".to_vec(), b"new".to_vec()).unwrap();
        engine.flush().unwrap();
    }

    let engine = Engine::open(config(dir.path())).unwrap();
    assert_eq!(engine.get(b"a"), Some(b"new".to_vec()));
}

#[test]
fn oversized_wal_flushes_during_startup() {
    let dir = tempdir().unwrap();

    // Accumulate well past 1024 bytes with a threshold too high to flush.
    {
        let mut engine =
            Engine::open(config(dir.path()).with_memtable_threshold(1024 * 1024)).unwrap();
        for i in 0..100u32 {
            engine
                .put(format!("key{:03}", i).into_bytes(), vec![b'v'; 20])
                .unwrap();
        }
        assert_eq!(engine.sstable_count(), 0);
    }

    // Reopening with the default threshold flushes the replayed memtable
    // immediately.
    let engine = Engine::open(config(dir.path())).unwrap();
    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(engine.memtable_len(), 0);
    assert_eq!(engine.get(b"key042"), Some(vec![b'v'; 20]));
}

#[test]
fn reopen_twice_is_stable() {
    let dir = tempdir().unwrap();

    {
        let mut engine = Engine::open(config(dir.path())).unwrap();
        engine.put(b"k".to_vec(), b"v".to_vec()).unwrap();
    }
    {
        let engine = Engine::open(config(dir.path())).unwrap();
        assert_eq!(engine.memtable_len(), 1);
    }
    let engine = Engine::open(config(dir.path())).unwrap();
    // Replay does not re-append, so the WAL does not grow across reopens.
    assert_eq!(engine.memtable_len(), 1);
    assert_eq!(engine.get(b"k"), Some(b"v".to_vec()));
}

#[test]
fn leftover_tmp_files_are_cleaned_up() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("sstable_5.sst.tmp"), b"half a flush").unwrap();

    let engine = Engine::open(config(dir.path())).unwrap();
    assert!(!dir.path().join("sstable_5.sst.tmp").exists());
    assert_eq!(engine.sstable_count(), 0);
}

// -------------------- Read-path resilience --------------------

#[test]
fn unreadable_sstable_is_skipped_during_get() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(config(dir.path())).unwrap();

    engine.put(b"a".to_vec(), b"1".to_vec()).unwrap();
    engine.flush().unwrap();
    engine.put(b"b".to_vec(), b"2".to_vec()).unwrap();
    engine.flush().unwrap();

    // Pull the newest table out from under the engine.
    std::fs::remove_file(dir.path().join("sstable_1.sst")).unwrap();

    // "b" lived only in the vanished table; "a" must still be served from
    // the older one.
    assert_eq!(engine.get(b"b"), None);
    assert_eq!(engine.get(b"a"), Some(b"1".to_vec()));
}

// -------------------- Misc --------------------

#[test]
fn empty_engine() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(config(dir.path())).unwrap();

    assert_eq!(engine.memtable_len(), 0);
    assert_eq!(engine.memtable_size(), 0);
    assert_eq!(engine.sstable_count(), 0);
    assert_eq!(engine.get(b"anything"), None);
}

#[test]
fn binary_keys_and_values() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(config(dir.path())).unwrap();

    let key = vec![0x00, 0xFF, b'\n', b' '];
    let value = vec![0xDE, 0xAD, 0xBE, 0xEF];
    engine.put(key.clone(), value.clone()).unwrap();
    engine.flush().unwrap();
    assert_eq!(engine.get(&key), Some(value));
}

#[test]
fn unicode_keys() {
    let dir = tempdir().unwrap();
    let mut engine = Engine::open(config(dir.path())).unwrap();

    engine
        .put("café".as_bytes().to_vec(), b"coffee".to_vec())
        .unwrap();
    engine
        .put("日本語".as_bytes().to_vec(), b"japanese".to_vec())
        .unwrap();

    assert_eq!(engine.get("café".as_bytes()), Some(b"coffee".to_vec()));
    assert_eq!(engine.get("日本語".as_bytes()), Some(b"japanese".to_vec()));
}
