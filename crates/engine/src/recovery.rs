//! Startup recovery: SSTable discovery and WAL replay.

use anyhow::{Context, Result};
use memtable::Memtable;
use sstable::SSTableReader;
use std::fs;
use std::path::{Path, PathBuf};
use wal::{WalReader, WalRecord};

/// Replays the WAL at `path` into `mem`, returning the number of records
/// applied. A missing file means a clean previous shutdown: no records.
pub(crate) fn replay_wal(path: &Path, mem: &mut Memtable) -> Result<usize> {
    let mut reader = match WalReader::open(path) {
        Ok(r) => r,
        Err(_) => return Ok(0),
    };

    let mut count = 0usize;
    reader
        .replay(|record| {
            match record {
                WalRecord::Put { key, value } => mem.put(key, value),
                WalRecord::Del { key } => mem.delete(key),
            }
            count += 1;
        })
        .context("wal replay failed")?;
    Ok(count)
}

/// Scans `dir` for `sstable_<N>.sst` files left by earlier sessions.
///
/// Each file's sparse index is rebuilt with one sequential pass. Returns
/// the readers ordered oldest-first (ascending `N`) together with the next
/// unused id, `max(N) + 1`. Leftover `.tmp` files from interrupted flushes
/// are deleted first.
pub(crate) fn load_sstables(
    dir: &Path,
    index_interval: u64,
) -> Result<(Vec<SSTableReader>, u64)> {
    cleanup_tmp_files(dir);

    let mut found: Vec<(u64, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let id = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_sst_id);
        if let Some(id) = id {
            found.push((id, path));
        }
    }
    found.sort_by_key(|(id, _)| *id);

    let mut sstables = Vec::with_capacity(found.len());
    let mut next_id = 0u64;
    for (id, path) in found {
        let reader = SSTableReader::open(&path, index_interval)
            .with_context(|| format!("cannot rebuild sstable index for {:?}", path))?;
        sstables.push(reader);
        next_id = id + 1;
    }

    Ok((sstables, next_id))
}

/// Extracts `N` from a `sstable_<N>.sst` filename.
fn parse_sst_id(name: &str) -> Option<u64> {
    name.strip_prefix("sstable_")?
        .strip_suffix(".sst")?
        .parse()
        .ok()
}

/// Best-effort removal of `.tmp` leftovers from flushes that never reached
/// their atomic rename.
fn cleanup_tmp_files(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map(|e| e == "tmp").unwrap_or(false) {
            log::info!("removing leftover temp file {:?}", path);
            let _ = fs::remove_file(&path);
        }
    }
}
