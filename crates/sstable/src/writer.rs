use anyhow::Result;
use memtable::Memtable;
use std::collections::BTreeMap;
use std::fs::{rename, OpenOptions};
use std::io::{Seek, Write};
use std::path::Path;

use crate::format;

/// Writes a [`Memtable`] to disk as an immutable SSTable file.
///
/// The writer is stateless — all work happens inside the single static
/// method [`write_from_memtable`](SSTableWriter::write_from_memtable). The
/// write is crash-safe: data is first written to a temporary file, fsynced,
/// and then atomically renamed to the final path.
pub struct SSTableWriter {}

impl SSTableWriter {
    /// Flushes `mem` to a new SSTable file at `path` and returns the sparse
    /// index built along the way.
    ///
    /// Records are written in the memtable's ascending key order, tombstones
    /// included. The sparse index gets the first record unconditionally and
    /// every later record whose start offset is at least `index_interval`
    /// bytes past the previously indexed offset, so a point lookup never
    /// scans more than one inter-index block.
    ///
    /// # Crash Safety
    ///
    /// Writes to `<path>.tmp`, calls `sync_all()`, then atomically renames.
    /// If the process crashes mid-write the temp file is left behind and
    /// deleted on recovery.
    pub fn write_from_memtable(
        path: &Path,
        mem: &Memtable,
        index_interval: u64,
    ) -> Result<BTreeMap<Vec<u8>, u64>> {
        // Temporary file next to the target for the atomic rename later.
        let tmp_path = path.with_extension("sst.tmp");
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;

        let mut index: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
        let mut last_index_offset = 0u64;

        for (key, entry) in mem.iter() {
            let offset = file.stream_position()?;

            if index.is_empty() || offset - last_index_offset >= index_interval {
                index.insert(key.clone(), offset);
                last_index_offset = offset;
            }

            format::write_record(&mut file, key, entry)?;
        }

        file.flush()?;
        file.sync_all()?;

        rename(tmp_path, path)?;

        Ok(index)
    }
}
