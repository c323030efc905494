//! Write path: `put`, `delete`, and the memtable flush.

use anyhow::{Context, Result};
use sstable::{SSTableReader, SSTableWriter};
use wal::WalRecord;

use crate::Engine;

impl Engine {
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// The record is durable in the WAL before the memtable is touched; if
    /// the append fails the mutation does not happen at all. May trigger a
    /// flush, whose failure is also surfaced here — the write itself stays
    /// durable and the flush is retried on the next trigger.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.wal
            .append(&WalRecord::Put {
                key: key.clone(),
                value: value.clone(),
            })
            .context("wal append failed, put aborted")?;

        self.memtable.put(key, value);
        self.maybe_flush()
    }

    /// Deletes `key` by writing a tombstone that shadows every older value,
    /// flushed or not. Deleting an absent key is not an error.
    pub fn delete(&mut self, key: Vec<u8>) -> Result<()> {
        self.wal
            .append(&WalRecord::Del { key: key.clone() })
            .context("wal append failed, delete aborted")?;

        self.memtable.delete(key);
        self.maybe_flush()
    }

    fn maybe_flush(&mut self) -> Result<()> {
        if self.memtable.approx_size() > self.config.memtable_threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Drains the memtable into a new SSTable and truncates the WAL.
    ///
    /// No-op on an empty memtable. The step order — SSTable written and
    /// fsynced, registry extended, memtable cleared, WAL truncated — keeps
    /// every intermediate crash state correct: at worst the same records
    /// exist in both the SSTable and the WAL, and replay shadows the
    /// SSTable with identical data.
    ///
    /// On failure the memtable and WAL are left intact, so nothing is lost
    /// and the flush retries on the next trigger.
    pub fn flush(&mut self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }

        let id = self.next_sst_id;
        let path = self.config.data_dir.join(format!("sstable_{}.sst", id));
        let index =
            SSTableWriter::write_from_memtable(&path, &self.memtable, self.config.index_interval)
                .with_context(|| format!("flush to {:?} failed", path))?;

        self.next_sst_id = id + 1;
        self.sstables.push(SSTableReader::new(path, index));

        let entries = self.memtable.len();
        self.memtable.clear();
        self.wal
            .truncate()
            .context("wal truncate after flush failed")?;

        log::info!("flushed {} entries to sstable_{}.sst", entries, id);
        Ok(())
    }
}
