//! # Engine — DriftKV Storage Engine
//!
//! The central orchestrator that ties together the [`memtable`], [`wal`],
//! and [`sstable`] crates into a complete LSM-tree key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                      │
//! │                                               │
//! │ write.rs → WAL append → Memtable insert       │
//! │              |                                │
//! │              |  (threshold exceeded?)         │
//! │              |            yes                 │
//! │              v                                │
//! │           flush() → new SSTable               │
//! │                     registry append           │
//! │                     WAL truncate              │
//! │                                               │
//! │ read.rs → Memtable → SSTs newest-to-oldest    │
//! │            (first match wins)                 │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                              |
//! |--------------|------------------------------------------------------|
//! | `lib.rs`     | `Engine` struct, constructor, accessors              |
//! | [`config`]   | Tunable parameters and their defaults                |
//! | `recovery`   | WAL replay, SSTable discovery, tmp file cleanup      |
//! | `write`      | `put()`, `delete()`, `flush()`                       |
//! | `read`       | `get()`                                              |
//!
//! ## Crash Safety
//!
//! Every write is appended to the WAL **before** the memtable update. On
//! flush, the SSTable is written and fsynced (via temp file + atomic
//! rename), the registry is extended, and only then is the WAL truncated
//! and the memtable cleared. A crash between those steps leaves the records
//! in both the SSTable and the WAL; replaying them on restart merely shadows
//! the SSTable with identical data, which is semantically a no-op.
//!
//! ## Concurrency
//!
//! None. The engine is single-threaded and assumes exclusive ownership of
//! its data directory and WAL path for its lifetime.

pub mod config;
mod read;
mod recovery;
mod write;

pub use config::Config;

use anyhow::{Context, Result};
use memtable::Memtable;
use sstable::SSTableReader;
use wal::WalWriter;

/// The central storage engine orchestrating the memtable, WAL, and SSTables.
///
/// # Write Path
///
/// 1. Append the record to the WAL (crash-safe durability). A failed append
///    aborts the operation with the memtable untouched.
/// 2. Apply the mutation to the in-memory memtable.
/// 3. If the memtable's byte counter exceeds `memtable_threshold`, flush it
///    to a new SSTable and truncate the WAL.
///
/// # Read Path
///
/// 1. Check the memtable (freshest data, includes tombstones).
/// 2. Check SSTables from newest to oldest; first match wins; tombstones
///    shadow older values.
///
/// # Recovery
///
/// [`Engine::open`] scans the data directory for SSTables left by earlier
/// sessions, rebuilds their sparse indexes, replays the WAL into a fresh
/// memtable, and flushes immediately if the replayed data already exceeds
/// the threshold.
pub struct Engine {
    memtable: Memtable,
    wal: WalWriter,
    /// SSTables in creation order, oldest first. Reads walk it in reverse.
    sstables: Vec<SSTableReader>,
    /// Id assigned to the next flushed SSTable; never reused.
    next_sst_id: u64,
    config: Config,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("data_dir", &self.config.data_dir)
            .field("wal_path", &self.config.wal_path)
            .field("memtable_entries", &self.memtable.len())
            .field("memtable_size", &self.memtable.approx_size())
            .field("sstable_count", &self.sstables.len())
            .field("next_sst_id", &self.next_sst_id)
            .finish()
    }
}

impl Engine {
    /// Opens (or creates) an engine at the configured paths, performing full
    /// recovery.
    ///
    /// # Recovery Steps
    ///
    /// 1. Create the data directory and the WAL's parent directory.
    /// 2. Delete leftover `.tmp` files from interrupted flushes.
    /// 3. Discover `sstable_<N>.sst` files, rebuild each sparse index with a
    ///    sequential scan, register them in ascending `N`, and seed the id
    ///    counter to `max(N) + 1`.
    /// 4. Replay the WAL into a fresh memtable (without re-appending).
    /// 5. Open the WAL writer in append mode.
    /// 6. Flush right away if the replayed memtable already exceeds the
    ///    threshold.
    ///
    /// # Errors
    ///
    /// Failing to create the directories or to open the WAL for append is
    /// fatal: without them durability cannot be guaranteed.
    pub fn open(config: Config) -> Result<Self> {
        config
            .ensure_dirs()
            .with_context(|| format!("cannot create data dir {:?}", config.data_dir))?;

        let (sstables, next_sst_id) =
            recovery::load_sstables(&config.data_dir, config.index_interval)?;

        // Replay before opening the writer so the reader sees a quiescent
        // file.
        let mut memtable = Memtable::new();
        let replayed = recovery::replay_wal(&config.wal_path, &mut memtable)?;

        let wal = WalWriter::create(&config.wal_path, config.sync_writes)
            .with_context(|| format!("cannot open wal for append at {:?}", config.wal_path))?;

        log::info!(
            "engine opened at {:?}: {} sstable(s), {} wal record(s) replayed",
            config.data_dir,
            sstables.len(),
            replayed
        );

        let mut engine = Self {
            memtable,
            wal,
            sstables,
            next_sst_id,
            config,
        };

        if engine.memtable.approx_size() > engine.config.memtable_threshold {
            engine.flush()?;
        }

        Ok(engine)
    }

    /// Number of entries currently buffered in the memtable (tombstones
    /// included).
    #[must_use]
    pub fn memtable_len(&self) -> usize {
        self.memtable.len()
    }

    /// Cumulative byte size charged to the memtable since the last flush.
    #[must_use]
    pub fn memtable_size(&self) -> usize {
        self.memtable.approx_size()
    }

    /// Number of SSTables in the registry.
    #[must_use]
    pub fn sstable_count(&self) -> usize {
        self.sstables.len()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests;
