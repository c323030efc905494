//! Engine configuration: tunable parameters and their defaults.

use std::path::PathBuf;

/// Memtable byte-count threshold that triggers a flush.
pub const DEFAULT_MEMTABLE_THRESHOLD: usize = 1024;

/// Minimum byte gap between consecutive sparse-index entries.
pub const DEFAULT_INDEX_INTERVAL: u64 = 128;

/// Configuration for the DriftKV storage engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory where SSTable files live.
    pub data_dir: PathBuf,

    /// Path to the write-ahead log.
    pub wal_path: PathBuf,

    /// Flush the memtable once its byte counter exceeds this.
    pub memtable_threshold: usize,

    /// Minimum byte gap between consecutive sparse-index entries.
    pub index_interval: u64,

    /// Whether every WAL append is fsynced before being acknowledged.
    pub sync_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new("./data")
    }
}

impl Config {
    /// Creates a config rooted at `data_dir`, with the WAL at
    /// `<data_dir>/wal.log` and default thresholds.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let wal_path = data_dir.join("wal.log");
        Self {
            data_dir,
            wal_path,
            memtable_threshold: DEFAULT_MEMTABLE_THRESHOLD,
            index_interval: DEFAULT_INDEX_INTERVAL,
            sync_writes: true,
        }
    }

    pub fn with_wal_path(mut self, wal_path: impl Into<PathBuf>) -> Self {
        self.wal_path = wal_path.into();
        self
    }

    pub fn with_memtable_threshold(mut self, threshold: usize) -> Self {
        self.memtable_threshold = threshold;
        self
    }

    pub fn with_index_interval(mut self, interval: u64) -> Self {
        self.index_interval = interval;
        self
    }

    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Creates the data directory and the WAL's parent directory.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        if let Some(parent) = self.wal_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
