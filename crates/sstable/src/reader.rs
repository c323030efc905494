use anyhow::Result;
use memtable::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::ops::Bound;
use std::path::{Path, PathBuf};

use crate::format;

/// Reads an SSTable file for point lookups.
///
/// The reader holds the file's path and its **sparse index** — a
/// `BTreeMap<Vec<u8>, u64>` mapping a subset of the file's keys to their
/// record offsets. A lookup floors the target key in the index, seeks to
/// that offset, and scans forward at most one inter-index block, so per-SST
/// work is bounded by the index interval regardless of file size.
///
/// The data file is **not** kept open between lookups — each
/// [`get`](SSTableReader::get) call opens the file, seeks, scans its block,
/// and drops the handle. This keeps ownership simple and avoids holding
/// long-lived file descriptors.
pub struct SSTableReader {
    /// Path to the `.sst` file on disk.
    path: PathBuf,
    /// Sparse in-memory index: key → byte offset of that key's record.
    index: BTreeMap<Vec<u8>, u64>,
}

impl SSTableReader {
    /// Wraps a freshly written SSTable with the index its writer produced.
    pub fn new(path: PathBuf, index: BTreeMap<Vec<u8>, u64>) -> Self {
        Self { path, index }
    }

    /// Opens an SSTable from a previous session, rebuilding its sparse
    /// index with a single sequential pass over the file.
    ///
    /// Applies the same rule the writer does: the first record is indexed
    /// unconditionally, then every record starting at least
    /// `index_interval` bytes past the last indexed offset.
    pub fn open<P: AsRef<Path>>(path: P, index_interval: u64) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf)?;
        let mut rdr = BufReader::new(file);

        let mut index = BTreeMap::new();
        let mut last_index_offset = 0u64;
        let mut pos = 0u64;

        while let Some((key, entry)) = format::read_record(&mut rdr)? {
            if index.is_empty() || pos - last_index_offset >= index_interval {
                index.insert(key.clone(), pos);
                last_index_offset = pos;
            }
            pos += format::record_len(&key, &entry);
        }

        Ok(Self {
            path: path_buf,
            index,
        })
    }

    /// Point lookup for a single key.
    ///
    /// Returns `Ok(Some(entry))` if the key exists in this SSTable (the
    /// entry may be a tombstone). Returns `Ok(None)` if the key is not
    /// present. The scan visits only the block between the key's floor
    /// index entry and the next index entry (or EOF).
    pub fn get(&self, key: &[u8]) -> Result<Option<Entry>> {
        let (start, stop) = match self.scan_bounds(key) {
            Some(bounds) => bounds,
            // Strictly less than the first indexed key, which is the
            // file's first key: cannot be present.
            None => return Ok(None),
        };

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(start))?;
        let mut rdr = BufReader::new(file);

        let mut pos = start;
        loop {
            if let Some(stop) = stop {
                if pos >= stop {
                    return Ok(None);
                }
            }
            let (file_key, entry) = match format::read_record(&mut rdr)? {
                Some(rec) => rec,
                None => return Ok(None),
            };
            if file_key.as_slice() == key {
                return Ok(Some(entry));
            }
            if file_key.as_slice() > key {
                return Ok(None);
            }
            pos += format::record_len(&file_key, &entry);
        }
    }

    /// The scan window for `key`: the floor index entry's offset and the
    /// next index entry's offset (`None` means scan to EOF). Returns `None`
    /// when the key precedes every indexed key.
    pub fn scan_bounds(&self, key: &[u8]) -> Option<(u64, Option<u64>)> {
        let (_, &start) = self
            .index
            .range::<[u8], _>((Bound::Unbounded, Bound::Included(key)))
            .next_back()?;
        let stop = self
            .index
            .range::<[u8], _>((Bound::Excluded(key), Bound::Unbounded))
            .next()
            .map(|(_, &offset)| offset);
        Some((start, stop))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of sparse index entries (not the number of records).
    pub fn index_len(&self) -> usize {
        self.index.len()
    }
}
