//! # Write-Ahead Log
//!
//! Append-only durability log for the DriftKV storage engine. Every mutation
//! is appended here **before** the memtable is updated; on startup the log is
//! replayed to rebuild the memtable, and after a successful flush it is
//! truncated to empty.
//!
//! ## Record format
//!
//! ```text
//! record_len (u32 LE) | crc32 (u32 LE) | body
//! body = op (u8: 0 = put, 1 = del) | key_len (u32 LE) | key | [val_len (u32 LE) | value]
//! ```
//!
//! `record_len` counts the crc plus the body; the crc32 covers the body
//! only. The length prefix lets replay locate the next record boundary even
//! when a record's payload turns out to be corrupt.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalRecord {
    Put { key: Vec<u8>, value: Vec<u8> },
    Del { key: Vec<u8> },
}

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("corrupt record")]
    Corrupt,
}

const OP_PUT: u8 = 0;
const OP_DEL: u8 = 1;

/// WAL writer that appends records and optionally fsyncs each one.
///
/// A record is not acknowledged to the caller until it has been handed to
/// the OS (and, with `sync`, fsynced), so a write that returns `Ok` will be
/// replayed after a crash.
pub struct WalWriter {
    path: PathBuf,
    file: File,
    sync: bool,
}

impl WalWriter {
    /// Opens (creating if necessary) the log at `path` in append mode.
    pub fn create<P: AsRef<Path>>(path: P, sync: bool) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file, sync })
    }

    /// Appends a record. Writes the full frame and (when `sync`) calls
    /// `sync_all` before returning.
    pub fn append(&mut self, record: &WalRecord) -> Result<(), WalError> {
        let mut buf = Vec::new();
        match record {
            WalRecord::Put { key, value } => {
                buf.write_u8(OP_PUT)?;
                buf.write_u32::<LittleEndian>(key.len() as u32)?;
                buf.extend_from_slice(key);
                buf.write_u32::<LittleEndian>(value.len() as u32)?;
                buf.extend_from_slice(value);
            }
            WalRecord::Del { key } => {
                buf.write_u8(OP_DEL)?;
                buf.write_u32::<LittleEndian>(key.len() as u32)?;
                buf.extend_from_slice(key);
            }
        }

        let mut hasher = Crc32::new();
        hasher.update(&buf);
        let crc = hasher.finalize();

        // full record: record_len(u32) [not counting this header], crc(u32), body
        let record_len = buf.len() as u32 + 4;
        self.file.write_u32::<LittleEndian>(record_len)?;
        self.file.write_u32::<LittleEndian>(crc)?;
        self.file.write_all(&buf)?;
        self.file.flush()?;

        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Replaces the log with an empty file (called after a successful
    /// flush). The handle is reopened in append mode afterwards.
    pub fn truncate(&mut self) -> Result<(), WalError> {
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// WAL reader that yields records in append order.
pub struct WalReader<R: Read> {
    rdr: BufReader<R>,
}

impl WalReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WalReader<File>, WalError> {
        let f = File::open(path)?;
        Ok(WalReader {
            rdr: BufReader::new(f),
        })
    }
}

impl<R: Read> WalReader<R> {
    pub fn from_reader(reader: R) -> Self {
        WalReader {
            rdr: BufReader::new(reader),
        }
    }

    /// Replays every intact record in append order.
    ///
    /// A torn tail — EOF in the middle of a record, as left by a crash
    /// mid-append — ends replay cleanly. A record whose crc does not match
    /// its body is skipped (the length prefix locates the next boundary) and
    /// replay continues with the following record. Only real I/O failures
    /// surface as errors.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<(), WalError>
    where
        F: FnMut(WalRecord),
    {
        loop {
            let record_len = match self.rdr.read_u32::<LittleEndian>() {
                Ok(v) => v,
                Err(e) => {
                    return if e.kind() == io::ErrorKind::UnexpectedEof {
                        Ok(())
                    } else {
                        Err(WalError::Io(e))
                    };
                }
            };

            // A frame is at least the crc plus a one-byte op and a key
            // length. Anything shorter means the header itself is damaged;
            // without a trustworthy length there is no next boundary to
            // resync to, so replay stops here.
            if record_len < 4 + 1 + 4 {
                log::warn!("wal: implausible record length {}, stopping replay", record_len);
                return Ok(());
            }

            let crc = match self.rdr.read_u32::<LittleEndian>() {
                Ok(v) => v,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(WalError::Io(e)),
            };

            let mut body = vec![0u8; (record_len - 4) as usize];
            match self.rdr.read_exact(&mut body) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(WalError::Io(e)),
            }

            let mut hasher = Crc32::new();
            hasher.update(&body);
            if hasher.finalize() != crc {
                log::warn!("wal: skipping record with bad crc");
                continue;
            }

            match parse_body(&body) {
                Some(record) => apply(record),
                None => log::warn!("wal: skipping unparsable record"),
            }
        }
    }
}

/// Decodes a crc-verified record body. Returns `None` when the body does not
/// match the framing (wrong op byte, lengths past the end).
fn parse_body(mut body: &[u8]) -> Option<WalRecord> {
    let op = body.read_u8().ok()?;
    let key_len = body.read_u32::<LittleEndian>().ok()? as usize;
    if body.len() < key_len {
        return None;
    }
    let mut key = vec![0u8; key_len];
    body.read_exact(&mut key).ok()?;

    match op {
        OP_PUT => {
            let val_len = body.read_u32::<LittleEndian>().ok()? as usize;
            if body.len() != val_len {
                return None;
            }
            let mut value = vec![0u8; val_len];
            body.read_exact(&mut value).ok()?;
            Some(WalRecord::Put { key, value })
        }
        OP_DEL => {
            if !body.is_empty() {
                return None;
            }
            Some(WalRecord::Del { key })
        }
        _ => None,
    }
}
