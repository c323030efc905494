//! SSTable record framing shared by the writer and the reader.
//!
//! Each record is:
//!
//! ```text
//! key_len (u32 LE) | key bytes | kind (u8) | [val_len (u32 LE) | value bytes]
//! ```
//!
//! `kind` distinguishes live values from tombstones out of band, so keys and
//! values are free to contain any bytes at all.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use memtable::Entry;
use std::io::{self, Read, Write};

/// Record kind tag: a live value, `val_len | value` follows.
pub const KIND_VALUE: u8 = 1;
/// Record kind tag: a tombstone, nothing follows.
pub const KIND_TOMBSTONE: u8 = 0;

/// Serializes one record to `w`.
pub fn write_record<W: Write>(w: &mut W, key: &[u8], entry: &Entry) -> io::Result<()> {
    w.write_u32::<LittleEndian>(key.len() as u32)?;
    w.write_all(key)?;
    match entry {
        Entry::Value(v) => {
            w.write_u8(KIND_VALUE)?;
            w.write_u32::<LittleEndian>(v.len() as u32)?;
            w.write_all(v)?;
        }
        Entry::Tombstone => {
            w.write_u8(KIND_TOMBSTONE)?;
        }
    }
    Ok(())
}

/// Reads one record from `r`.
///
/// Returns `Ok(None)` at end of file — including a torn trailing record,
/// which a sequential scan treats the same as EOF. An unknown kind tag is
/// reported as `InvalidData`.
pub fn read_record<R: Read>(r: &mut R) -> io::Result<Option<(Vec<u8>, Entry)>> {
    let key_len = match r.read_u32::<LittleEndian>() {
        Ok(v) => v as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut key = vec![0u8; key_len];
    match r.read_exact(&mut key) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let kind = match r.read_u8() {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };

    match kind {
        KIND_VALUE => {
            let val_len = match r.read_u32::<LittleEndian>() {
                Ok(v) => v as usize,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e),
            };
            let mut value = vec![0u8; val_len];
            match r.read_exact(&mut value) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e),
            }
            Ok(Some((key, Entry::Value(value))))
        }
        KIND_TOMBSTONE => Ok(Some((key, Entry::Tombstone))),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unknown sstable record kind {}", other),
        )),
    }
}

/// The exact number of bytes [`write_record`] produces for this record.
/// Sequential scans use it to track record start offsets.
pub fn record_len(key: &[u8], entry: &Entry) -> u64 {
    let body = match entry {
        Entry::Value(v) => 1 + 4 + v.len() as u64,
        Entry::Tombstone => 1,
    };
    4 + key.len() as u64 + body
}
