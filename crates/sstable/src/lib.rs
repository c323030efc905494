//! # SSTable — Sorted String Table
//!
//! Immutable, on-disk storage files for the DriftKV storage engine.
//!
//! When the in-memory [`memtable::Memtable`] exceeds its size threshold the
//! engine flushes it to disk as an SSTable. SSTables are **write-once,
//! read-many** — once created they are never modified.
//!
//! ## File layout
//!
//! A file is nothing but sorted records, back to back:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ key_len (u32 LE) | key | kind (u8) | [val_len (u32) | val]│
//! │                                                           │
//! │ ... repeated, keys strictly ascending ...                 │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! `kind` is `1` for a live value (length-prefixed bytes follow) and `0` for
//! a tombstone (nothing follows). There is no on-disk index: each SSTable's
//! **sparse index** (key → record offset, one entry at least every
//! `index_interval` bytes) lives in memory. The [`SSTableWriter`] emits it
//! while writing; on startup [`SSTableReader::open`] rebuilds it with a
//! single sequential pass over the file.
//!
//! Point lookups floor the target key in the sparse index, seek to that
//! offset, and scan at most one inter-index block.

pub mod format;
mod reader;
mod writer;

pub use reader::SSTableReader;
pub use writer::SSTableWriter;
