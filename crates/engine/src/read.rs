//! Read path: memtable first, then SSTables newest to oldest.

use memtable::Entry;

use crate::Engine;

impl Engine {
    /// Returns the current value of `key`, or `None` if the key was never
    /// written or its newest record is a tombstone.
    ///
    /// The memtable answers first. On a miss the SSTables are consulted
    /// newest to oldest; the first table that knows the key decides —
    /// a value is returned, a tombstone hides everything older. An SSTable
    /// that cannot be read is treated as empty for this lookup and the
    /// search continues with older tables.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        if let Some(entry) = self.memtable.get_entry(key) {
            return match entry {
                Entry::Value(v) => Some(v.clone()),
                Entry::Tombstone => None,
            };
        }

        for sstable in self.sstables.iter().rev() {
            match sstable.get(key) {
                Ok(Some(Entry::Value(v))) => return Some(v),
                Ok(Some(Entry::Tombstone)) => return None,
                Ok(None) => {}
                Err(err) => {
                    log::warn!(
                        "skipping unreadable sstable {:?} during get: {:#}",
                        sstable.path(),
                        err
                    );
                }
            }
        }

        None
    }
}
