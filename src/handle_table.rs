//! Handle table: process-wide mapping from integer handle to virtual file.
//! Guarded by a readers-writer lock: `open`
//! and `close` restructure the map and take the write lock; `read` and
//! `seek` only need to look an entry up and take the read lock, then mutate
//! that one entry's `VirtualFile` through its own `Mutex` — handles on
//! different entries never contend with each other.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use crate::config::FIRST_HANDLE;
use crate::vfile::VirtualFile;

pub type Entry = Arc<Mutex<VirtualFile>>;

pub struct HandleTable {
    entries: BTreeMap<i64, Entry>,
}

impl HandleTable {
    fn new() -> Self {
        HandleTable { entries: BTreeMap::new() }
    }

    /// New-handle rule: an empty table hands out `FIRST_HANDLE`;
    /// otherwise the smallest existing handle minus one. Handles therefore
    /// descend monotonically and are never reused while the table is
    /// non-empty.
    fn next_handle(&self) -> i64 {
        match self.entries.keys().next() {
            None => FIRST_HANDLE,
            Some(&smallest) => smallest - 1,
        }
    }

    pub fn insert(&mut self, vfile: VirtualFile) -> i64 {
        let handle = self.next_handle();
        self.entries.insert(handle, Arc::new(Mutex::new(vfile)));
        handle
    }

    pub fn remove(&mut self, handle: i64) -> Option<Entry> {
        self.entries.remove(&handle)
    }

    pub fn get(&self, handle: i64) -> Option<Entry> {
        self.entries.get(&handle).cloned()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// The process-wide instance.
static TABLE: OnceLock<RwLock<HandleTable>> = OnceLock::new();

pub fn table() -> &'static RwLock<HandleTable> {
    TABLE.get_or_init(|| RwLock::new(HandleTable::new()))
}
