//! Session handle bookkeeping.
//!
//! Every successful open/create/opendir mints one id that the kernel hands
//! back on each later call against that open session; the table maps the id
//! to the native descriptor acquired at open time. Ids are never reused for
//! the lifetime of the process and handles are never looked up by path, so a
//! rename while a file is open cannot detach I/O from the already-open
//! descriptor. One release/releasedir removes the entry; the descriptor is
//! closed when the last in-flight operation drops its reference.

use std::collections::HashMap;
use std::fs::File;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// A native handle owned by a single open session.
#[derive(Debug, Clone)]
pub enum Handle {
    /// Descriptor of an open regular file.
    File(Arc<File>),
    /// Descriptor of a directory enumeration session (opened O_DIRECTORY).
    Dir(Arc<File>),
}

#[derive(Debug)]
pub struct HandleTable {
    next_fh: AtomicU64,
    entries: RwLock<HashMap<u64, Handle>>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            next_fh: AtomicU64::new(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert_file(&self, file: File) -> u64 {
        let fh = self.next_fh.fetch_add(1, Ordering::Relaxed);
        self.entries
            .write()
            .unwrap()
            .insert(fh, Handle::File(Arc::new(file)));
        fh
    }

    pub fn insert_dir(&self, dir: File) -> u64 {
        let fh = self.next_fh.fetch_add(1, Ordering::Relaxed);
        self.entries
            .write()
            .unwrap()
            .insert(fh, Handle::Dir(Arc::new(dir)));
        fh
    }

    pub fn get_file(&self, fh: u64) -> Option<Arc<File>> {
        match self.entries.read().unwrap().get(&fh)? {
            Handle::File(file) => Some(file.clone()),
            Handle::Dir(_) => None,
        }
    }

    pub fn get_dir(&self, fh: u64) -> Option<Arc<File>> {
        match self.entries.read().unwrap().get(&fh)? {
            Handle::Dir(dir) => Some(dir.clone()),
            Handle::File(_) => None,
        }
    }

    /// Either kind of descriptor, for operations that accept both (fstat).
    pub fn get(&self, fh: u64) -> Option<Arc<File>> {
        match self.entries.read().unwrap().get(&fh)? {
            Handle::File(file) => Some(file.clone()),
            Handle::Dir(dir) => Some(dir.clone()),
        }
    }

    pub fn remove(&self, fh: u64) -> Option<Handle> {
        self.entries.write().unwrap().remove(&fh)
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}
