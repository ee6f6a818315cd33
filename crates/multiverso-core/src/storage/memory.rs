use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{KeyValueStore, StorageError};

/// In-process store for tests and ephemeral sessions.
///
/// Reads and writes can be made to fail on demand to exercise the
/// best-effort paths of the favorites store and the character cache.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A panicked writer cannot leave a map entry half-written, so the data is still usable
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn injected(key: &str) -> io::Error {
        io::Error::new(io::ErrorKind::Other, format!("injected failure for {}", key))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Read {
                key: key.to_string(),
                source: Self::injected(key),
            });
        }
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                key: key.to_string(),
                source: Self::injected(key),
            });
        }
        self.lock().insert(key.to_string(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                key: keys.join(","),
                source: Self::injected("delete"),
            });
        }
        let mut records = self.lock();
        for key in keys {
            records.remove(*key);
        }
        Ok(())
    }
}
