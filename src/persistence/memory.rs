use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::RwLock;

use super::{PersistenceError, PersistenceResult, SnapshotBackend};

/// An in-memory snapshot backend.
///
/// Suitable for unit and integration tests. Writes can be made to fail
/// ([`MemoryBackend::set_fail_writes`]) or to take a fixed time
/// ([`MemoryBackend::with_write_delay`]) so that callers interleave at the
/// persistence boundary.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    snapshots: RwLock<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
    write_delay: Option<Duration>,
    writes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_write_delay(delay: Duration) -> Self {
        Self {
            write_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `store` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl SnapshotBackend for MemoryBackend {
    fn load(&self, collection: &str) -> PersistenceResult<Option<Vec<u8>>> {
        Ok(self.snapshots.read().get(collection).cloned())
    }

    fn store(&self, collection: &str, bytes: &[u8]) -> PersistenceResult<()> {
        if let Some(delay) = self.write_delay {
            std::thread::sleep(delay);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::WriteRejected(format!(
                "{collection}: writes disabled"
            )));
        }
        self.snapshots
            .write()
            .insert(collection.to_string(), bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
