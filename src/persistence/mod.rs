//! Durable snapshot storage for the resource stores.
//!
//! Every collection (`products`, `carts`) is persisted as one complete
//! snapshot: read entirely at startup, rewritten entirely after each
//! mutation. Backends are opaque byte stores keyed by collection name; the
//! JSON encoding lives in [`encode_snapshot`] / [`decode_snapshot`].
//!
//! - [`FileBackend`] - one file per collection, atomic replace
//! - `MemoryBackend` - test builds only, with write-failure and latency injection

mod file;
#[cfg(test)]
mod memory;

pub use file::FileBackend;
#[cfg(test)]
pub use memory::MemoryBackend;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use thiserror::Error;

/// Result type for snapshot operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors that can occur while reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("snapshot corrupted: {0}")]
    Corrupted(String),

    #[error("write rejected: {0}")]
    WriteRejected(String),
}

/// A durable keyed store holding one snapshot per collection.
///
/// # Invariants
///
/// - `store` replaces the whole snapshot or leaves the previous one intact
/// - after `store` returns `Ok`, `load` returns exactly the stored bytes,
///   including after a process restart for durable backends
pub trait SnapshotBackend: Send + Sync {
    /// Returns the last stored snapshot, or `None` if the collection was
    /// never written.
    fn load(&self, collection: &str) -> PersistenceResult<Option<Vec<u8>>>;

    /// Durably replaces the snapshot of `collection`.
    fn store(&self, collection: &str, bytes: &[u8]) -> PersistenceResult<()>;
}

pub fn encode_snapshot<T: Serialize>(records: &[T]) -> PersistenceResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}

pub fn decode_snapshot<T: DeserializeOwned>(
    backend: &dyn SnapshotBackend,
    collection: &str,
) -> PersistenceResult<Vec<T>> {
    match backend.load(collection)? {
        Some(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Some(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| PersistenceError::Corrupted(format!("{collection}: {e}"))),
        None => Ok(Vec::new()),
    }
}
