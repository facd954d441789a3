use serde::{Deserialize, Serialize};

use crate::actor_framework::{sequence_key, Entity, IdSequence};
use crate::domain::{Product, ProductId};
use crate::error::StoreError;
use crate::persistence::{PersistenceError, PersistenceResult, SnapshotBackend};

#[derive(Debug, Serialize, Deserialize)]
struct SequenceState {
    last_id: ProductId,
}

/// Product id generator whose high-water mark survives restarts.
///
/// Ids are strictly increasing for the lifetime of the data directory,
/// including after the product holding the largest id is deleted.
#[derive(Debug)]
pub struct ProductIdSequence {
    last_issued: ProductId,
    next: Option<ProductId>,
}

impl ProductIdSequence {
    /// Resumes after the larger of the persisted high-water mark and the
    /// largest id in `existing`.
    pub fn resume(backend: &dyn SnapshotBackend, existing: &[Product]) -> Result<Self, StoreError> {
        let key = sequence_key(Product::COLLECTION);
        let persisted = match backend.load(&key)? {
            Some(bytes) => {
                serde_json::from_slice::<SequenceState>(&bytes)
                    .map_err(|e| PersistenceError::Corrupted(format!("{key}: {e}")))?
                    .last_id
            }
            None => 0,
        };

        let last = existing.iter().map(|p| p.id).fold(persisted, ProductId::max);
        let next = last
            .checked_add(1)
            .ok_or_else(|| StoreError::Persistence(format!("id space exhausted after {last}")))?;

        Ok(Self {
            last_issued: last,
            next: Some(next),
        })
    }
}

impl IdSequence<ProductId> for ProductIdSequence {
    fn next_id(&mut self) -> Result<ProductId, StoreError> {
        let id = self
            .next
            .ok_or_else(|| StoreError::Persistence("id space exhausted".to_string()))?;
        self.last_issued = id;
        self.next = id.checked_add(1);
        Ok(id)
    }

    fn checkpoint(&self) -> PersistenceResult<Option<Vec<u8>>> {
        let state = SequenceState {
            last_id: self.last_issued,
        };
        Ok(Some(serde_json::to_vec(&state)?))
    }
}
