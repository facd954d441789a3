use std::collections::HashSet;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};

use crate::error::{StoreError, ValidationError};
use crate::notifier::{ChangeNotifier, Snapshot, SubscriberId};
use crate::persistence::{decode_snapshot, encode_snapshot, PersistenceResult, SnapshotBackend};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that any record must implement to be managed by [`ResourceActor`].
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreatePayload: Send + Debug;
    type Patch: Send + Debug;

    /// Name of the persisted snapshot holding this collection.
    const COLLECTION: &'static str;

    fn id(&self) -> &Self::Id;

    /// Construct the full record from the assigned id and the payload.
    fn from_create(id: Self::Id, payload: Self::CreatePayload) -> Result<Self, ValidationError>;

    fn on_update(&mut self, patch: Self::Patch) -> Result<(), ValidationError>;
}

/// Source of ids for newly created records.
///
/// A durable sequence returns its state from [`checkpoint`](IdSequence::checkpoint);
/// the actor writes it under [`sequence_key`] before the snapshot that
/// contains the new record, so a restart never hands out an issued id again.
pub trait IdSequence<Id>: Send + Sync + 'static {
    fn next_id(&mut self) -> Result<Id, StoreError>;

    fn checkpoint(&self) -> PersistenceResult<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// Plain generators keep their state in memory only.
impl<Id, F> IdSequence<Id> for F
where
    F: FnMut() -> Id + Send + Sync + 'static,
{
    fn next_id(&mut self) -> Result<Id, StoreError> {
        Ok(self())
    }
}

/// Backend key holding the id sequence of `collection`.
pub fn sequence_key(collection: &str) -> String {
    format!("{collection}_sequence")
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

#[derive(Debug)]
pub enum ResourceRequest<T: Entity> {
    Create {
        payload: T::CreatePayload,
        respond_to: Response<T>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Subscribe {
        sink: mpsc::Sender<Snapshot<T>>,
        respond_to: Response<SubscriberId>,
    },
    Unsubscribe {
        id: SubscriberId,
        respond_to: Response<bool>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

/// Owns one persisted collection and applies mutations one at a time.
///
/// Each mutation runs its full cycle (apply to a copy, persist, publish,
/// broadcast) before the next request is taken from the mailbox. The
/// in-memory records are replaced only after the snapshot write succeeds.
pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    records: Snapshot<T>,
    backend: Arc<dyn SnapshotBackend>,
    published: watch::Sender<Snapshot<T>>,
    notifier: ChangeNotifier<T>,
    ids: Box<dyn IdSequence<T::Id>>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        records: Vec<T>,
        backend: Arc<dyn SnapshotBackend>,
        ids: impl IdSequence<T::Id>,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let records = Arc::new(records);
        let (published, snapshot) = watch::channel(Arc::clone(&records));
        let actor = Self {
            receiver,
            records,
            backend,
            published,
            notifier: ChangeNotifier::new(),
            ids: Box::new(ids),
        };
        let client = ResourceClient::new(sender, snapshot);
        (actor, client)
    }

    #[instrument(name = "resource_actor", skip(self), fields(collection = T::COLLECTION))]
    pub async fn run(mut self) {
        info!(records = self.records.len(), "Resource actor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { payload, respond_to } => {
                    let result = self.handle_create(payload).await;
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let result = self.handle_update(id, patch).await;
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let result = self.handle_delete(id).await;
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Subscribe { sink, respond_to } => {
                    let id = self.notifier.subscribe(sink, &self.records);
                    let _ = respond_to.send(Ok(id));
                }
                ResourceRequest::Unsubscribe { id, respond_to } => {
                    let removed = self.notifier.unsubscribe(&id);
                    let _ = respond_to.send(Ok(removed));
                }
            }
        }
        info!("Resource actor stopped");
    }

    async fn handle_create(&mut self, payload: T::CreatePayload) -> Result<T, StoreError> {
        let id = self.ids.next_id()?;
        let item = T::from_create(id, payload)?;

        let mut next = self.records.as_ref().clone();
        next.push(item.clone());
        let sequence = self.ids.checkpoint()?;
        self.commit(next, sequence).await?;

        info!(id = %item.id(), "Record created");
        Ok(item)
    }

    async fn handle_update(&mut self, id: T::Id, patch: T::Patch) -> Result<T, StoreError> {
        let Some(position) = self.position(&id) else {
            debug!(%id, "Update of unknown record");
            return Err(StoreError::NotFound(id.to_string()));
        };

        let mut item = self.records[position].clone();
        item.on_update(patch)?;

        let mut next = self.records.as_ref().clone();
        next[position] = item.clone();
        self.commit(next, None).await?;

        info!(%id, "Record updated");
        Ok(item)
    }

    async fn handle_delete(&mut self, id: T::Id) -> Result<Option<T>, StoreError> {
        let Some(position) = self.position(&id) else {
            debug!(%id, "Delete of unknown record ignored");
            return Ok(None);
        };

        let mut next = self.records.as_ref().clone();
        let removed = next.remove(position);
        self.commit(next, None).await?;

        info!(%id, "Record deleted");
        Ok(Some(removed))
    }

    fn position(&self, id: &T::Id) -> Option<usize> {
        self.records.iter().position(|item| item.id() == id)
    }

    /// Persists `next`, then makes it the committed state and broadcasts it.
    ///
    /// A `sequence` checkpoint is written first: if the snapshot write then
    /// fails, the issued id is skipped rather than reused.
    async fn commit(&mut self, next: Vec<T>, sequence: Option<Vec<u8>>) -> Result<(), StoreError> {
        let bytes = encode_snapshot(&next)?;
        let backend = Arc::clone(&self.backend);

        let written = tokio::task::spawn_blocking(move || {
            if let Some(sequence) = sequence {
                backend.store(&sequence_key(T::COLLECTION), &sequence)?;
            }
            backend.store(T::COLLECTION, &bytes)
        })
        .await
        .map_err(|e| StoreError::Persistence(format!("snapshot writer failed: {e}")))?;
        if let Err(e) = written {
            warn!(error = %e, "Snapshot write failed, mutation discarded");
            return Err(e.into());
        }

        let snapshot = Arc::new(next);
        self.records = Arc::clone(&snapshot);
        self.published.send_replace(Arc::clone(&snapshot));
        let delivered = self.notifier.broadcast(&snapshot);
        debug!(records = snapshot.len(), delivered, "Snapshot committed");
        Ok(())
    }
}

/// Reads the persisted collection for `T`, rejecting duplicate ids.
pub fn load_records<T: Entity>(backend: &dyn SnapshotBackend) -> Result<Vec<T>, StoreError> {
    let records: Vec<T> = decode_snapshot(backend, T::COLLECTION)?;

    let mut seen = HashSet::with_capacity(records.len());
    for record in &records {
        if !seen.insert(record.id().clone()) {
            return Err(StoreError::Persistence(format!(
                "duplicate id {} in {} snapshot",
                record.id(),
                T::COLLECTION
            )));
        }
    }
    Ok(records)
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

/// Handle to a [`ResourceActor`].
///
/// Mutations and subscriptions go through the actor's mailbox. Reads are
/// answered from the last committed snapshot without queueing.
#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
    snapshot: watch::Receiver<Snapshot<T>>,
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>, snapshot: watch::Receiver<Snapshot<T>>) -> Self {
        Self { sender, snapshot }
    }

    pub fn list(&self) -> Snapshot<T> {
        Arc::clone(&self.snapshot.borrow())
    }

    pub fn get(&self, id: &T::Id) -> Option<T> {
        self.snapshot.borrow().iter().find(|item| item.id() == id).cloned()
    }

    pub async fn create(&self, payload: T::CreatePayload) -> Result<T, StoreError> {
        self.request(|respond_to| ResourceRequest::Create { payload, respond_to })
            .await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, StoreError> {
        self.request(|respond_to| ResourceRequest::Update { id, patch, respond_to })
            .await
    }

    /// Returns the removed record, or `None` if no record had that id.
    pub async fn delete(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to })
            .await
    }

    pub async fn subscribe(&self, sink: mpsc::Sender<Snapshot<T>>) -> Result<SubscriberId, StoreError> {
        self.request(|respond_to| ResourceRequest::Subscribe { sink, respond_to })
            .await
    }

    pub async fn unsubscribe(&self, id: SubscriberId) -> Result<bool, StoreError> {
        self.request(|respond_to| ResourceRequest::Unsubscribe { id, respond_to })
            .await
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::ActorCommunication("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| StoreError::ActorCommunication("Actor dropped".to_string()))?
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================
