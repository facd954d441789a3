//! Fan-out of committed snapshots to live subscribers.
//!
//! The notifier is owned by a [`ResourceActor`](crate::actor_framework::ResourceActor),
//! so subscribing, unsubscribing and broadcasting all happen at the actor's
//! serialization point: a subscriber never observes a snapshot older than the
//! one it was registered with.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Unique subscriber identifier.
pub type SubscriberId = Uuid;

/// A full committed collection, shared between the store and its readers.
pub type Snapshot<T> = Arc<Vec<T>>;

pub struct ChangeNotifier<T> {
    subscribers: HashMap<SubscriberId, mpsc::Sender<Snapshot<T>>>,
}

impl<T> Default for ChangeNotifier<T> {
    fn default() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }
}

impl<T> ChangeNotifier<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sink` and immediately pushes `current` to it.
    ///
    /// A sink whose receiver is already gone is not registered, but still
    /// gets an id so callers can unsubscribe unconditionally.
    pub fn subscribe(&mut self, sink: mpsc::Sender<Snapshot<T>>, current: &Snapshot<T>) -> SubscriberId {
        let id = Uuid::new_v4();
        match sink.try_send(Arc::clone(current)) {
            Ok(()) | Err(TrySendError::Full(_)) => {
                self.subscribers.insert(id, sink);
                debug!(subscriber_id = %id, subscribers = self.subscribers.len(), "Subscriber registered");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(subscriber_id = %id, "Subscriber closed before initial sync");
            }
        }
        id
    }

    /// Returns whether the subscriber was registered.
    pub fn unsubscribe(&mut self, id: &SubscriberId) -> bool {
        let removed = self.subscribers.remove(id).is_some();
        if removed {
            debug!(subscriber_id = %id, subscribers = self.subscribers.len(), "Subscriber removed");
        }
        removed
    }

    /// Pushes `snapshot` to every subscriber without waiting on any of them.
    ///
    /// Closed subscribers are pruned. A subscriber with a full buffer misses
    /// this snapshot and stays registered. Returns the number of deliveries.
    pub fn broadcast(&mut self, snapshot: &Snapshot<T>) -> usize {
        let mut delivered = 0;
        self.subscribers.retain(|id, sink| match sink.try_send(Arc::clone(snapshot)) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(subscriber_id = %id, "Subscriber buffer full, snapshot dropped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(subscriber_id = %id, "Pruning closed subscriber");
                false
            }
        });
        delivered
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
