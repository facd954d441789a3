use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};
use uuid::Uuid;

use crate::actor_framework::{load_records, ResourceActor};
use crate::api::AppState;
use crate::clients::{CartAllocator, MutationGateway};
use crate::config::ServerConfig;
use crate::domain::{Cart, Product};
use crate::error::StoreError;
use crate::persistence::SnapshotBackend;
use crate::product_actor::ProductIdSequence;
use crate::session::{InMemorySessions, SessionStore};

/// The running service core: catalog and cart stores plus their clients.
///
/// Responsible for loading the persisted snapshots, starting the store
/// actors, wiring the gateway and cart allocator, and handling shutdown.
pub struct CatalogSystem {
    pub gateway: MutationGateway,
    pub carts: CartAllocator,
    handles: Vec<JoinHandle<()>>,
}

impl CatalogSystem {
    /// Loads both collections from `backend` and starts their actors.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &ServerConfig, backend: Arc<dyn SnapshotBackend>) -> Result<Self, StoreError> {
        // 1. Catalog store
        let products: Vec<Product> = load_records(backend.as_ref())?;
        info!(products = products.len(), "Catalog loaded");
        let product_ids = ProductIdSequence::resume(backend.as_ref(), &products)?;
        let (product_actor, product_client) =
            ResourceActor::new(config.mailbox_size, products, Arc::clone(&backend), product_ids);
        let product_handle = tokio::spawn(product_actor.run());

        // 2. Cart store
        let carts: Vec<Cart> = load_records(backend.as_ref())?;
        info!(carts = carts.len(), "Carts loaded");
        let (cart_actor, cart_client) = ResourceActor::new(config.mailbox_size, carts, backend, Uuid::new_v4);
        let cart_handle = tokio::spawn(cart_actor.run());

        // 3. Clients
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessions::new());

        Ok(Self {
            gateway: MutationGateway::new(product_client),
            carts: CartAllocator::new(cart_client, sessions),
            handles: vec![product_handle, cart_handle],
        })
    }

    pub fn app_state(&self, config: &ServerConfig) -> AppState {
        AppState {
            gateway: self.gateway.clone(),
            carts: self.carts.clone(),
            subscriber_buffer: config.subscriber_buffer,
        }
    }

    /// Drops this system's clients and waits for the actors to drain.
    ///
    /// Actors stop once every clone of their client is gone, so any
    /// [`AppState`] handed out must be dropped first.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        info!("Shutting down catalog system...");
        drop(self.gateway);
        drop(self.carts);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(e);
            }
        }

        info!("Catalog system shutdown complete.");
        Ok(())
    }
}
