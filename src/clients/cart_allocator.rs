use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::Cart;
use crate::error::StoreError;
use crate::session::{SessionId, SessionStore};

/// Issues carts and ties each one to the session that asked for it.
#[derive(Clone)]
pub struct CartAllocator {
    carts: ResourceClient<Cart>,
    sessions: Arc<dyn SessionStore>,
}

impl CartAllocator {
    pub fn new(carts: ResourceClient<Cart>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { carts, sessions }
    }

    /// Persists a fresh empty cart and makes it the session's current cart.
    #[instrument(skip(self, session), fields(session = %session))]
    pub async fn create_cart(&self, session: &SessionId) -> Result<Cart, StoreError> {
        debug!("Sending request");
        let cart = self.carts.create(()).await?;
        self.sessions.assign_cart(session, cart.id);
        info!(cart_id = %cart.id, "Cart created");
        Ok(cart)
    }

    pub fn current_cart(&self, session: &SessionId) -> Option<Cart> {
        let id = self.sessions.current_cart(session)?;
        self.carts.get(&id)
    }
}
