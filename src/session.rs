//! Session lookup consumed by the cart allocator.
//!
//! Identifying the caller is the job of the surrounding web layer; the core
//! only needs an opaque session id and a place to remember which cart belongs
//! to it.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::CartId;

/// Opaque identifier of a client session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh session id for a client that did not present one.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session store keeping the "current cart" of each session.
pub trait SessionStore: Send + Sync {
    fn assign_cart(&self, session: &SessionId, cart: CartId);

    fn current_cart(&self, session: &SessionId) -> Option<CartId>;
}

/// Process-local session store. Associations are lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySessions {
    carts: RwLock<HashMap<SessionId, CartId>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessions {
    fn assign_cart(&self, session: &SessionId, cart: CartId) {
        self.carts.write().insert(session.clone(), cart);
    }

    fn current_cart(&self, session: &SessionId) -> Option<CartId> {
        self.carts.read().get(session).copied()
    }
}
