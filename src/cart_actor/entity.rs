use std::convert::Infallible;

use crate::actor_framework::Entity;
use crate::domain::{Cart, CartId};
use crate::error::ValidationError;

impl Entity for Cart {
    type Id = CartId;
    type CreatePayload = ();
    type Patch = Infallible;

    const COLLECTION: &'static str = "carts";

    fn id(&self) -> &CartId {
        &self.id
    }

    /// Carts are always issued empty.
    fn from_create(id: CartId, _payload: ()) -> Result<Self, ValidationError> {
        Ok(Cart::new(id))
    }

    fn on_update(&mut self, patch: Infallible) -> Result<(), ValidationError> {
        match patch {}
    }
}
