use crate::actor_framework::Entity;
use crate::domain::{Product, ProductDraft, ProductId};
use crate::error::ValidationError;

impl Entity for Product {
    type Id = ProductId;
    type CreatePayload = ProductDraft;
    type Patch = ProductDraft;

    const COLLECTION: &'static str = "products";

    fn id(&self) -> &ProductId {
        &self.id
    }

    /// Drafts are validated before they reach the store.
    fn from_create(id: ProductId, draft: ProductDraft) -> Result<Self, ValidationError> {
        Ok(Product::from_draft(id, draft))
    }

    /// Replaces every field but the id; the record keeps its position.
    fn on_update(&mut self, draft: ProductDraft) -> Result<(), ValidationError> {
        self.apply(draft);
        Ok(())
    }
}
