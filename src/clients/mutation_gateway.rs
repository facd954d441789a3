use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::domain::{Product, ProductFields, ProductId};
use crate::error::StoreError;
use crate::notifier::{Snapshot, SubscriberId};

/// A catalog mutation received from a live connection.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationIntent {
    Create(ProductFields),
    Delete(ProductId),
}

/// Single entry point for catalog mutations.
///
/// The synchronous operations return a result to the caller. [`submit`]
/// serves live connections, which have no reply channel: its outcome is only
/// visible through the next broadcast, and failures are logged and dropped.
/// Both paths validate with [`ProductFields::validate`] before the store is
/// touched.
///
/// [`submit`]: MutationGateway::submit
#[derive(Clone)]
pub struct MutationGateway {
    products: ResourceClient<Product>,
}

impl MutationGateway {
    pub fn new(products: ResourceClient<Product>) -> Self {
        Self { products }
    }

    pub fn catalog(&self) -> Snapshot<Product> {
        self.products.list()
    }

    pub fn product(&self, id: ProductId) -> Option<Product> {
        self.products.get(&id)
    }

    #[instrument(skip(self, fields), fields(title = ?fields.title))]
    pub async fn create_product(&self, fields: ProductFields) -> Result<Product, StoreError> {
        let draft = fields.validate()?;
        debug!("Sending request");
        let product = self.products.create(draft).await?;
        info!(product_id = product.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(self, fields))]
    pub async fn update_product(&self, id: ProductId, fields: ProductFields) -> Result<Product, StoreError> {
        let draft = fields.validate()?;
        debug!("Sending request");
        self.products.update(id, draft).await
    }

    /// Deleting an id that is not in the catalog succeeds without effect.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        debug!("Sending request");
        self.products.delete(id).await
    }

    /// Applies a mutation from a live connection, fire-and-forget.
    #[instrument(skip(self))]
    pub async fn submit(&self, intent: MutationIntent) {
        let outcome = match intent {
            MutationIntent::Create(fields) => self.create_product(fields).await.map(|_| ()),
            MutationIntent::Delete(id) => self.delete_product(id).await.map(|_| ()),
        };
        if let Err(e) = outcome {
            warn!(error = %e, "Live mutation dropped");
        }
    }

    pub async fn subscribe(&self, sink: mpsc::Sender<Snapshot<Product>>) -> Result<SubscriberId, StoreError> {
        self.products.subscribe(sink).await
    }

    pub async fn unsubscribe(&self, id: SubscriberId) -> Result<bool, StoreError> {
        self.products.unsubscribe(id).await
    }
}
