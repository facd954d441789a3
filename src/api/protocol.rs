//! Live channel message types.
//!
//! JSON text frames, tagged by `type`. The original event names
//! (`nuevoProducto`, `eliminarProducto`) are accepted as aliases.

use serde::{Deserialize, Serialize};

use crate::clients::MutationIntent;
use crate::domain::{Product, ProductFields, ProductId};

// ============================================================================
// Client → Server Messages
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Add a product; fields are flattened next to `type`.
    #[serde(alias = "nuevoProducto")]
    AddProduct(ProductFields),
    #[serde(alias = "eliminarProducto")]
    DeleteProduct { id: ProductId },
}

impl From<ClientMessage> for MutationIntent {
    fn from(msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::AddProduct(fields) => MutationIntent::Create(fields),
            ClientMessage::DeleteProduct { id } => MutationIntent::Delete(id),
        }
    }
}

// ============================================================================
// Server → Client Messages
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage<'a> {
    /// The full current catalog.
    Products { products: &'a [Product] },
}
