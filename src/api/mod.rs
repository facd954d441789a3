//! HTTP and websocket adapters using axum.
//!
//! Routes:
//! - GET /health - Health check
//! - GET /api/products - Current catalog
//! - GET /api/products/{id} - One product
//! - POST /api/products - Create a product
//! - PUT /api/products/{id} - Replace a product's fields
//! - DELETE /api/products/{id} - Delete a product
//! - POST /api/carts - Create a cart for the caller's session
//! - GET /api/carts/current - The session's current cart
//! - POST /api/productos, POST /api/productos/eliminar - Legacy create/delete
//! - GET /ws - Live catalog feed

mod http;
mod live;
pub mod protocol;

use std::sync::Arc;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::clients::{CartAllocator, MutationGateway};
use crate::error::StoreError;

/// Header carrying the caller's session id.
pub const SESSION_HEADER: &str = "x-session-id";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: MutationGateway,
    pub carts: CartAllocator,
    pub subscriber_buffer: usize,
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::health_handler))
        .route(
            "/api/products",
            get(http::list_products_handler).post(http::create_product_handler),
        )
        .route(
            "/api/products/{id}",
            get(http::get_product_handler)
                .put(http::update_product_handler)
                .delete(http::delete_product_handler),
        )
        .route("/api/carts", post(http::create_cart_handler))
        .route("/api/carts/current", get(http::current_cart_handler))
        .route("/api/productos", post(http::legacy_create_handler))
        .route("/api/productos/eliminar", post(http::legacy_delete_handler))
        .route("/ws", get(live::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal { error: String, details: String },
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(e) => ApiError::BadRequest(e.to_string()),
            StoreError::NotFound(id) => ApiError::NotFound(format!("Product '{id}' not found")),
            StoreError::Persistence(details) => ApiError::Internal {
                error: "Failed to persist catalog".to_string(),
                details,
            },
            StoreError::ActorCommunication(details) => ApiError::Internal {
                error: "Catalog store unavailable".to_string(),
                details,
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ApiError::BadRequest(error) => (StatusCode::BAD_REQUEST, ErrorResponse { error, details: None }),
            ApiError::NotFound(error) => (StatusCode::NOT_FOUND, ErrorResponse { error, details: None }),
            ApiError::Internal { error, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error,
                    details: Some(details),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}
