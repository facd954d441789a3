use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ApiError, AppState, SESSION_HEADER};
use crate::domain::{Cart, CartId, Product, ProductFields, ProductId};
use crate::session::SessionId;

#[derive(Serialize)]
pub(super) struct HealthResponse {
    status: &'static str,
    products: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct CreatedResponse {
    id: ProductId,
}

#[derive(Debug, Serialize)]
pub(super) struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CartCreatedResponse {
    cart_id: CartId,
}

#[derive(Debug, Deserialize)]
pub(super) struct LegacyCreateRequest {
    producto: Option<ProductFields>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LegacyDeleteRequest {
    id: Option<ProductId>,
}

fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(SessionId::new)
}

/// GET /health
pub(super) async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        products: state.gateway.catalog().len(),
    })
}

/// GET /api/products
pub(super) async fn list_products_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Product>> {
    Json(state.gateway.catalog().as_ref().clone())
}

/// GET /api/products/{id}
pub(super) async fn get_product_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Product>, ApiError> {
    let Path(id) = path?;
    state
        .gateway
        .product(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Product '{id}' not found")))
}

/// POST /api/products
pub(super) async fn create_product_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProductFields>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(fields) = payload?;
    let product = state.gateway.create_product(fields).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: product.id })))
}

/// PUT /api/products/{id}
pub(super) async fn update_product_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<ProductId>, PathRejection>,
    payload: Result<Json<ProductFields>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    let Json(fields) = payload?;
    let product = state.gateway.update_product(id, fields).await?;
    Ok(Json(MessageResponse {
        message: format!("Product {} updated", product.id),
    }))
}

/// DELETE /api/products/{id}
pub(super) async fn delete_product_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<ProductId>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    delete_product(&state, id).await
}

async fn delete_product(state: &AppState, id: ProductId) -> Result<Json<MessageResponse>, ApiError> {
    let message = match state.gateway.delete_product(id).await? {
        Some(_) => format!("Product {id} deleted"),
        None => format!("Product {id} was not in the catalog"),
    };
    Ok(Json(MessageResponse { message }))
}

/// POST /api/productos
pub(super) async fn legacy_create_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LegacyCreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(request) = payload?;
    let fields = request
        .producto
        .ok_or_else(|| ApiError::BadRequest("Missing `producto`".to_string()))?;
    let product = state.gateway.create_product(fields).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: product.id })))
}

/// POST /api/productos/eliminar
pub(super) async fn legacy_delete_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LegacyDeleteRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload?;
    let id = request
        .id
        .ok_or_else(|| ApiError::BadRequest("Missing `id`".to_string()))?;
    delete_product(&state, id).await
}

/// POST /api/carts
///
/// Uses the caller's `x-session-id`, or mints one and returns it in the
/// response header.
pub(super) async fn create_cart_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = session_from_headers(&headers).unwrap_or_else(SessionId::generate);
    let cart = state.carts.create_cart(&session).await?;

    let mut response = (StatusCode::CREATED, Json(CartCreatedResponse { cart_id: cart.id })).into_response();
    match HeaderValue::from_str(session.as_str()) {
        Ok(value) => {
            response.headers_mut().insert(SESSION_HEADER, value);
        }
        Err(e) => warn!(error = %e, "Session id is not a valid header value"),
    }
    Ok(response)
}

/// GET /api/carts/current
pub(super) async fn current_cart_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Cart>, ApiError> {
    let session = session_from_headers(&headers)
        .ok_or_else(|| ApiError::NotFound("No session".to_string()))?;
    state
        .carts
        .current_cart(&session)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No cart for session '{session}'")))
}
