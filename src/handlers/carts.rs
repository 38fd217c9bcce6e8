use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::errors::ServiceError;
use crate::handlers::common::{success_response, validate_input};
use crate::AppState;

/// Cart endpoints. Every route acts on the authenticated user's own cart.
pub fn cart_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_cart))
        .route("/total", get(get_totals))
        .route("/add", post(add_item))
        .route("/update", patch(update_item))
        .route("/remove/:product_id", delete(remove_item))
        .route("/clear", delete(clear_cart))
        .route("/convert-to-order", post(convert_to_order))
}

async fn get_cart(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.carts.get_detail(user.user_id).await?;
    Ok(success_response(detail))
}

async fn get_totals(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let totals = state.services.carts.totals(user.user_id).await?;
    Ok(success_response(totals))
}

async fn add_item(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let detail = state
        .services
        .carts
        .add_item(
            user.user_id,
            payload.product_id,
            payload.quantity,
            payload.variant,
        )
        .await?;
    Ok(success_response(detail))
}

async fn update_item(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let detail = state
        .services
        .carts
        .update_item(
            user.user_id,
            payload.product_id,
            payload.quantity,
            payload.variant,
        )
        .await?;
    Ok(success_response(detail))
}

async fn remove_item(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
    payload: Option<Json<RemoveItemRequest>>,
) -> Result<impl IntoResponse, ServiceError> {
    let variant = payload.and_then(|Json(p)| p.variant);
    let detail = state
        .services
        .carts
        .remove_item(user.user_id, product_id, variant)
        .await?;
    Ok(success_response(detail))
}

async fn clear_cart(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.carts.clear(user.user_id).await?;
    Ok(success_response(detail))
}

/// Flips the cart to converted. Order creation stays a separate call;
/// the client posts to /orders with the cart contents afterwards.
async fn convert_to_order(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.carts.convert_to_order(user.user_id).await?;
    Ok(success_response(cart))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub variant: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub variant: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub variant: Option<String>,
}
