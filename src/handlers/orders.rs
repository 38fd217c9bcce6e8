use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AdminUser, AuthenticatedUser};
use crate::entities::order::PaymentMethod;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, no_content_response, success_response, validate_input};
use crate::services::orders::{NewOrder, NewOrderItem, ShippingAddress};
use crate::AppState;

/// Order endpoints for the authenticated customer.
pub fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_order))
        .route("/my-orders", get(my_orders))
        .route(
            "/:id",
            get(get_order).patch(update_order).delete(delete_order),
        )
}

/// Admin order endpoints.
pub fn admin_order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_all))
        .route("/stats", get(stats))
        .route("/revenue", get(revenue))
        .route("/:id/status", patch(update_status))
}

async fn create_order(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let items = payload
        .items
        .into_iter()
        .map(|item| NewOrderItem {
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
            variant: item.variant,
        })
        .collect();

    let input = NewOrder {
        items,
        shipping_address: payload.shipping_address,
        payment_method: payload.payment_method,
        total_price: payload.total_price,
        discount_ids: payload.discount_ids.unwrap_or_default(),
    };

    let detail = state.services.orders.create(user.user_id, input).await?;

    // Usage counters are bumped only after the order commits. A failed
    // increment does not fail the order.
    for discount_id in detail.order.discount_ids_list() {
        if let Err(err) = state.services.discounts.increment_usage(discount_id).await {
            tracing::warn!(%discount_id, "failed to record discount usage: {}", err);
        }
    }

    Ok(created_response(detail))
}

async fn my_orders(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.orders.find_by_user(user.user_id).await?;
    Ok(success_response(orders))
}

async fn get_order(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.orders.find_by_id(id).await?;
    if detail.order.user_id != user.user_id && !user.is_admin() {
        return Err(ServiceError::Forbidden(
            "You can only view your own orders".to_string(),
        ));
    }
    Ok(success_response(detail))
}

async fn update_order(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let existing = state.services.orders.find_by_id(id).await?;
    if existing.order.user_id != user.user_id && !user.is_admin() {
        return Err(ServiceError::Forbidden(
            "You can only update your own orders".to_string(),
        ));
    }

    let order = state
        .services
        .orders
        .update(id, payload.shipping_address, payload.payment_method)
        .await?;
    Ok(success_response(order))
}

async fn delete_order(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let existing = state.services.orders.find_by_id(id).await?;
    if existing.order.user_id != user.user_id && !user.is_admin() {
        return Err(ServiceError::Forbidden(
            "You can only delete your own orders".to_string(),
        ));
    }

    state.services.orders.delete(id).await?;
    Ok(no_content_response())
}

async fn list_all(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let orders = state.services.orders.find_all().await?;
    Ok(success_response(orders))
}

async fn update_status(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state
        .services
        .orders
        .update_status(id, &payload.status)
        .await?;
    Ok(success_response(order))
}

async fn stats(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let stats = state.services.orders.order_stats().await?;
    Ok(success_response(stats))
}

async fn revenue(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let stats = state.services.orders.revenue_stats().await?;
    Ok(success_response(stats))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub price: Decimal,
    pub variant: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate]
    pub items: Vec<OrderItemRequest>,
    #[validate]
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub total_price: Decimal,
    pub discount_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}
