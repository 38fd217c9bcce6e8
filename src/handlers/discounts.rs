use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AdminUser, AuthenticatedUser};
use crate::entities::discount::{DiscountKind, DiscountStatus};
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, message_response, no_content_response, success_response, validate_input,
};
use crate::services::discounts::{DiscountUpdate, NewDiscount};
use crate::AppState;

/// Public discount endpoints.
pub fn discount_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_active))
        .route("/apply", post(apply_discount))
        .route("/:id", get(get_discount))
}

/// Admin discount endpoints.
pub fn admin_discount_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_all).post(create_discount))
        .route("/stats", get(stats))
        .route("/update-status", post(update_status_sweep))
        .route(
            "/:id",
            get(get_discount).patch(update_discount).delete(delete_discount),
        )
}

async fn list_active(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let discounts = state.services.discounts.find_active().await?;
    Ok(success_response(discounts))
}

async fn list_all(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let discounts = state.services.discounts.find_all().await?;
    Ok(success_response(discounts))
}

async fn get_discount(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let discount = state.services.discounts.find_by_id(id).await?;
    Ok(success_response(discount))
}

async fn create_discount(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDiscountRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let input = NewDiscount {
        name: payload.name,
        description: payload.description,
        code: payload.code,
        kind: payload.kind,
        amount: payload.amount.unwrap_or(Decimal::ZERO),
        percentage: payload.percentage.unwrap_or(Decimal::ZERO),
        min_order_value: payload.min_order_value.unwrap_or(Decimal::ZERO),
        max_discount_amount: payload.max_discount_amount.unwrap_or(Decimal::ZERO),
        usage_limit: payload.usage_limit.unwrap_or(0),
        start_date: payload.start_date,
        end_date: payload.end_date,
        status: payload.status.unwrap_or(DiscountStatus::Active),
    };

    let discount = state.services.discounts.create(input).await?;
    Ok(created_response(discount))
}

async fn update_discount(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDiscountRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let update = DiscountUpdate {
        name: payload.name,
        description: payload.description.map(Some),
        code: payload.code,
        kind: payload.kind,
        amount: payload.amount,
        percentage: payload.percentage,
        min_order_value: payload.min_order_value,
        max_discount_amount: payload.max_discount_amount,
        usage_limit: payload.usage_limit,
        start_date: payload.start_date,
        end_date: payload.end_date,
        status: payload.status,
    };

    let discount = state.services.discounts.update(id, update).await?;
    Ok(success_response(discount))
}

async fn delete_discount(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.discounts.delete(id).await?;
    Ok(no_content_response())
}

async fn apply_discount(
    _user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ApplyDiscountRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let applied = state
        .services
        .discounts
        .apply_discount(&payload.code, payload.order_value)
        .await?;
    Ok(success_response(applied))
}

async fn update_status_sweep(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let expired = state.services.discounts.update_discount_status().await?;
    Ok(message_response(
        serde_json::json!({ "expired": expired }),
        "Discount statuses updated",
    ))
}

async fn stats(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let stats = state.services.discounts.stats().await?;
    Ok(success_response(stats))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDiscountRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub code: String,
    pub kind: DiscountKind,
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
    pub min_order_value: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    #[validate(range(min = 0))]
    pub usage_limit: Option<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: Option<DiscountStatus>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateDiscountRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub kind: Option<DiscountKind>,
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
    pub min_order_value: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<DiscountStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyDiscountRequest {
    #[validate(length(min = 1))]
    pub code: String,
    pub order_value: Decimal,
}
