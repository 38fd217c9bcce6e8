use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AdminUser, AuthenticatedUser};
use crate::entities::sale::{SaleKind, SaleStatus, TargetCustomer};
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, message_response, no_content_response, success_response, validate_input,
};
use crate::services::sales::{NewSale, SaleUpdate};
use crate::AppState;

/// Public sale endpoints.
pub fn sale_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_active))
        .route("/my-sales", get(my_sales))
        .route("/product/:product_id", get(sales_for_product))
        .route("/:id", get(get_sale))
}

/// Admin sale endpoints.
pub fn admin_sale_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_all).post(create_sale))
        .route("/stats", get(stats))
        .route("/update-status", post(update_status_sweep))
        .route("/:id", get(get_sale).patch(update_sale).delete(delete_sale))
}

async fn list_active(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let sales = state.services.sales.find_active().await?;
    Ok(success_response(sales))
}

async fn list_all(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let sales = state.services.sales.find_all().await?;
    Ok(success_response(sales))
}

async fn get_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let sale = state.services.sales.find_by_id(id).await?;
    Ok(success_response(sale))
}

async fn sales_for_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let sales = state.services.sales.sales_for_product(product_id).await?;
    Ok(success_response(sales))
}

async fn my_sales(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let sales = state.services.sales.sales_for_user(user.user_id).await?;
    Ok(success_response(sales))
}

async fn create_sale(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let input = NewSale {
        name: payload.name,
        description: payload.description,
        kind: payload.kind,
        product_ids: payload.product_ids.unwrap_or_default(),
        user_ids: payload.user_ids.unwrap_or_default(),
        target_customer: payload.target_customer.unwrap_or(TargetCustomer::All),
        max_usage: payload.max_usage.unwrap_or(0),
        discount_id: payload.discount_id,
        start_date: payload.start_date,
        end_date: payload.end_date,
        status: payload.status.unwrap_or(SaleStatus::Active),
    };

    let sale = state.services.sales.create(input).await?;
    Ok(created_response(sale))
}

async fn update_sale(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSaleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let update = SaleUpdate {
        name: payload.name,
        description: payload.description.map(Some),
        kind: payload.kind,
        product_ids: payload.product_ids,
        user_ids: payload.user_ids,
        target_customer: payload.target_customer,
        max_usage: payload.max_usage,
        discount_id: payload.discount_id,
        start_date: payload.start_date,
        end_date: payload.end_date,
        status: payload.status,
    };

    let sale = state.services.sales.update(id, update).await?;
    Ok(success_response(sale))
}

async fn delete_sale(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.sales.delete(id).await?;
    Ok(no_content_response())
}

async fn update_status_sweep(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let expired = state.services.sales.update_sale_status().await?;
    Ok(message_response(
        serde_json::json!({ "expired": expired }),
        "Sale statuses updated",
    ))
}

async fn stats(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let stats = state.services.sales.stats().await?;
    Ok(success_response(stats))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSaleRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    pub kind: SaleKind,
    pub product_ids: Option<Vec<Uuid>>,
    pub user_ids: Option<Vec<Uuid>>,
    pub target_customer: Option<TargetCustomer>,
    #[validate(range(min = 0))]
    pub max_usage: Option<i32>,
    pub discount_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: Option<SaleStatus>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateSaleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<SaleKind>,
    pub product_ids: Option<Vec<Uuid>>,
    pub user_ids: Option<Vec<Uuid>>,
    pub target_customer: Option<TargetCustomer>,
    pub max_usage: Option<i32>,
    pub discount_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<SaleStatus>,
}
