use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, patch},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminUser;
use crate::entities::product::ProductStatus;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, no_content_response, success_response, validate_input,
};
use crate::services::products::{
    NewProduct, NewProductVariant, ProductQuery, ProductUpdate,
};
use crate::AppState;

/// Public product endpoints.
pub fn product_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_products))
        .route("/category/:category_id", get(products_by_category))
        .route("/:id", get(get_product))
}

/// Admin product endpoints.
pub fn admin_product_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/:id/stock", patch(update_stock))
}

async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state.services.products.find_all(query).await?;
    Ok(success_response(page))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.products.find_by_id(id).await?;
    Ok(success_response(detail))
}

async fn products_by_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.services.products.find_by_category(category_id).await?;
    Ok(success_response(products))
}

async fn create_product(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let variants = payload
        .variants
        .unwrap_or_default()
        .into_iter()
        .map(|v| NewProductVariant {
            name: v.name,
            value: v.value,
            price_adjustment: v.price_adjustment.unwrap_or(Decimal::ZERO),
            stock: v.stock.unwrap_or(0),
        })
        .collect();

    let input = NewProduct {
        name: payload.name,
        description: payload.description,
        category_id: payload.category_id,
        sub_category_id: payload.sub_category_id,
        price: payload.price,
        stock: payload.stock.unwrap_or(0),
        thumbnail: payload.thumbnail,
        images: payload.images.unwrap_or_default(),
        status: payload.status.unwrap_or(ProductStatus::Available),
        variants,
    };

    let detail = state.services.products.create(input).await?;
    Ok(created_response(detail))
}

async fn update_product(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let update = ProductUpdate {
        name: payload.name,
        description: payload.description.map(Some),
        category_id: payload.category_id,
        sub_category_id: payload.sub_category_id.map(Some),
        price: payload.price,
        stock: payload.stock,
        thumbnail: payload.thumbnail.map(Some),
        images: payload.images,
        status: payload.status,
    };

    let product = state.services.products.update(id, update).await?;
    Ok(success_response(product))
}

async fn delete_product(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.products.delete(id).await?;
    Ok(no_content_response())
}

async fn update_stock(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    let detail = state
        .services
        .products
        .update_stock(id, &payload.variant_name, payload.quantity)
        .await?;
    Ok(success_response(detail))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct ProductVariantRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub value: String,
    pub price_adjustment: Option<Decimal>,
    pub stock: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub sub_category_id: Option<Uuid>,
    pub price: Decimal,
    pub stock: Option<i32>,
    pub thumbnail: Option<String>,
    pub images: Option<Vec<String>>,
    pub status: Option<ProductStatus>,
    #[validate]
    pub variants: Option<Vec<ProductVariantRequest>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub sub_category_id: Option<Uuid>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub thumbnail: Option<String>,
    pub images: Option<Vec<String>>,
    pub status: Option<ProductStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStockRequest {
    #[validate(length(min = 1))]
    pub variant_name: String,
    #[validate(range(min = 0))]
    pub quantity: i32,
}
