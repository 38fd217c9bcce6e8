use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminUser;
use crate::entities::category::CategoryStatus;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, no_content_response, success_response, validate_input,
};
use crate::services::categories::{CategoryUpdate, NewCategory};
use crate::AppState;

/// Public category endpoints (active categories only).
pub fn category_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_active))
        .route("/:id", get(get_category))
}

/// Admin category endpoints.
pub fn admin_category_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_all).post(create_category))
        .route(
            "/:id",
            get(get_category).patch(update_category).delete(delete_category),
        )
}

async fn list_active(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.categories.find_active().await?;
    Ok(success_response(categories))
}

async fn list_all(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.services.categories.find_all().await?;
    Ok(success_response(categories))
}

async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state.services.categories.find_by_id(id).await?;
    Ok(success_response(category))
}

async fn create_category(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let input = NewCategory {
        name: payload.name,
        description: payload.description,
        image: payload.image,
        status: payload.status.unwrap_or(CategoryStatus::Active),
    };

    let category = state.services.categories.create(input).await?;
    Ok(created_response(category))
}

async fn update_category(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let update = CategoryUpdate {
        name: payload.name,
        description: payload.description.map(Some),
        image: payload.image.map(Some),
        status: payload.status,
    };

    let category = state.services.categories.update(id, update).await?;
    Ok(success_response(category))
}

async fn delete_category(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.categories.delete(id).await?;
    Ok(no_content_response())
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: Option<CategoryStatus>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: Option<CategoryStatus>,
}
