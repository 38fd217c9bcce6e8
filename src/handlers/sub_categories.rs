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
use crate::services::sub_categories::{NewSubCategory, SubCategoryUpdate};
use crate::AppState;

/// Public sub-category endpoints (active only).
pub fn sub_category_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_active))
        .route("/category/:category_id", get(list_by_category))
        .route("/:id", get(get_sub_category))
}

/// Admin sub-category endpoints.
pub fn admin_sub_category_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_all).post(create_sub_category))
        .route(
            "/:id",
            get(get_sub_category)
                .patch(update_sub_category)
                .delete(delete_sub_category),
        )
}

async fn list_active(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let sub_categories = state.services.sub_categories.find_active().await?;
    Ok(success_response(sub_categories))
}

async fn list_all(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let sub_categories = state.services.sub_categories.find_all().await?;
    Ok(success_response(sub_categories))
}

async fn list_by_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let sub_categories = state
        .services
        .sub_categories
        .find_by_category(category_id)
        .await?;
    Ok(success_response(sub_categories))
}

async fn get_sub_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let sub_category = state.services.sub_categories.find_by_id(id).await?;
    Ok(success_response(sub_category))
}

async fn create_sub_category(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSubCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let input = NewSubCategory {
        category_id: payload.category_id,
        name: payload.name,
        description: payload.description,
        image: payload.image,
        status: payload.status.unwrap_or(CategoryStatus::Active),
    };

    let sub_category = state.services.sub_categories.create(input).await?;
    Ok(created_response(sub_category))
}

async fn update_sub_category(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSubCategoryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let update = SubCategoryUpdate {
        category_id: payload.category_id,
        name: payload.name,
        description: payload.description.map(Some),
        image: payload.image.map(Some),
        status: payload.status,
    };

    let sub_category = state.services.sub_categories.update(id, update).await?;
    Ok(success_response(sub_category))
}

async fn delete_sub_category(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.sub_categories.delete(id).await?;
    Ok(no_content_response())
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubCategoryRequest {
    pub category_id: Uuid,
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: Option<CategoryStatus>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateSubCategoryRequest {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub status: Option<CategoryStatus>,
}
