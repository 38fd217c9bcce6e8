use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AdminUser, AuthenticatedUser};
use crate::entities::review::ReviewStatus;
use crate::errors::ServiceError;
use crate::handlers::common::{
    created_response, no_content_response, success_response, validate_input,
};
use crate::services::reviews::NewReview;
use crate::AppState;

/// Public and customer review endpoints.
pub fn review_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_review))
        .route("/my-reviews", get(my_reviews))
        .route("/product/:product_id", get(reviews_for_product))
        .route("/product/:product_id/rating", get(product_rating))
        .route("/:id", get(get_review).patch(update_review))
}

/// Admin review endpoints (moderation).
pub fn admin_review_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_all))
        .route("/:id", get(get_review).delete(delete_review))
        .route("/:id/approve", post(approve_review))
        .route("/:id/reject", post(reject_review))
}

async fn create_review(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let input = NewReview {
        product_id: payload.product_id,
        rating: payload.rating,
        comment: payload.comment,
    };

    let review = state.services.reviews.create(user.user_id, input).await?;
    Ok(created_response(review))
}

async fn reviews_for_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let reviews = state.services.reviews.find_by_product(product_id).await?;
    Ok(success_response(reviews))
}

async fn product_rating(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let rating = state.services.reviews.product_rating(product_id).await?;
    Ok(success_response(rating))
}

async fn my_reviews(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let reviews = state.services.reviews.find_by_user(user.user_id).await?;
    Ok(success_response(reviews))
}

async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state.services.reviews.find_by_id(id).await?;
    Ok(success_response(review))
}

async fn update_review(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state
        .services
        .reviews
        .update(id, user.user_id, payload.rating, payload.comment.map(Some))
        .await?;
    Ok(success_response(review))
}

async fn list_all(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let reviews = state.services.reviews.find_all().await?;
    Ok(success_response(reviews))
}

async fn delete_review(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.reviews.delete(id).await?;
    Ok(no_content_response())
}

async fn approve_review(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state
        .services
        .reviews
        .moderate(id, ReviewStatus::Approved)
        .await?;
    Ok(success_response(review))
}

async fn reject_review(
    _admin: AdminUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let review = state
        .services
        .reviews
        .moderate(id, ReviewStatus::Rejected)
        .await?;
    Ok(success_response(review))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}
