use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::auth::{AuthError, AuthenticatedUser, TokenResponse};
use crate::entities::user::Model as UserModel;
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response, validate_input};
use crate::AppState;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let user = state
        .auth
        .register(payload.name, payload.email, &payload.password)
        .await
        .map_err(auth_error_to_service)?;
    let token = state
        .auth
        .generate_token(&user)
        .map_err(auth_error_to_service)?;

    Ok(created_response(AuthResponse { user, token }))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let (user, token) = state
        .auth
        .login(&payload.email, &payload.password)
        .await
        .map_err(auth_error_to_service)?;

    Ok(success_response(AuthResponse { user, token }))
}

async fn me(user: AuthenticatedUser) -> impl IntoResponse {
    success_response(MeResponse {
        user_id: user.user_id.to_string(),
        email: user.email,
        role: user.role,
    })
}

fn auth_error_to_service(err: AuthError) -> ServiceError {
    match err {
        AuthError::EmailTaken => ServiceError::Conflict("Email is already registered".to_string()),
        AuthError::InvalidCredentials => {
            ServiceError::Unauthorized("Invalid email or password".to_string())
        }
        AuthError::MissingAuth | AuthError::InvalidToken | AuthError::TokenExpired => {
            ServiceError::Unauthorized("Authentication failed".to_string())
        }
        AuthError::Forbidden => ServiceError::Forbidden("Access denied".to_string()),
        AuthError::TokenCreation(_) | AuthError::InternalError(_) => {
            ServiceError::InternalError("Authentication service error".to_string())
        }
    }
}

// Request and response DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserModel,
    pub token: TokenResponse,
}

#[derive(Debug, Serialize)]
struct MeResponse {
    user_id: String,
    email: String,
    role: String,
}
