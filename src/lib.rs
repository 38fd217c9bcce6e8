//! Storefront API Library
//!
//! Core functionality for the storefront backend: catalog, carts, orders,
//! discounts, sales and reviews over axum and sea-orm.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use axum::{extract::State, response::Json, routing::get, Extension, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::auth::AuthService;
use crate::handlers::AppServices;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: AppServices,
    pub auth: Arc<AuthService>,
}

/// Standard API result type for JSON responses
pub type ApiResult<T> =
    Result<Json<handlers::common::ApiResponse<T>>, errors::ServiceError>;

/// Versioned API surface. Public storefront routes sit next to their
/// `/admin/*` counterparts; admin routers gate every handler on role.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/admin/products", handlers::products::admin_product_routes())
        .nest("/categories", handlers::categories::category_routes())
        .nest(
            "/admin/categories",
            handlers::categories::admin_category_routes(),
        )
        .nest(
            "/sub-categories",
            handlers::sub_categories::sub_category_routes(),
        )
        .nest(
            "/admin/sub-categories",
            handlers::sub_categories::admin_sub_category_routes(),
        )
        .nest("/carts", handlers::carts::cart_routes())
        .nest("/orders", handlers::orders::order_routes())
        .nest("/admin/orders", handlers::orders::admin_order_routes())
        .nest("/discounts", handlers::discounts::discount_routes())
        .nest(
            "/admin/discounts",
            handlers::discounts::admin_discount_routes(),
        )
        .nest("/sales", handlers::sales::sale_routes())
        .nest("/admin/sales", handlers::sales::admin_sale_routes())
        .nest("/reviews", handlers::reviews::review_routes())
        .nest("/admin/reviews", handlers::reviews::admin_review_routes())
}

/// Builds the full application router over the given state. Shared between
/// the binary entrypoint and the integration test harness.
pub fn app_router(state: Arc<AppState>) -> Router {
    let auth_service = state.auth.clone();

    Router::new()
        .route("/", get(|| async { "storefront-api up" }))
        .nest("/api/v1", api_v1_routes())
        .layer(Extension(auth_service))
        .with_state(state)
}

async fn api_status() -> ApiResult<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "service": "storefront-api",
        "version": version,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(handlers::common::ApiResponse::new(status_data)))
}

async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(handlers::common::ApiResponse::new(health_data)))
}
