use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use storefront_api::{
    auth::{AuthConfig, AuthService, ROLE_ADMIN},
    clock::{self, FixedClock, SharedClock},
    config::AppConfig,
    db::{self, DbConfig},
    entities::{category, product, user},
    events::{self, EventSender},
    handlers::AppServices,
    services::{categories::NewCategory, products::NewProduct},
    AppState,
};

const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Spins up the full application over an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: Arc<AppState>,
    _event_task: tokio::task::JoinHandle<()>,
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiration: 3600,
        host: "127.0.0.1".to_string(),
        port: 18_080,
        environment: "test".to_string(),
        log_level: "warn".to_string(),
        log_json: false,
        auto_migrate: true,
        cors_allowed_origins: None,
        cors_allow_any_origin: false,
        db_max_connections: 1,
        db_min_connections: 1,
        db_connect_timeout_secs: 5,
        db_idle_timeout_secs: 3600,
        event_channel_capacity: 64,
        api_default_page_size: 20,
        api_max_page_size: 100,
        auth_issuer: "storefront-auth".to_string(),
        auth_audience: "storefront-api".to_string(),
    }
}

impl TestApp {
    /// Fresh application state on the wall clock.
    pub async fn new() -> Self {
        Self::with_clock(clock::system_clock()).await
    }

    /// Fresh application state with the clock pinned at `instant`.
    pub async fn at_instant(instant: DateTime<Utc>) -> Self {
        Self::with_clock(Arc::new(FixedClock(instant))).await
    }

    pub async fn with_clock(clock: SharedClock) -> Self {
        let cfg = test_config();

        // A single connection keeps the in-memory database alive and shared.
        let db_cfg = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(3600),
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            access_token_expiration: Duration::from_secs(cfg.jwt_expiration),
        };
        let auth_service = Arc::new(AuthService::new(auth_cfg, db_arc.clone()));

        let services = AppServices::new(db_arc.clone(), event_sender, clock, &cfg);

        let state = Arc::new(AppState {
            db: db_arc,
            config: cfg,
            services,
            auth: auth_service,
        });

        let router = storefront_api::app_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Registers a user through the auth service and returns the model with
    /// a bearer token. Role escalation happens directly against the table.
    pub async fn seed_user(&self, email: &str, role: &str) -> (user::Model, String) {
        let mut user = self
            .state
            .auth
            .register("Test User".to_string(), email.to_string(), "password123")
            .await
            .expect("register test user");

        if role == ROLE_ADMIN {
            let mut active: user::ActiveModel = user.clone().into();
            active.role = Set(ROLE_ADMIN.to_string());
            user = active
                .update(self.state.db.as_ref())
                .await
                .expect("promote test user to admin");
        }

        let token = self
            .state
            .auth
            .generate_token(&user)
            .expect("issue test token");
        (user, token.access_token)
    }

    pub async fn seed_customer(&self) -> (user::Model, String) {
        self.seed_user("customer@example.com", "user").await
    }

    pub async fn seed_admin(&self) -> (user::Model, String) {
        self.seed_user("admin@example.com", ROLE_ADMIN).await
    }

    pub async fn seed_category(&self, name: &str) -> category::Model {
        self.state
            .services
            .categories
            .create(NewCategory {
                name: name.to_string(),
                description: None,
                image: None,
                status: category::CategoryStatus::Active,
            })
            .await
            .expect("seed category")
    }

    pub async fn seed_product(
        &self,
        category_id: Uuid,
        name: &str,
        price: Decimal,
    ) -> product::Model {
        self.state
            .services
            .products
            .create(NewProduct {
                name: name.to_string(),
                description: None,
                category_id,
                sub_category_id: None,
                price,
                stock: 100,
                thumbnail: None,
                images: Vec::new(),
                status: product::ProductStatus::Available,
                variants: Vec::new(),
            })
            .await
            .expect("seed product")
            .product
    }

    /// Sends a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Reads the response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not valid json")
    }
}

/// Asserts status and unwraps the `data` field of the success envelope.
#[allow(dead_code)]
pub async fn expect_data(response: axum::response::Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    let mut body = body_json(response).await;
    assert_eq!(body["success"], true);
    body["data"].take()
}
