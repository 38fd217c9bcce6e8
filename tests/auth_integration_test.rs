mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{body_json, expect_data, TestApp};

#[tokio::test]
async fn register_issues_token_and_hides_password_hash() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "New User",
                "email": "new@example.com",
                "password": "password123"
            })),
            None,
        )
        .await;
    let data = expect_data(response, StatusCode::CREATED).await;

    assert_eq!(data["user"]["email"], "new@example.com");
    assert_eq!(data["user"]["role"], "user");
    assert!(data["user"].get("password_hash").is_none());
    assert_eq!(data["token"]["token_type"], "Bearer");
    assert!(!data["token"]["access_token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = TestApp::new().await;
    let payload = json!({
        "name": "New User",
        "email": "dup@example.com",
        "password": "password123"
    });

    app.request(Method::POST, "/api/v1/auth/register", Some(payload.clone()), None)
        .await;
    let response = app
        .request(Method::POST, "/api/v1/auth/register", Some(payload), None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn weak_password_and_bad_email_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "New User",
                "email": "not-an-email",
                "password": "password123"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "New User",
                "email": "short@example.com",
                "password": "short"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_round_trip() {
    let app = TestApp::new().await;
    app.request(
        Method::POST,
        "/api/v1/auth/register",
        Some(json!({
            "name": "Login User",
            "email": "login@example.com",
            "password": "password123"
        })),
        None,
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "login@example.com", "password": "password123" })),
            None,
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    let token = data["token"]["access_token"].as_str().unwrap().to_string();

    let response = app
        .request(Method::GET, "/api/v1/auth/me", None, Some(&token))
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["email"], "login@example.com");
    assert_eq!(data["role"], "user");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.request(
        Method::POST,
        "/api/v1/auth/register",
        Some(json!({
            "name": "Login User",
            "email": "login2@example.com",
            "password": "password123"
        })),
        None,
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "login2@example.com", "password": "wrong-password" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown email yields the same response as a wrong password.
    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "ghost@example.com", "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api/v1/auth/me", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_and_health_are_public() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/status", None, None).await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["status"], "ok");
    assert_eq!(data["service"], "storefront-api");

    let response = app.request(Method::GET, "/api/v1/health", None, None).await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["checks"]["database"], "healthy");
}

#[tokio::test]
async fn error_body_carries_standard_shape() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}", uuid::Uuid::new_v4()),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Not Found");
    assert!(body["message"].as_str().unwrap().contains("not found"));
    assert!(body.get("timestamp").is_some());
}
