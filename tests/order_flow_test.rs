mod common;

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use common::{body_json, expect_data, TestApp};

fn as_decimal(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .expect("decimal serialized as string")
        .parse()
        .expect("parse decimal")
}

fn shipping_address() -> serde_json::Value {
    json!({
        "name": "Jane Doe",
        "phone": "0123456789",
        "address": "1 Main St",
        "city": "Springfield",
        "district": "Central",
        "ward": "4"
    })
}

async fn place_order(app: &TestApp, token: &str, total: &str) -> serde_json::Value {
    let category = app.seed_category("Gadgets").await;
    let product = app
        .seed_product(category.id, "Widget", total.parse().unwrap())
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [{ "product_id": product.id, "quantity": 1, "price": total }],
                "shipping_address": shipping_address(),
                "payment_method": "credit_card",
                "total_price": total
            })),
            Some(token),
        )
        .await;
    expect_data(response, StatusCode::CREATED).await
}

#[tokio::test]
async fn create_and_list_own_orders() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;

    let created = place_order(&app, &token, "120").await;
    assert_eq!(created["status"], "pending");
    assert_eq!(as_decimal(&created["total_price"]), dec!(120));
    assert_eq!(created["items"].as_array().unwrap().len(), 1);

    let response = app
        .request(Method::GET, "/api/v1/orders/my-orders", None, Some(&token))
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn empty_item_list_is_rejected() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [],
                "shipping_address": shipping_address(),
                "payment_method": "cod",
                "total_price": "0"
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("at least one item"));
}

#[tokio::test]
async fn blank_shipping_field_is_rejected() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let category = app.seed_category("Gadgets").await;
    let product = app.seed_product(category.id, "Widget", dec!(10)).await;

    let mut address = shipping_address();
    address["city"] = json!("");
    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [{ "product_id": product.id, "quantity": 1, "price": "10" }],
                "shipping_address": address,
                "payment_method": "cod",
                "total_price": "10"
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customers_cannot_see_other_users_orders() {
    let app = TestApp::new().await;
    let (_first, first_token) = app.seed_user("first@example.com", "user").await;
    let (_second, second_token) = app.seed_user("second@example.com", "user").await;

    let created = place_order(&app, &first_token, "50").await;
    let order_id = created["id"].as_str().unwrap();

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/{}", order_id),
            None,
            Some(&second_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_updates_status_and_invalid_value_is_rejected() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let (_admin, admin_token) = app.seed_admin().await;

    let created = place_order(&app, &token, "75").await;
    let order_id = created["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/admin/orders/{}/status", order_id),
            Some(json!({ "status": "shipped" })),
            Some(&admin_token),
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["status"], "shipped");

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/admin/orders/{}/status", order_id),
            Some(json!({ "status": "teleported" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Invalid order status"));
}

#[tokio::test]
async fn stats_and_revenue_count_only_what_they_should() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let (_admin, admin_token) = app.seed_admin().await;

    let first = place_order(&app, &token, "100").await;
    let second = place_order(&app, &token, "40").await;
    let first_id = first["id"].as_str().unwrap().to_string();

    // Deliver one order; the other stays pending.
    app.request(
        Method::PATCH,
        &format!("/api/v1/admin/orders/{}/status", first_id),
        Some(json!({ "status": "delivered" })),
        Some(&admin_token),
    )
    .await;
    let _ = second;

    let response = app
        .request(Method::GET, "/api/v1/admin/orders/stats", None, Some(&admin_token))
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["delivered"], 1);
    assert_eq!(data["pending"], 1);
    assert_eq!(data["total"], 2);

    // Only the delivered order counts toward revenue; orders placed just
    // now fall inside every window.
    let response = app
        .request(
            Method::GET,
            "/api/v1/admin/orders/revenue",
            None,
            Some(&admin_token),
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(as_decimal(&data["all_time"]), dec!(100));
    assert_eq!(as_decimal(&data["month_to_date"]), dec!(100));
    assert_eq!(as_decimal(&data["day_to_date"]), dec!(100));
}

#[tokio::test]
async fn order_with_discount_records_usage() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let (_admin, _admin_token) = app.seed_admin().await;

    let now = chrono::Utc::now();
    let discount = app
        .state
        .services
        .discounts
        .create(storefront_api::services::discounts::NewDiscount {
            name: "Order discount".to_string(),
            description: None,
            code: "ORDER10".to_string(),
            kind: storefront_api::entities::discount::DiscountKind::FixedAmount,
            amount: dec!(10),
            percentage: Decimal::ZERO,
            min_order_value: Decimal::ZERO,
            max_discount_amount: Decimal::ZERO,
            usage_limit: 0,
            start_date: now - chrono::Duration::days(1),
            end_date: now + chrono::Duration::days(1),
            status: storefront_api::entities::discount::DiscountStatus::Active,
        })
        .await
        .expect("seed discount");

    let category = app.seed_category("Gadgets").await;
    let product = app.seed_product(category.id, "Widget", dec!(100)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "items": [{ "product_id": product.id, "quantity": 1, "price": "100" }],
                "shipping_address": shipping_address(),
                "payment_method": "paypal",
                "total_price": "90",
                "discount_ids": [discount.id]
            })),
            Some(&token),
        )
        .await;
    expect_data(response, StatusCode::CREATED).await;

    let refreshed = app
        .state
        .services
        .discounts
        .find_by_id(discount.id)
        .await
        .expect("reload discount");
    assert_eq!(refreshed.used_count, 1);
}
