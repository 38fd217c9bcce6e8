mod common;

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use common::{body_json, expect_data, TestApp};
use storefront_api::entities::product;
use storefront_api::services::products::{NewProduct, NewProductVariant};

fn as_decimal(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .expect("decimal serialized as string")
        .parse()
        .expect("parse decimal")
}

async fn seed_shirt(app: &TestApp) -> product::Model {
    let category = app.seed_category("Apparel").await;
    app.state
        .services
        .products
        .create(NewProduct {
            name: "Shirt".to_string(),
            description: None,
            category_id: category.id,
            sub_category_id: None,
            price: dec!(20),
            stock: 50,
            thumbnail: None,
            images: Vec::new(),
            status: product::ProductStatus::Available,
            variants: vec![NewProductVariant {
                name: "XL".to_string(),
                value: "size".to_string(),
                price_adjustment: dec!(5),
                stock: 10,
            }],
        })
        .await
        .expect("seed product with variant")
        .product
}

#[tokio::test]
async fn adding_same_line_twice_merges_quantities() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let shirt = seed_shirt(&app).await;

    let payload = json!({ "product_id": shirt.id, "quantity": 2 });
    app.request(Method::POST, "/api/v1/carts/add", Some(payload.clone()), Some(&token))
        .await;
    let response = app
        .request(Method::POST, "/api/v1/carts/add", Some(payload), Some(&token))
        .await;
    let data = expect_data(response, StatusCode::OK).await;

    let items = data["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 4);
}

#[tokio::test]
async fn variants_are_distinct_cart_lines() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let shirt = seed_shirt(&app).await;

    app.request(
        Method::POST,
        "/api/v1/carts/add",
        Some(json!({ "product_id": shirt.id, "quantity": 1 })),
        Some(&token),
    )
    .await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/carts/add",
            Some(json!({ "product_id": shirt.id, "quantity": 1, "variant": "XL" })),
            Some(&token),
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn totals_use_live_prices_and_variant_adjustment() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let shirt = seed_shirt(&app).await;

    app.request(
        Method::POST,
        "/api/v1/carts/add",
        Some(json!({ "product_id": shirt.id, "quantity": 2 })),
        Some(&token),
    )
    .await;
    app.request(
        Method::POST,
        "/api/v1/carts/add",
        Some(json!({ "product_id": shirt.id, "quantity": 1, "variant": "XL" })),
        Some(&token),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/carts/total", None, Some(&token))
        .await;
    let data = expect_data(response, StatusCode::OK).await;

    // 2 x 20 plus 1 x (20 + 5)
    assert_eq!(as_decimal(&data["total"]), dec!(65));
    assert_eq!(data["item_count"], 3);
}

#[tokio::test]
async fn empty_cart_totals_are_zero() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;

    let response = app
        .request(Method::GET, "/api/v1/carts/total", None, Some(&token))
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(as_decimal(&data["total"]), Decimal::ZERO);
    assert_eq!(data["item_count"], 0);
}

#[tokio::test]
async fn removing_absent_line_is_a_silent_no_op() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let shirt = seed_shirt(&app).await;

    app.request(
        Method::POST,
        "/api/v1/carts/add",
        Some(json!({ "product_id": shirt.id, "quantity": 1 })),
        Some(&token),
    )
    .await;

    // Wrong variant: nothing matches, nothing is removed.
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/carts/remove/{}", shirt.id),
            Some(json!({ "variant": "XXL" })),
            Some(&token),
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["items"].as_array().unwrap().len(), 1);

    // Matching bare line is removed.
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/carts/remove/{}", shirt.id),
            None,
            Some(&token),
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert!(data["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn updating_absent_line_is_not_found() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let shirt = seed_shirt(&app).await;

    let response = app
        .request(
            Method::PATCH,
            "/api/v1/carts/update",
            Some(json!({ "product_id": shirt.id, "quantity": 5 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_overwrites_quantity() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let shirt = seed_shirt(&app).await;

    app.request(
        Method::POST,
        "/api/v1/carts/add",
        Some(json!({ "product_id": shirt.id, "quantity": 2 })),
        Some(&token),
    )
    .await;
    let response = app
        .request(
            Method::PATCH,
            "/api/v1/carts/update",
            Some(json!({ "product_id": shirt.id, "quantity": 7 })),
            Some(&token),
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["items"][0]["quantity"], 7);
}

#[tokio::test]
async fn convert_empty_cart_is_rejected() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;

    // Touch the cart so it exists, then try to convert it empty.
    app.request(Method::GET, "/api/v1/carts", None, Some(&token))
        .await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/carts/convert-to-order",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Cart is empty"));
}

#[tokio::test]
async fn convert_flips_status_and_keeps_items() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let shirt = seed_shirt(&app).await;

    app.request(
        Method::POST,
        "/api/v1/carts/add",
        Some(json!({ "product_id": shirt.id, "quantity": 1 })),
        Some(&token),
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/carts/convert-to-order",
            None,
            Some(&token),
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["status"], "converted");
}

#[tokio::test]
async fn adding_unknown_product_fails() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/carts/add",
            Some(json!({ "product_id": uuid::Uuid::new_v4(), "quantity": 1 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn zero_quantity_add_is_rejected() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let shirt = seed_shirt(&app).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/carts/add",
            Some(json!({ "product_id": shirt.id, "quantity": 0 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
