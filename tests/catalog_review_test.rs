mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

use common::{body_json, expect_data, TestApp};

#[tokio::test]
async fn product_search_and_pagination() {
    let app = TestApp::new().await;
    let category = app.seed_category("Books").await;

    for name in ["Rust in Action", "Rust for Rustaceans", "Cooking 101"] {
        app.seed_product(category.id, name, dec!(30)).await;
    }

    let response = app
        .request(Method::GET, "/api/v1/products?search=rust", None, None)
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["total"], 2);
    assert_eq!(data["products"].as_array().unwrap().len(), 2);

    let response = app
        .request(
            Method::GET,
            "/api/v1/products?page=2&limit=2&sort_by=name&sort_order=asc",
            None,
            None,
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["total"], 3);
    assert_eq!(data["page"], 2);
    assert_eq!(data["products"].as_array().unwrap().len(), 1);

    // Listing without a limit uses the configured default page size, and an
    // oversized limit is clamped to the configured maximum.
    let response = app.request(Method::GET, "/api/v1/products", None, None).await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["limit"], 20);

    let response = app
        .request(Method::GET, "/api/v1/products?limit=500", None, None)
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["limit"], 100);
}

#[tokio::test]
async fn category_listing_shows_available_products_only() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.seed_admin().await;
    let category = app.seed_category("Shoes").await;
    let available = app.seed_product(category.id, "Runner", dec!(80)).await;
    let retired = app.seed_product(category.id, "Old Model", dec!(60)).await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/admin/products/{}", retired.id),
            Some(json!({ "status": "discontinued" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/products/category/{}", category.id),
            None,
            None,
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    let products = data.as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], json!(available.id));
}

#[tokio::test]
async fn admin_creates_product_with_variants() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.seed_admin().await;
    let category = app.seed_category("Apparel").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/products",
            Some(json!({
                "name": "Hoodie",
                "category_id": category.id,
                "price": "45",
                "stock": 20,
                "variants": [
                    { "name": "M", "value": "size", "stock": 10 },
                    { "name": "L", "value": "size", "price_adjustment": "2", "stock": 10 }
                ]
            })),
            Some(&admin_token),
        )
        .await;
    let data = expect_data(response, StatusCode::CREATED).await;
    assert_eq!(data["name"], "Hoodie");
    assert_eq!(data["variants"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn stock_update_ignores_unknown_variant() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.seed_admin().await;
    let category = app.seed_category("Apparel").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/admin/products",
            Some(json!({
                "name": "Cap",
                "category_id": category.id,
                "price": "15",
                "variants": [{ "name": "One Size", "value": "size", "stock": 5 }]
            })),
            Some(&admin_token),
        )
        .await;
    let product = expect_data(created, StatusCode::CREATED).await;
    let product_id = product["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/admin/products/{}/stock", product_id),
            Some(json!({ "variant_name": "One Size", "quantity": 42 })),
            Some(&admin_token),
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["variants"][0]["stock"], 42);

    // Unknown variant name: nothing changes, the call still succeeds.
    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/admin/products/{}/stock", product_id),
            Some(json!({ "variant_name": "Ghost", "quantity": 7 })),
            Some(&admin_token),
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data["variants"][0]["stock"], 42);
}

#[tokio::test]
async fn public_categories_hide_inactive_entries() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.seed_admin().await;

    app.seed_category("Visible").await;
    let hidden = app.seed_category("Hidden").await;
    app.request(
        Method::PATCH,
        &format!("/api/v1/admin/categories/{}", hidden.id),
        Some(json!({ "status": "inactive" })),
        Some(&admin_token),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/categories", None, None)
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    let names: Vec<&str> = data
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Visible"]);
}

#[tokio::test]
async fn sub_category_requires_existing_parent() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.seed_admin().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/sub-categories",
            Some(json!({ "category_id": Uuid::new_v4(), "name": "Orphan" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let parent = app.seed_category("Parent").await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/sub-categories",
            Some(json!({ "category_id": parent.id, "name": "Child" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn review_lifecycle_with_moderation() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.seed_admin().await;
    let (_user, user_token) = app.seed_customer().await;
    let category = app.seed_category("Books").await;
    let product = app.seed_product(category.id, "Novel", dec!(12)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/reviews",
            Some(json!({ "product_id": product.id, "rating": 4, "comment": "Good read" })),
            Some(&user_token),
        )
        .await;
    let review = expect_data(response, StatusCode::CREATED).await;
    assert_eq!(review["status"], "pending");
    let review_id = review["id"].as_str().unwrap().to_string();

    // Pending reviews are invisible on the product page.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/reviews/product/{}", product.id),
            None,
            None,
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert!(data.as_array().unwrap().is_empty());

    app.request(
        Method::POST,
        &format!("/api/v1/admin/reviews/{}/approve", review_id),
        None,
        Some(&admin_token),
    )
    .await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/reviews/product/{}", product.id),
            None,
            None,
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(data.as_array().unwrap().len(), 1);

    // A second review of the same product by the same user conflicts.
    let response = app
        .request(
            Method::POST,
            "/api/v1/reviews",
            Some(json!({ "product_id": product.id, "rating": 5 })),
            Some(&user_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn rating_averages_approved_reviews_to_one_decimal() {
    let app = TestApp::new().await;
    let (_admin, admin_token) = app.seed_admin().await;
    let category = app.seed_category("Books").await;
    let product = app.seed_product(category.id, "Novel", dec!(12)).await;

    for (i, rating) in [5, 4, 4].iter().enumerate() {
        let (_user, token) = app
            .seed_user(&format!("reviewer{}@example.com", i), "user")
            .await;
        let response = app
            .request(
                Method::POST,
                "/api/v1/reviews",
                Some(json!({ "product_id": product.id, "rating": rating })),
                Some(&token),
            )
            .await;
        let review = expect_data(response, StatusCode::CREATED).await;
        app.request(
            Method::POST,
            &format!("/api/v1/admin/reviews/{}/approve", review["id"].as_str().unwrap()),
            None,
            Some(&admin_token),
        )
        .await;
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/reviews/product/{}/rating", product.id),
            None,
            None,
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    // 13 / 3 rounds to 4.3
    assert_eq!(data["average"].as_str().unwrap().parse::<rust_decimal::Decimal>().unwrap(), dec!(4.3));
    assert_eq!(data["count"], 3);
}

#[tokio::test]
async fn rating_is_zero_when_no_approved_reviews() {
    let app = TestApp::new().await;
    let category = app.seed_category("Books").await;
    let product = app.seed_product(category.id, "Novel", dec!(12)).await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/reviews/product/{}/rating", product.id),
            None,
            None,
        )
        .await;
    let data = expect_data(response, StatusCode::OK).await;
    assert_eq!(
        data["average"].as_str().unwrap().parse::<rust_decimal::Decimal>().unwrap(),
        rust_decimal::Decimal::ZERO
    );
    assert_eq!(data["count"], 0);
}

#[tokio::test]
async fn users_cannot_edit_someone_elses_review() {
    let app = TestApp::new().await;
    let (_first, first_token) = app.seed_user("author@example.com", "user").await;
    let (_second, second_token) = app.seed_user("intruder@example.com", "user").await;
    let category = app.seed_category("Books").await;
    let product = app.seed_product(category.id, "Novel", dec!(12)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/reviews",
            Some(json!({ "product_id": product.id, "rating": 3 })),
            Some(&first_token),
        )
        .await;
    let review = expect_data(response, StatusCode::CREATED).await;
    let review_id = review["id"].as_str().unwrap();

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/reviews/{}", review_id),
            Some(json!({ "rating": 1 })),
            Some(&second_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let app = TestApp::new().await;
    let (_user, token) = app.seed_customer().await;
    let category = app.seed_category("Books").await;
    let product = app.seed_product(category.id, "Novel", dec!(12)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/reviews",
            Some(json!({ "product_id": product.id, "rating": 6 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("rating"));
}
