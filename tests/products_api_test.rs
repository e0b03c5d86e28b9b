mod common;

use axum::http::Method;
use common::{decimal_of, id_of, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn duplicate_check_ignores_case_and_is_per_seller() {
    let app = TestApp::new().await;
    let seller = app.create_seller("Sharma Traders", "+919800000001").await;
    let other_seller = app.create_seller("Gupta Wholesale", "+919800000002").await;
    let existing = app.create_product(seller, "Parle-G 100g", "10").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/products/check-duplicate",
            Some(json!({ "name": "  parle-g 100G ", "seller_id": seller })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["is_duplicate"], true);
    assert_eq!(body["data"]["existing_product_id"], existing.to_string());

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/products/check-duplicate",
            Some(json!({ "name": "Parle-G 100g", "seller_id": other_seller })),
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["is_duplicate"], false);
    assert!(body["data"]["existing_product_id"].is_null());
}

#[tokio::test]
async fn duplicate_create_conflicts_unless_forced() {
    let app = TestApp::new().await;
    let seller = app.create_seller("Sharma Traders", "+919800000001").await;
    app.create_product(seller, "Tata Salt 1kg", "28").await;

    let payload = json!({ "name": "TATA SALT 1KG", "price": "30", "seller_id": seller });
    let response = app
        .request_authenticated(Method::POST, "/api/v1/products", Some(payload.clone()))
        .await;
    assert_eq!(response.status(), 409);

    let mut forced = payload;
    forced["force"] = json!(true);
    let response = app
        .request_authenticated(Method::POST, "/api/v1/products", Some(forced))
        .await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn product_crud_and_filters() {
    let app = TestApp::new().await;
    let seller = app.create_seller("Sharma Traders", "+919800000001").await;
    let product = app.create_product(seller, "Amul Butter 100g", "56").await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/products/{product}"),
            Some(json!({ "price": "58.50", "category": "Dairy" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(decimal_of(&body["data"]["price"]), dec!(58.50));

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/products?seller_id={seller}&search=butter"),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/products/{product}"), None)
        .await;
    assert_eq!(response.status(), 204);

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/products/{product}"), None)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn variants_attach_to_a_base_product() {
    let app = TestApp::new().await;
    let seller = app.create_seller("Sharma Traders", "+919800000001").await;
    let base = app.create_product(seller, "Coca Cola 250ml", "20").await;
    let larger = app.create_product(seller, "Coca Cola 500ml", "35").await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/products/{base}/variants"),
            Some(json!({
                "sku": "COKE-500",
                "variant_type": "size",
                "variant_value": "500ml",
                "price": "35",
                "variant_product_id": larger,
                "display_order": 1
            })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let variant = id_of(&response_json(response).await["data"]);

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/products/{base}/variants"), None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["variant_value"], "500ml");

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/variants/{variant}"),
            Some(json!({ "stock_quantity": 12 })),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response_json(response).await["data"]["stock_quantity"], 12);

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/variants/{variant}"), None)
        .await;
    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn master_product_clones_into_seller_inventory() {
    let app = TestApp::new().await;
    let seller = app.create_seller("Sharma Traders", "+919800000001").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/master-products",
            Some(json!({
                "name": "Aashirvaad Atta 5kg",
                "category": "Staples",
                "unit": "bag",
                "suggested_price": "265"
            })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let master = id_of(&response_json(response).await["data"]);

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/master-products/{master}/clone"),
            Some(json!({ "seller_id": seller, "price": "259", "stock_available": 8 })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    assert_eq!(body["data"]["name"], "Aashirvaad Atta 5kg");
    assert_eq!(body["data"]["seller_id"], seller.to_string());
    assert_eq!(decimal_of(&body["data"]["price"]), dec!(259));
    assert_eq!(body["data"]["stock_available"], 8);

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/master-products/{master}/clone"),
            Some(json!({ "seller_id": seller })),
        )
        .await;
    assert_eq!(response.status(), 409);

    let response = app
        .request_authenticated(Method::GET, "/api/v1/master-products?search=atta", None)
        .await;
    assert_eq!(response_json(response).await["data"]["total"], 1);
}

#[tokio::test]
async fn deleting_a_linked_sibling_removes_its_variant_row() {
    let app = TestApp::new().await;
    let seller = app.create_seller("Sharma Traders", "+919800000001").await;
    let base = app.create_product(seller, "Coca Cola 250ml", "20").await;
    let sibling = app.create_product(seller, "Coca Cola 500ml", "35").await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/products/{base}/variants"),
            Some(json!({
                "sku": "COKE-500",
                "variant_type": "size",
                "variant_value": "500ml",
                "price": "35",
                "variant_product_id": sibling
            })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/products/{sibling}"), None)
        .await;
    assert_eq!(response.status(), 204);

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/products/{base}/variants"), None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}
