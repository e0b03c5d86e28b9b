mod common;

use axum::http::Method;
use common::{decimal_of, id_of, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

async fn create_order(app: &TestApp, seller: Uuid, retailer: Uuid) -> Uuid {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "retailer_id": retailer,
                "seller_id": seller,
                "items": [
                    { "product_name": "Parle-G 100g", "quantity": 24, "price": "10" },
                    { "product_name": "Tata Salt 1kg", "quantity": 5, "price": "28" }
                ],
                "delivery_address": "Shop 4, Gandhi Market, Indore"
            })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    assert_eq!(decimal_of(&body["data"]["total_amount"]), dec!(380));
    assert_eq!(body["data"]["status"], "pending");
    id_of(&body["data"])
}

#[tokio::test]
async fn order_status_can_move_in_any_direction() {
    let app = TestApp::new().await;
    let seller = app.create_seller("Sharma Traders", "+919800000001").await;
    let order = create_order(&app, seller, Uuid::new_v4()).await;

    for status in ["delivered", "pending", "cancelled", "processing"] {
        let response = app
            .request_authenticated(
                Method::PUT,
                &format!("/api/v1/orders/{order}/status"),
                Some(json!({ "status": status })),
            )
            .await;
        assert_eq!(response.status(), 200, "transition to {status}");
        assert_eq!(response_json(response).await["data"]["status"], status);
    }

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/orders/{order}"), None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn bulk_product_update_reports_missing_ids() {
    let app = TestApp::new().await;
    let seller = app.create_seller("Sharma Traders", "+919800000001").await;
    let first = app.create_product(seller, "Parle-G 100g", "10").await;
    let second = app.create_product(seller, "Tata Salt 1kg", "28").await;
    let missing = Uuid::new_v4();

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/bulk/products",
            Some(json!({
                "ids": [first, missing, second],
                "operation": "update_price",
                "value": "12.50"
            })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["updated"], 2);
    assert_eq!(body["data"]["errors"][0]["id"], missing.to_string());

    for id in [first, second] {
        let response = app
            .request_authenticated(Method::GET, &format!("/api/v1/products/{id}"), None)
            .await;
        let body = response_json(response).await;
        assert_eq!(decimal_of(&body["data"]["price"]), dec!(12.50));
    }
}

#[tokio::test]
async fn bulk_requests_are_validated_up_front() {
    let app = TestApp::new().await;

    let empty = app
        .request_authenticated(
            Method::POST,
            "/api/v1/bulk/products",
            Some(json!({ "ids": [], "operation": "delete" })),
        )
        .await;
    assert_eq!(empty.status(), 400);

    let unknown = app
        .request_authenticated(
            Method::POST,
            "/api/v1/bulk/products",
            Some(json!({ "ids": [Uuid::new_v4()], "operation": "explode" })),
        )
        .await;
    assert_eq!(unknown.status(), 400);

    let bad_value = app
        .request_authenticated(
            Method::POST,
            "/api/v1/bulk/products",
            Some(json!({ "ids": [Uuid::new_v4()], "operation": "set_stock", "value": -3 })),
        )
        .await;
    assert_eq!(bad_value.status(), 400);
}

#[tokio::test]
async fn bulk_order_status_update() {
    let app = TestApp::new().await;
    let seller = app.create_seller("Sharma Traders", "+919800000001").await;
    let a = create_order(&app, seller, Uuid::new_v4()).await;
    let b = create_order(&app, seller, Uuid::new_v4()).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/bulk/orders",
            Some(json!({ "ids": [a, b], "operation": "update_status", "value": "shipped" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["updated"], 2);
    assert!(body["data"]["errors"].as_array().is_some_and(Vec::is_empty));

    let response = app
        .request_authenticated(Method::GET, "/api/v1/orders?status=shipped", None)
        .await;
    assert_eq!(response_json(response).await["data"]["total"], 2);
}

#[tokio::test]
async fn order_total_overflow_is_rejected() {
    let app = TestApp::new().await;
    let seller = app.create_seller("Sharma Traders", "+919800000001").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "retailer_id": Uuid::new_v4(),
                "seller_id": seller,
                "items": [
                    { "product_name": "Gold Bar", "quantity": 2, "price": "79228162514264337593543950335" }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), 400);
}
