mod common;

use axum::http::Method;
use common::{response_json, TestApp};

const CATALOG: &str = "Name,Price,Category,Stock_Available\n\
Parle-G 100g,10,Biscuits,120\n\
Tata Salt 1kg,abc,Staples,40\n\
Maggi 70g,14,Noodles,\n";

#[tokio::test]
async fn preview_shows_headers_and_rows() {
    let app = TestApp::new().await;

    let response = app
        .upload(
            "/api/v1/imports/products/preview",
            "catalog.csv",
            "text/csv",
            CATALOG.as_bytes(),
            &[],
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["headers"][0], "Name");
    assert_eq!(body["data"]["total_rows"], 3);
    assert_eq!(body["data"]["rows"][1]["Price"], "abc");
}

#[tokio::test]
async fn import_creates_good_rows_and_reports_bad_ones() {
    let app = TestApp::new().await;
    let seller = app.create_seller("Sharma Traders", "+919800000001").await;

    let response = app
        .upload(
            "/api/v1/imports/products",
            "catalog.csv",
            "text/csv",
            CATALOG.as_bytes(),
            &[("seller_id", &seller.to_string())],
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["imported"], 2);
    assert_eq!(body["data"]["errors"][0]["row"], 2);

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/products?seller_id={seller}"),
            None,
        )
        .await;
    assert_eq!(response_json(response).await["data"]["total"], 2);
}

#[tokio::test]
async fn import_rejects_files_it_cannot_use() {
    let app = TestApp::new().await;

    let no_price = app
        .upload(
            "/api/v1/imports/products",
            "catalog.csv",
            "text/csv",
            b"name,category\nParle-G,Biscuits\n",
            &[],
        )
        .await;
    assert_eq!(no_price.status(), 400);

    let mut oversized = String::from("name,price\n");
    for i in 0..51 {
        oversized.push_str(&format!("Item {i},10\n"));
    }
    let too_many = app
        .upload(
            "/api/v1/imports/products",
            "catalog.csv",
            "text/csv",
            oversized.as_bytes(),
            &[],
        )
        .await;
    assert_eq!(too_many.status(), 400);

    let bad_seller = app
        .upload(
            "/api/v1/imports/products",
            "catalog.csv",
            "text/csv",
            CATALOG.as_bytes(),
            &[("seller_id", "not-a-uuid")],
        )
        .await;
    assert_eq!(bad_seller.status(), 400);
}

#[tokio::test]
async fn rows_without_any_seller_fail_individually() {
    let app = TestApp::new().await;

    let response = app
        .upload(
            "/api/v1/imports/products",
            "catalog.csv",
            "text/csv",
            b"name,price\nParle-G 100g,10\n",
            &[],
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["imported"], 0);
    assert_eq!(body["data"]["errors"][0]["error"], "seller_id is required");
}

#[tokio::test]
async fn repeated_names_in_a_file_are_imported_once() {
    let app = TestApp::new().await;
    let seller = app.create_seller("Sharma Traders", "+919800000001").await;

    let response = app
        .upload(
            "/api/v1/imports/products",
            "catalog.csv",
            "text/csv",
            b"name,price\nSugar 1kg,45\nSugar 1kg,45\nsugar 1KG,45\n",
            &[("seller_id", &seller.to_string())],
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["imported"], 1);
    assert_eq!(body["data"]["errors"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["errors"][0]["row"], 2);
    assert_eq!(body["data"]["errors"][1]["error"], "duplicate of row 1");

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/products?seller_id={seller}&search=sugar"),
            None,
        )
        .await;
    assert_eq!(response_json(response).await["data"]["total"], 1);
}
