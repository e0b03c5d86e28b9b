mod common;

use axum::http::Method;
use common::{response_json, TestApp, ADMIN_EMAIL, ADMIN_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn login_issues_a_working_token() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let token = body["data"]["access_token"].as_str().expect("token").to_string();
    assert_eq!(body["data"]["token_type"], "Bearer");

    let me = app.request(Method::GET, "/auth/me", None, Some(&token)).await;
    assert_eq!(me.status(), 200);
    let me = response_json(me).await;
    assert_eq!(me["data"]["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": ADMIN_EMAIL, "password": "not-the-password" })),
            None,
        )
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn api_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let missing = app.request(Method::GET, "/api/v1/orders", None, None).await;
    assert_eq!(missing.status(), 401);

    let garbage = app
        .request(Method::GET, "/api/v1/orders", None, Some("invalid_token_here"))
        .await;
    assert_eq!(garbage.status(), 401);

    let valid = app
        .request_authenticated(Method::GET, "/api/v1/orders", None)
        .await;
    assert_eq!(valid.status(), 200);
}

#[tokio::test]
async fn health_and_status_are_public() {
    let app = TestApp::new().await;

    let health = app.request(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(health.status(), 200);

    let ready = app.request(Method::GET, "/api/v1/health/ready", None, None).await;
    assert_eq!(ready.status(), 200);

    let status = app.request(Method::GET, "/api/v1/status", None, None).await;
    assert_eq!(status.status(), 200);
    let body = response_json(status).await;
    assert_eq!(body["data"]["ocr_enabled"], false);
}

#[tokio::test]
async fn responses_echo_the_request_id() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/v1/health", None, None).await;
    assert!(response.headers().contains_key("x-request-id"));
}
