mod common;

use axum::http::Method;
use common::{id_of, response_json, TestApp};
use serde_json::json;
use uuid::Uuid;

async fn create_partner(app: &TestApp) -> Uuid {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/delivery-partners",
            Some(json!({
                "name": "Ravi Kumar",
                "phone": "+919811112222",
                "vehicle_type": "bike",
                "vehicle_number": "MP09 AB 1234"
            })),
        )
        .await;
    assert_eq!(response.status(), 201);
    id_of(&response_json(response).await["data"])
}

#[tokio::test]
async fn offline_partner_is_never_available() {
    let app = TestApp::new().await;
    let partner = create_partner(&app).await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/delivery-partners/{partner}/availability"),
            Some(json!({ "is_online": false, "is_available": true })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["is_online"], false);
    assert_eq!(body["data"]["is_available"], false);
    assert!(body["data"]["last_seen_at"].is_string());

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/delivery-partners/{partner}/availability"),
            Some(json!({ "is_online": true, "is_available": true })),
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["is_available"], true);

    let response = app
        .request_authenticated(Method::GET, "/api/v1/delivery-partners?is_available=true", None)
        .await;
    assert_eq!(response_json(response).await["data"]["total"], 1);
}

#[tokio::test]
async fn locations_and_rejections_are_logged_newest_first() {
    let app = TestApp::new().await;
    let partner = create_partner(&app).await;

    for (lat, lng) in [(22.7196, 75.8577), (22.7251, 75.8655)] {
        let response = app
            .request_authenticated(
                Method::POST,
                &format!("/api/v1/delivery-partners/{partner}/locations"),
                Some(json!({ "latitude": lat, "longitude": lng })),
            )
            .await;
        assert_eq!(response.status(), 201);
    }

    let out_of_range = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/delivery-partners/{partner}/locations"),
            Some(json!({ "latitude": 123.0, "longitude": 75.0 })),
        )
        .await;
    assert_eq!(out_of_range.status(), 400);

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/delivery-partners/{partner}/locations?limit=1"),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let order_id = Uuid::new_v4();
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/delivery-partners/{partner}/rejections"),
            Some(json!({ "order_id": order_id, "reason": "Too far" })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/delivery-partners/{partner}/rejections"),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"][0]["order_id"], order_id.to_string());
    assert_eq!(body["data"][0]["reason"], "Too far");
}

#[tokio::test]
async fn unknown_partner_is_not_found() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/delivery-partners/{}/availability", Uuid::new_v4()),
            Some(json!({ "is_online": true, "is_available": true })),
        )
        .await;
    assert_eq!(response.status(), 404);
}
