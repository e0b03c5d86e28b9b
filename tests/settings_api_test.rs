mod common;

use axum::http::Method;
use chrono::{Duration, Utc};
use common::{response_json, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

async fn put_flag(app: &TestApp, body: Value) {
    let response = app
        .request_authenticated(Method::PUT, "/api/v1/feature-flags", Some(body))
        .await;
    assert_eq!(response.status(), 200);
}

async fn evaluate(app: &TestApp, query: &str) -> Value {
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/feature-flags/evaluate/voice_orders{query}"),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    response_json(response).await["data"].clone()
}

#[tokio::test]
async fn most_specific_flag_scope_wins() {
    let app = TestApp::new().await;
    let user = Uuid::new_v4();

    put_flag(&app, json!({ "key": "voice_orders", "enabled": false })).await;
    put_flag(
        &app,
        json!({ "key": "voice_orders", "enabled": true, "scope": "role", "scope_value": "retailer" }),
    )
    .await;
    put_flag(
        &app,
        json!({ "key": "voice_orders", "enabled": false, "scope": "user", "scope_value": user }),
    )
    .await;

    let anonymous = evaluate(&app, "").await;
    assert_eq!(anonymous["enabled"], false);
    assert_eq!(anonymous["matched_scope"]["kind"], "global");

    let retailer = evaluate(&app, "?role=retailer").await;
    assert_eq!(retailer["enabled"], true);
    assert_eq!(retailer["matched_scope"]["kind"], "role");

    let that_user = evaluate(&app, &format!("?role=retailer&user_id={user}")).await;
    assert_eq!(that_user["enabled"], false);
    assert_eq!(that_user["matched_scope"]["kind"], "user");
}

#[tokio::test]
async fn unknown_flag_is_disabled_and_upsert_replaces() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/feature-flags/evaluate/nothing_here", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["enabled"], false);
    assert!(body["data"]["matched_scope"].is_null());

    put_flag(&app, json!({ "key": "voice_orders", "enabled": false })).await;
    put_flag(&app, json!({ "key": "voice_orders", "enabled": true })).await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/feature-flags?key=voice_orders", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["enabled"], true);

    let bad_key = app
        .request_authenticated(
            Method::PUT,
            "/api/v1/feature-flags",
            Some(json!({ "key": "Has Spaces", "enabled": true })),
        )
        .await;
    assert_eq!(bad_key.status(), 400);
}

#[tokio::test]
async fn config_resolves_by_region() {
    let app = TestApp::new().await;

    let missing = app
        .request_authenticated(Method::GET, "/api/v1/app-configs/resolve/min_order_value", None)
        .await;
    assert_eq!(missing.status(), 404);

    for body in [
        json!({ "key": "min_order_value", "value": 500 }),
        json!({ "key": "min_order_value", "value": 250, "scope": "region", "scope_value": "north" }),
    ] {
        let response = app
            .request_authenticated(Method::PUT, "/api/v1/app-configs", Some(body))
            .await;
        assert_eq!(response.status(), 200);
    }

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/v1/app-configs/resolve/min_order_value?region=north",
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["value"], 250);
    assert_eq!(body["data"]["matched_scope"]["kind"], "region");

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/v1/app-configs/resolve/min_order_value?region=south",
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["value"], 500);
}

#[tokio::test]
async fn active_messages_respect_window_and_audience() {
    let app = TestApp::new().await;
    let now = Utc::now();

    let messages = [
        json!({ "title": "Diwali sale", "body": "Extra margin on sweets", "priority": 5 }),
        json!({ "title": "Wholesaler payout delay", "body": "Payouts move to Friday",
                "scope": "role", "scope_value": "wholesaler", "priority": 9 }),
        json!({ "title": "Old notice", "body": "Expired", "expires_at": now - Duration::hours(1) }),
        json!({ "title": "Paused", "body": "Switched off", "is_active": false }),
    ];
    for message in messages {
        let response = app
            .request_authenticated(Method::POST, "/api/v1/messages", Some(message))
            .await;
        assert_eq!(response.status(), 201);
    }

    let response = app
        .request_authenticated(Method::GET, "/api/v1/messages/active?role=retailer", None)
        .await;
    let body = response_json(response).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|m| m["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Diwali sale"]);

    let response = app
        .request_authenticated(Method::GET, "/api/v1/messages/active?role=wholesaler", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"][0]["title"], "Wholesaler payout delay");
    assert_eq!(body["data"][1]["title"], "Diwali sale");
}

#[tokio::test]
async fn mixed_case_flag_keys_are_folded() {
    let app = TestApp::new().await;

    put_flag(&app, json!({ "key": "Voice_Orders", "enabled": true })).await;

    let flag = evaluate(&app, "").await;
    assert_eq!(flag["enabled"], true);
    assert_eq!(flag["matched_scope"]["kind"], "global");
}
