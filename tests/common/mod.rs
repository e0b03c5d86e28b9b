#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use marketplace_admin::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::admin_user::AdminRole,
    events::{self, EventSender},
    handlers::AppServices,
    services::ocr::OcrBackend,
    AppState,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "ops@marketplace.test";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

const BOUNDARY: &str = "----marketplace-admin-test-boundary";

/// Application router over a fresh in-memory SQLite database, with one
/// super admin already signed in.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    pub admin_id: Uuid,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_ocr(None).await
    }

    pub async fn with_ocr(ocr: Option<Arc<dyn OcrBackend>>) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // One connection, or every query would see a different empty database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.bulk_concurrency = 4;
        cfg.import_max_rows = 50;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let pool = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth = Arc::new(AuthService::new(AuthConfig::from(&cfg), pool.clone()));
        let admin = auth
            .create_admin(ADMIN_EMAIL, "Ops", ADMIN_PASSWORD, AdminRole::SuperAdmin)
            .await
            .expect("failed to create test admin");
        let admin_id = admin.id;
        let token = auth
            .issue_session(admin)
            .expect("failed to issue test session")
            .access_token;

        let services = AppServices::new(pool.clone(), event_sender.clone(), &cfg, ocr);
        let state = AppState {
            db: pool,
            config: cfg,
            event_sender,
            services,
            auth,
        };

        Self {
            router: marketplace_admin::build_router(state.clone()),
            state,
            token,
            admin_id,
            _event_task: event_task,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Authenticated multipart POST with one `file` part plus text fields.
    pub async fn upload(
        &self,
        uri: &str,
        file_name: &str,
        content_type: &str,
        file: &[u8],
        fields: &[(&str, &str)],
    ) -> Response {
        let mut payload = Vec::new();
        for (name, value) in fields {
            payload.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        payload.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        payload.extend_from_slice(file);
        payload.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(payload))
            .expect("failed to build multipart request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Creates a seller through the API and returns its id.
    pub async fn create_seller(&self, business_name: &str, phone: &str) -> Uuid {
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/v1/users",
                Some(serde_json::json!({
                    "business_name": business_name,
                    "phone_number": phone,
                    "role": "wholesaler",
                    "region": "north"
                })),
            )
            .await;
        assert_eq!(response.status(), 201, "seller creation failed");
        let body = response_json(response).await;
        id_of(&body["data"])
    }

    /// Creates a product through the API and returns its id.
    pub async fn create_product(&self, seller_id: Uuid, name: &str, price: &str) -> Uuid {
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/v1/products",
                Some(serde_json::json!({
                    "name": name,
                    "price": price,
                    "seller_id": seller_id,
                    "stock_available": 10
                })),
            )
            .await;
        assert_eq!(response.status(), 201, "product creation failed for {name}");
        let body = response_json(response).await;
        id_of(&body["data"])
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub fn id_of(value: &Value) -> Uuid {
    value["id"]
        .as_str()
        .and_then(|id| Uuid::parse_str(id).ok())
        .expect("response carries an id")
}

/// Decimal fields serialize as strings; compare them numerically.
pub fn decimal_of(value: &Value) -> rust_decimal::Decimal {
    use std::str::FromStr;
    match value {
        Value::String(s) => rust_decimal::Decimal::from_str(s).expect("decimal string"),
        other => rust_decimal::Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}
