use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::time::Instant;
use utoipa::ToSchema;

use crate::{ApiResponse, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
    Degraded,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthDetails {
    pub database: ComponentHealth,
    /// Receipt OCR is optional; without it only `/receipts/reconcile` works.
    pub ocr: ComponentHealth,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: String,
    pub environment: String,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub details: HealthDetails,
}

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Records process start for the uptime figure. Call once at startup.
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

/// - GET /health          liveness
/// - GET /health/ready    database reachable
/// - GET /health/detailed component statuses
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(liveness_check))
        .route("/ready", get(readiness_check))
        .route("/detailed", get(detailed_health_check))
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses((status = 200, description = "Process is up")),
    tag = "health"
)]
pub async fn liveness_check() -> impl IntoResponse {
    Json(json!({
        "status": "up",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/health/ready",
    responses(
        (status = 200, description = "Database reachable"),
        (status = 503, description = "Database unreachable"),
    ),
    tag = "health"
)]
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    match crate::db::check_connection(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": { "database": { "status": "up" } },
                "response_time_ms": started.elapsed().as_millis() as u64
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": { "database": { "status": "down", "error": e.to_string() } },
                "response_time_ms": started.elapsed().as_millis() as u64
            })),
        ),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/health/detailed",
    responses(
        (status = 200, description = "Up or degraded", body = HealthResponse),
        (status = 503, description = "Database down", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn detailed_health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_started = Instant::now();
    let db_result = crate::db::check_connection(&state.db).await;
    let database = ComponentHealth {
        status: if db_result.is_ok() {
            ComponentStatus::Up
        } else {
            ComponentStatus::Down
        },
        message: db_result.map_or_else(
            |e| format!("Connection failed: {}", e),
            |_| "Connection successful".to_string(),
        ),
        latency_ms: Some(db_started.elapsed().as_millis() as u64),
    };

    let ocr = if state.services.receipts.ocr_enabled() {
        ComponentHealth {
            status: ComponentStatus::Up,
            message: "Configured".to_string(),
            latency_ms: None,
        }
    } else {
        ComponentHealth {
            status: ComponentStatus::Degraded,
            message: "Not configured".to_string(),
            latency_ms: None,
        }
    };

    let status = match (database.status, ocr.status) {
        (ComponentStatus::Down, _) => ComponentStatus::Down,
        (_, ComponentStatus::Up) => ComponentStatus::Up,
        _ => ComponentStatus::Degraded,
    };
    let code = if status == ComponentStatus::Down {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_secs: uptime_secs(),
        details: HealthDetails { database, ocr },
    };
    (code, Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/status",
    responses((status = 200, description = "Service name, version and environment")),
    tag = "health"
)]
pub async fn api_status(State(state): State<AppState>) -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "git": option_env!("GIT_HASH").unwrap_or("unknown"),
        "environment": state.config.environment,
        "ocr_enabled": state.services.receipts.ocr_enabled(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
