//! Feature flags and app configs. Both are keyed settings scoped to an
//! audience, so they share the query shapes below.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    auth::AdminUser,
    errors::ServiceError,
    services::{
        app_configs::{AppConfigResponse, ResolvedConfig, UpsertAppConfigRequest},
        feature_flags::{FeatureFlagResponse, FlagEvaluation, UpsertFeatureFlagRequest},
        scoping::ScopeContext,
    },
    ApiResponse, AppState,
};

pub fn feature_flag_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_flags).put(upsert_flag))
        .route("/evaluate/:key", get(evaluate_flag))
        .route("/:id", delete(delete_flag))
}

pub fn app_config_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_configs).put(upsert_config))
        .route("/resolve/:key", get(resolve_config))
        .route("/:id", delete(delete_config))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SettingKeyQuery {
    /// Only rows for this key
    pub key: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/feature-flags",
    params(SettingKeyQuery),
    responses(
        (status = 200, description = "Flag rows by key and scope", body = ApiResponse<Vec<FeatureFlagResponse>>),
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn list_flags(
    State(state): State<AppState>,
    Query(query): Query<SettingKeyQuery>,
) -> Result<Json<ApiResponse<Vec<FeatureFlagResponse>>>, ServiceError> {
    let flags = state
        .services
        .feature_flags
        .list_flags(query.key.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(flags)))
}

#[utoipa::path(
    put,
    path = "/api/v1/feature-flags",
    summary = "Set a feature flag",
    description = "Creates or replaces the flag row for (key, scope, scope_value).",
    request_body = UpsertFeatureFlagRequest,
    responses(
        (status = 200, description = "Flag saved", body = ApiResponse<FeatureFlagResponse>),
        (status = 400, description = "Invalid key or scope", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn upsert_flag(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Json(request): Json<UpsertFeatureFlagRequest>,
) -> Result<Json<ApiResponse<FeatureFlagResponse>>, ServiceError> {
    let flag = state
        .services
        .feature_flags
        .upsert_flag(request, Some(admin.id))
        .await?;
    Ok(Json(ApiResponse::success(flag)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/feature-flags/{id}",
    params(("id" = Uuid, Path, description = "Flag row id")),
    responses(
        (status = 204, description = "Flag row deleted"),
        (status = 404, description = "Flag not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn delete_flag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.feature_flags.delete_flag(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/feature-flags/evaluate/{key}",
    summary = "Evaluate a feature flag",
    description = "The most specific applicable row decides. No applicable row means disabled.",
    params(("key" = String, Path, description = "Flag key"), ScopeContext),
    responses(
        (status = 200, description = "Evaluation", body = ApiResponse<FlagEvaluation>),
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn evaluate_flag(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(ctx): Query<ScopeContext>,
) -> Result<Json<ApiResponse<FlagEvaluation>>, ServiceError> {
    let evaluation = state.services.feature_flags.evaluate(&key, &ctx).await?;
    Ok(Json(ApiResponse::success(evaluation)))
}

#[utoipa::path(
    get,
    path = "/api/v1/app-configs",
    params(SettingKeyQuery),
    responses(
        (status = 200, description = "Config rows by key and scope", body = ApiResponse<Vec<AppConfigResponse>>),
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn list_configs(
    State(state): State<AppState>,
    Query(query): Query<SettingKeyQuery>,
) -> Result<Json<ApiResponse<Vec<AppConfigResponse>>>, ServiceError> {
    let configs = state
        .services
        .app_configs
        .list_configs(query.key.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(configs)))
}

#[utoipa::path(
    put,
    path = "/api/v1/app-configs",
    summary = "Set an app config value",
    request_body = UpsertAppConfigRequest,
    responses(
        (status = 200, description = "Config saved", body = ApiResponse<AppConfigResponse>),
        (status = 400, description = "Invalid key or scope", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn upsert_config(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Json(request): Json<UpsertAppConfigRequest>,
) -> Result<Json<ApiResponse<AppConfigResponse>>, ServiceError> {
    let config = state
        .services
        .app_configs
        .upsert_config(request, Some(admin.id))
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/app-configs/{id}",
    params(("id" = Uuid, Path, description = "Config row id")),
    responses(
        (status = 204, description = "Config row deleted"),
        (status = 404, description = "Config not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn delete_config(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.app_configs.delete_config(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/app-configs/resolve/{key}",
    summary = "Resolve an app config value",
    params(("key" = String, Path, description = "Config key"), ScopeContext),
    responses(
        (status = 200, description = "Most specific applicable value", body = ApiResponse<ResolvedConfig>),
        (status = 404, description = "No value applies", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "settings"
)]
pub async fn resolve_config(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(ctx): Query<ScopeContext>,
) -> Result<Json<ApiResponse<ResolvedConfig>>, ServiceError> {
    let resolved = state.services.app_configs.resolve(&key, &ctx).await?;
    Ok(Json(ApiResponse::success(resolved)))
}
