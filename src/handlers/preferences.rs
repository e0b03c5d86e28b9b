use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};

use crate::{
    auth::AdminUser, errors::ServiceError, services::list_preferences::ListState, ApiResponse,
    AppState,
};

/// Saved paging and filters for the calling admin, keyed by list key
/// (e.g. `products?category=snacks`).
pub fn preference_routes() -> Router<AppState> {
    Router::new().route("/lists/:list_key", get(get_list_state).put(save_list_state))
}

#[utoipa::path(
    get,
    path = "/api/v1/preferences/lists/{list_key}",
    params(("list_key" = String, Path, description = "List key")),
    responses(
        (status = 200, description = "Saved state, or page 1 with the default page size", body = ApiResponse<ListState>),
    ),
    security(("bearer_auth" = [])),
    tag = "preferences"
)]
pub async fn get_list_state(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Path(list_key): Path<String>,
) -> Result<Json<ApiResponse<ListState>>, ServiceError> {
    let saved = state.services.list_preferences.get(admin.id, &list_key).await?;
    Ok(Json(ApiResponse::success(saved)))
}

#[utoipa::path(
    put,
    path = "/api/v1/preferences/lists/{list_key}",
    params(("list_key" = String, Path, description = "List key")),
    request_body = ListState,
    responses(
        (status = 200, description = "State saved; page size is capped", body = ApiResponse<ListState>),
        (status = 400, description = "Page or page size below 1", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "preferences"
)]
pub async fn save_list_state(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Path(list_key): Path<String>,
    Json(request): Json<ListState>,
) -> Result<Json<ApiResponse<ListState>>, ServiceError> {
    let saved = state
        .services
        .list_preferences
        .save(admin.id, &list_key, request)
        .await?;
    Ok(Json(ApiResponse::success(saved)))
}
