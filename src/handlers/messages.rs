use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::AdminUser,
    errors::ServiceError,
    handlers::common::resolve_paging,
    services::{
        admin_messages::{
            AdminMessageFilter, AdminMessageResponse, CreateAdminMessageRequest,
            UpdateAdminMessageRequest,
        },
        list_preferences::PageParams,
        scoping::ScopeContext,
    },
    ApiResponse, AppState, PaginatedResponse,
};

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_messages).post(create_message))
        .route("/active", get(active_messages))
        .route(
            "/:id",
            get(get_message).put(update_message).delete(delete_message),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/messages",
    summary = "List admin messages",
    params(AdminMessageFilter, PageParams),
    responses(
        (status = 200, description = "Messages by priority, newest first", body = ApiResponse<PaginatedResponse<AdminMessageResponse>>),
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Query(filter): Query<AdminMessageFilter>,
    Query(paging): Query<PageParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<AdminMessageResponse>>>, ServiceError> {
    let (page, per_page) = resolve_paging(&state, &admin, "messages", paging, &filter).await?;
    let messages = state
        .services
        .admin_messages
        .list_messages(&filter, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(messages)))
}

#[utoipa::path(
    get,
    path = "/api/v1/messages/active",
    summary = "Messages visible to an audience",
    description = "Active, in-window messages whose scope applies to the given role, region or user.",
    params(ScopeContext),
    responses(
        (status = 200, description = "Live messages for the audience", body = ApiResponse<Vec<AdminMessageResponse>>),
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn active_messages(
    State(state): State<AppState>,
    Query(ctx): Query<ScopeContext>,
) -> Result<Json<ApiResponse<Vec<AdminMessageResponse>>>, ServiceError> {
    let messages = state
        .services
        .admin_messages
        .active_for(&ctx, Utc::now())
        .await?;
    Ok(Json(ApiResponse::success(messages)))
}

#[utoipa::path(
    get,
    path = "/api/v1/messages/{id}",
    params(("id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message retrieved", body = ApiResponse<AdminMessageResponse>),
        (status = 404, description = "Message not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AdminMessageResponse>>, ServiceError> {
    let message = state.services.admin_messages.get_message(id).await?;
    Ok(Json(ApiResponse::success(message)))
}

#[utoipa::path(
    post,
    path = "/api/v1/messages",
    request_body = CreateAdminMessageRequest,
    responses(
        (status = 201, description = "Message created", body = ApiResponse<AdminMessageResponse>),
        (status = 400, description = "Invalid scope or window", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn create_message(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Json(request): Json<CreateAdminMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AdminMessageResponse>>), ServiceError> {
    let message = state
        .services
        .admin_messages
        .create_message(request, Some(admin.id))
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(message))))
}

#[utoipa::path(
    put,
    path = "/api/v1/messages/{id}",
    params(("id" = Uuid, Path, description = "Message id")),
    request_body = UpdateAdminMessageRequest,
    responses(
        (status = 200, description = "Message updated", body = ApiResponse<AdminMessageResponse>),
        (status = 404, description = "Message not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn update_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAdminMessageRequest>,
) -> Result<Json<ApiResponse<AdminMessageResponse>>, ServiceError> {
    let message = state
        .services
        .admin_messages
        .update_message(id, request)
        .await?;
    Ok(Json(ApiResponse::success(message)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/messages/{id}",
    params(("id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 204, description = "Message deleted"),
        (status = 404, description = "Message not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.admin_messages.delete_message(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
