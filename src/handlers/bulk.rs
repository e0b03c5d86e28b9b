use axum::{extract::State, routing::post, Json, Router};

use crate::{
    errors::ServiceError,
    services::bulk::{BulkRequest, BulkResult},
    ApiResponse, AppState,
};

pub fn bulk_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(bulk_products))
        .route("/orders", post(bulk_orders))
}

#[utoipa::path(
    post,
    path = "/api/v1/bulk/products",
    summary = "Bulk update products",
    description = "Applies one operation to every id. Operations: update_status, update_price, set_stock, update_category, delete. Per-id failures are reported without stopping the batch.",
    request_body = BulkRequest,
    responses(
        (status = 200, description = "Per-id outcome", body = ApiResponse<BulkResult>),
        (status = 400, description = "Empty id list or unknown operation", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "bulk"
)]
pub async fn bulk_products(
    State(state): State<AppState>,
    Json(request): Json<BulkRequest>,
) -> Result<Json<ApiResponse<BulkResult>>, ServiceError> {
    let result = state.services.bulk.bulk_update_products(request).await?;
    Ok(Json(ApiResponse::success(result)))
}

#[utoipa::path(
    post,
    path = "/api/v1/bulk/orders",
    summary = "Bulk update orders",
    description = "Operations: update_status, delete.",
    request_body = BulkRequest,
    responses(
        (status = 200, description = "Per-id outcome", body = ApiResponse<BulkResult>),
        (status = 400, description = "Empty id list or unknown operation", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "bulk"
)]
pub async fn bulk_orders(
    State(state): State<AppState>,
    Json(request): Json<BulkRequest>,
) -> Result<Json<ApiResponse<BulkResult>>, ServiceError> {
    let result = state.services.bulk.bulk_update_orders(request).await?;
    Ok(Json(ApiResponse::success(result)))
}
