use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use utoipa::ToSchema;

use crate::{
    errors::ServiceError,
    handlers::common::read_upload,
    services::imports::{CsvPreview, ImportResult},
    ApiResponse, AppState,
};

const MAX_CSV_BYTES: usize = 5 * 1024 * 1024;

pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/products/preview", post(preview_products))
        .route("/products", post(import_products))
        .layer(DefaultBodyLimit::max(MAX_CSV_BYTES))
}

/// Multipart body for CSV uploads.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct CsvUploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// Seller for rows without a `seller_id` column
    seller_id: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/imports/products/preview",
    summary = "Preview a product CSV",
    description = "Reads the header and rows without importing anything.",
    request_body(content = CsvUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Header and rows as read", body = ApiResponse<CsvPreview>),
        (status = 400, description = "Missing, empty or unreadable file", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "imports"
)]
pub async fn preview_products(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<CsvPreview>>, ServiceError> {
    let upload = read_upload(multipart).await?;
    let preview = state.services.imports.preview(&upload.file)?;
    Ok(Json(ApiResponse::success(preview)))
}

#[utoipa::path(
    post,
    path = "/api/v1/imports/products",
    summary = "Import products from CSV",
    description = "One product per row. Rows that fail are reported by row number; the rest are created.",
    request_body(content = CsvUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import summary", body = ApiResponse<ImportResult>),
        (status = 400, description = "Unreadable file, missing columns or too many rows", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "imports"
)]
pub async fn import_products(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ImportResult>>, ServiceError> {
    let upload = read_upload(multipart).await?;
    let seller_id = upload.uuid_field("seller_id")?;
    let result = state
        .services
        .imports
        .import_products(&upload.file, seller_id)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}
