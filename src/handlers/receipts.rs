use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    handlers::common::read_upload,
    reconciliation::{ReceiptCandidate, ReconciliationReport},
    ApiResponse, AppState,
};

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

pub fn receipt_routes() -> Router<AppState> {
    Router::new()
        .route("/extract", post(extract_receipt))
        .route("/reconcile", post(reconcile_receipt))
        .route("/import", post(import_receipt))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReconcileRequest {
    pub seller_id: Uuid,
    pub candidates: Vec<ReceiptCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExtractedReceipt {
    pub candidates: Vec<ReceiptCandidate>,
}

/// Multipart body for receipt images.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ReceiptUploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// Required by `/receipts/import`
    seller_id: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/receipts/extract",
    summary = "Read product lines from a receipt image",
    description = "Returns the candidates for review; nothing is written.",
    request_body(content = ReceiptUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Extracted candidates", body = ApiResponse<ExtractedReceipt>),
        (status = 400, description = "Missing or empty image", body = crate::errors::ErrorResponse),
        (status = 502, description = "OCR provider failed", body = crate::errors::ErrorResponse),
        (status = 503, description = "OCR not configured", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "receipts"
)]
pub async fn extract_receipt(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ExtractedReceipt>>, ServiceError> {
    let upload = read_upload(multipart).await?;
    let mime = upload.content_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME);
    let candidates = state.services.receipts.extract(&upload.file, mime).await?;
    Ok(Json(ApiResponse::success(ExtractedReceipt { candidates })))
}

#[utoipa::path(
    post,
    path = "/api/v1/receipts/reconcile",
    summary = "Reconcile receipt lines with a seller's inventory",
    description = "Groups lines into variant families, reuses matching products and creates the rest.",
    request_body = ReconcileRequest,
    responses(
        (status = 200, description = "Per-line outcome and totals", body = ApiResponse<ReconciliationReport>),
        (status = 400, description = "No candidates or an invalid line", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "receipts"
)]
pub async fn reconcile_receipt(
    State(state): State<AppState>,
    Json(request): Json<ReconcileRequest>,
) -> Result<Json<ApiResponse<ReconciliationReport>>, ServiceError> {
    let report = state
        .services
        .receipts
        .reconcile(request.seller_id, request.candidates)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

#[utoipa::path(
    post,
    path = "/api/v1/receipts/import",
    summary = "Extract and reconcile in one step",
    request_body(content = ReceiptUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Per-line outcome and totals", body = ApiResponse<ReconciliationReport>),
        (status = 400, description = "Missing image or seller_id", body = crate::errors::ErrorResponse),
        (status = 503, description = "OCR not configured", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "receipts"
)]
pub async fn import_receipt(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ReconciliationReport>>, ServiceError> {
    let upload = read_upload(multipart).await?;
    let seller_id = upload
        .uuid_field("seller_id")?
        .ok_or_else(|| ServiceError::BadRequest("seller_id is required".into()))?;
    let mime = upload.content_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME);
    let report = state
        .services
        .receipts
        .import(seller_id, &upload.file, mime)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}
