use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    auth::AdminUser,
    errors::ServiceError,
    handlers::common::resolve_paging,
    services::{
        delivery_partners::{
            AvailabilityRequest, CreateDeliveryPartnerRequest, DeliveryPartnerFilter,
            DeliveryPartnerResponse, LocationRequest, LocationResponse, RejectionRequest,
            RejectionResponse, UpdateDeliveryPartnerRequest,
        },
        list_preferences::PageParams,
    },
    ApiResponse, AppState, PaginatedResponse,
};

const DEFAULT_LOCATION_LIMIT: u64 = 50;
const MAX_LOCATION_LIMIT: u64 = 500;

pub fn delivery_partner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_partners).post(create_partner))
        .route(
            "/:id",
            get(get_partner).put(update_partner).delete(delete_partner),
        )
        .route("/:id/availability", put(set_availability))
        .route("/:id/locations", get(list_locations).post(record_location))
        .route("/:id/rejections", get(list_rejections).post(record_rejection))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationQuery {
    /// Most recent fixes to return (default 50, max 500)
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/delivery-partners",
    params(DeliveryPartnerFilter, PageParams),
    responses(
        (status = 200, description = "Delivery partners retrieved", body = ApiResponse<PaginatedResponse<DeliveryPartnerResponse>>),
    ),
    security(("bearer_auth" = [])),
    tag = "delivery-partners"
)]
pub async fn list_partners(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Query(filter): Query<DeliveryPartnerFilter>,
    Query(paging): Query<PageParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<DeliveryPartnerResponse>>>, ServiceError> {
    let (page, per_page) =
        resolve_paging(&state, &admin, "delivery_partners", paging, &filter).await?;
    let partners = state
        .services
        .delivery_partners
        .list_partners(&filter, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(partners)))
}

#[utoipa::path(
    get,
    path = "/api/v1/delivery-partners/{id}",
    params(("id" = Uuid, Path, description = "Delivery partner id")),
    responses(
        (status = 200, description = "Delivery partner retrieved", body = ApiResponse<DeliveryPartnerResponse>),
        (status = 404, description = "Delivery partner not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "delivery-partners"
)]
pub async fn get_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeliveryPartnerResponse>>, ServiceError> {
    let partner = state.services.delivery_partners.get_partner(id).await?;
    Ok(Json(ApiResponse::success(partner)))
}

#[utoipa::path(
    post,
    path = "/api/v1/delivery-partners",
    request_body = CreateDeliveryPartnerRequest,
    responses(
        (status = 201, description = "Delivery partner created", body = ApiResponse<DeliveryPartnerResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "delivery-partners"
)]
pub async fn create_partner(
    State(state): State<AppState>,
    Json(request): Json<CreateDeliveryPartnerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DeliveryPartnerResponse>>), ServiceError> {
    let partner = state.services.delivery_partners.create_partner(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(partner))))
}

#[utoipa::path(
    put,
    path = "/api/v1/delivery-partners/{id}",
    params(("id" = Uuid, Path, description = "Delivery partner id")),
    request_body = UpdateDeliveryPartnerRequest,
    responses(
        (status = 200, description = "Delivery partner updated", body = ApiResponse<DeliveryPartnerResponse>),
        (status = 404, description = "Delivery partner not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "delivery-partners"
)]
pub async fn update_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDeliveryPartnerRequest>,
) -> Result<Json<ApiResponse<DeliveryPartnerResponse>>, ServiceError> {
    let partner = state
        .services
        .delivery_partners
        .update_partner(id, request)
        .await?;
    Ok(Json(ApiResponse::success(partner)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/delivery-partners/{id}",
    params(("id" = Uuid, Path, description = "Delivery partner id")),
    responses(
        (status = 204, description = "Partner, location history and rejections deleted"),
        (status = 404, description = "Delivery partner not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "delivery-partners"
)]
pub async fn delete_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.delivery_partners.delete_partner(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/v1/delivery-partners/{id}/availability",
    description = "Going offline also clears availability.",
    params(("id" = Uuid, Path, description = "Delivery partner id")),
    request_body = AvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = ApiResponse<DeliveryPartnerResponse>),
        (status = 404, description = "Delivery partner not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "delivery-partners"
)]
pub async fn set_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AvailabilityRequest>,
) -> Result<Json<ApiResponse<DeliveryPartnerResponse>>, ServiceError> {
    let partner = state
        .services
        .delivery_partners
        .set_availability(id, request)
        .await?;
    Ok(Json(ApiResponse::success(partner)))
}

#[utoipa::path(
    post,
    path = "/api/v1/delivery-partners/{id}/locations",
    params(("id" = Uuid, Path, description = "Delivery partner id")),
    request_body = LocationRequest,
    responses(
        (status = 201, description = "Location recorded", body = ApiResponse<LocationResponse>),
        (status = 400, description = "Coordinates out of range", body = crate::errors::ErrorResponse),
        (status = 404, description = "Delivery partner not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "delivery-partners"
)]
pub async fn record_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<LocationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LocationResponse>>), ServiceError> {
    let location = state
        .services
        .delivery_partners
        .record_location(id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(location))))
}

#[utoipa::path(
    get,
    path = "/api/v1/delivery-partners/{id}/locations",
    params(("id" = Uuid, Path, description = "Delivery partner id"), LocationQuery),
    responses(
        (status = 200, description = "Location history, newest first", body = ApiResponse<Vec<LocationResponse>>),
        (status = 404, description = "Delivery partner not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "delivery-partners"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<ApiResponse<Vec<LocationResponse>>>, ServiceError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOCATION_LIMIT)
        .clamp(1, MAX_LOCATION_LIMIT);
    let locations = state
        .services
        .delivery_partners
        .list_locations(id, limit)
        .await?;
    Ok(Json(ApiResponse::success(locations)))
}

#[utoipa::path(
    post,
    path = "/api/v1/delivery-partners/{id}/rejections",
    params(("id" = Uuid, Path, description = "Delivery partner id")),
    request_body = RejectionRequest,
    responses(
        (status = 201, description = "Rejection recorded", body = ApiResponse<RejectionResponse>),
        (status = 404, description = "Delivery partner not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "delivery-partners"
)]
pub async fn record_rejection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RejectionResponse>>), ServiceError> {
    let rejection = state
        .services
        .delivery_partners
        .record_rejection(id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(rejection))))
}

#[utoipa::path(
    get,
    path = "/api/v1/delivery-partners/{id}/rejections",
    params(("id" = Uuid, Path, description = "Delivery partner id")),
    responses(
        (status = 200, description = "Rejected orders, newest first", body = ApiResponse<Vec<RejectionResponse>>),
        (status = 404, description = "Delivery partner not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "delivery-partners"
)]
pub async fn list_rejections(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RejectionResponse>>>, ServiceError> {
    let rejections = state
        .services
        .delivery_partners
        .list_rejections(id)
        .await?;
    Ok(Json(ApiResponse::success(rejections)))
}
