use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AdminUser,
    errors::ServiceError,
    handlers::common::resolve_paging,
    services::{
        list_preferences::PageParams,
        products::{
            CloneMasterProductRequest, CreateMasterProductRequest, CreateProductRequest,
            CreateVariantRequest, DuplicateCheckRequest, DuplicateCheckResult,
            MasterProductResponse, ProductFilter, ProductResponse, UpdateProductRequest,
            UpdateVariantRequest, VariantGroupView, VariantResponse,
        },
    },
    ApiResponse, AppState, PaginatedResponse,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/check-duplicate", post(check_duplicate))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/variants", get(list_variants).post(create_variant))
}

pub fn variant_routes() -> Router<AppState> {
    Router::new().route("/:id", put(update_variant).delete(delete_variant))
}

pub fn variant_group_routes() -> Router<AppState> {
    Router::new().route("/:id", get(get_variant_group))
}

pub fn master_product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_master_products).post(create_master_product))
        .route("/:id/clone", post(clone_master_product))
}

#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MasterProductQuery {
    /// Case-insensitive match on name
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    summary = "List products",
    description = "Paginated products filtered by seller, category, status, variant group or a search term.",
    params(ProductFilter, PageParams),
    responses(
        (status = 200, description = "Products retrieved", body = ApiResponse<PaginatedResponse<ProductResponse>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Query(filter): Query<ProductFilter>,
    Query(paging): Query<PageParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<ProductResponse>>>, ServiceError> {
    let (page, per_page) = resolve_paging(&state, &admin, "products", paging, &filter).await?;
    let products = state
        .services
        .products
        .list_products(&filter, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(products)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products/check-duplicate",
    summary = "Check for a duplicate product",
    description = "Case-insensitive exact name match within the seller's inventory.",
    request_body = DuplicateCheckRequest,
    responses(
        (status = 200, description = "Duplicate check result", body = ApiResponse<DuplicateCheckResult>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn check_duplicate(
    State(state): State<AppState>,
    Json(request): Json<DuplicateCheckRequest>,
) -> Result<Json<ApiResponse<DuplicateCheckResult>>, ServiceError> {
    request.validate()?;
    let result = state
        .services
        .products
        .check_duplicate(&request.name, request.seller_id)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    summary = "Get product",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product retrieved", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProductResponse>>, ServiceError> {
    let product = state.services.products.get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    summary = "Create product",
    description = "Refused with 409 when the seller already has a product with the same name, unless `force` is set.",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate product", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ServiceError> {
    let product = state.services.products.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    summary = "Update product",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, ServiceError> {
    let product = state.services.products.update_product(id, request).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    summary = "Delete product",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product and its variant links deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.products.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/variants",
    summary = "List product variants",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Variants in display order", body = ApiResponse<Vec<VariantResponse>>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn list_variants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<VariantResponse>>>, ServiceError> {
    let variants = state.services.products.list_variants(id).await?;
    Ok(Json(ApiResponse::success(variants)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/variants",
    summary = "Link a variant",
    params(("id" = Uuid, Path, description = "Base product id")),
    request_body = CreateVariantRequest,
    responses(
        (status = 201, description = "Variant linked", body = ApiResponse<VariantResponse>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Variant already linked", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn create_variant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateVariantRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VariantResponse>>), ServiceError> {
    let variant = state.services.products.create_variant(id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(variant))))
}

#[utoipa::path(
    put,
    path = "/api/v1/variants/{id}",
    summary = "Update variant",
    params(("id" = Uuid, Path, description = "Variant id")),
    request_body = UpdateVariantRequest,
    responses(
        (status = 200, description = "Variant updated", body = ApiResponse<VariantResponse>),
        (status = 404, description = "Variant not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn update_variant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVariantRequest>,
) -> Result<Json<ApiResponse<VariantResponse>>, ServiceError> {
    let variant = state.services.products.update_variant(id, request).await?;
    Ok(Json(ApiResponse::success(variant)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/variants/{id}",
    summary = "Delete variant",
    params(("id" = Uuid, Path, description = "Variant id")),
    responses(
        (status = 204, description = "Variant link removed"),
        (status = 404, description = "Variant not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn delete_variant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.products.delete_variant(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/variant-groups/{id}",
    summary = "Get variant group",
    params(("id" = Uuid, Path, description = "Variant group id")),
    responses(
        (status = 200, description = "Products and variants in the group", body = ApiResponse<VariantGroupView>),
        (status = 404, description = "No products in this group", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn get_variant_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VariantGroupView>>, ServiceError> {
    let group = state.services.products.get_variant_group(id).await?;
    Ok(Json(ApiResponse::success(group)))
}

#[utoipa::path(
    get,
    path = "/api/v1/master-products",
    summary = "List master catalog",
    params(MasterProductQuery, PageParams),
    responses(
        (status = 200, description = "Master products by name", body = ApiResponse<PaginatedResponse<MasterProductResponse>>),
    ),
    security(("bearer_auth" = [])),
    tag = "master-products"
)]
pub async fn list_master_products(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminUser>,
    Query(query): Query<MasterProductQuery>,
    Query(paging): Query<PageParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<MasterProductResponse>>>, ServiceError> {
    let (page, per_page) =
        resolve_paging(&state, &admin, "master_products", paging, &query).await?;
    let masters = state
        .services
        .products
        .list_master_products(query.search.as_deref(), page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(masters)))
}

#[utoipa::path(
    post,
    path = "/api/v1/master-products",
    summary = "Create master product",
    request_body = CreateMasterProductRequest,
    responses(
        (status = 201, description = "Master product created", body = ApiResponse<MasterProductResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "master-products"
)]
pub async fn create_master_product(
    State(state): State<AppState>,
    Json(request): Json<CreateMasterProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MasterProductResponse>>), ServiceError> {
    let master = state.services.products.create_master_product(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(master))))
}

#[utoipa::path(
    post,
    path = "/api/v1/master-products/{id}/clone",
    summary = "Clone into a seller's inventory",
    description = "Creates a seller product from a master catalog entry, overriding price and stock when given.",
    params(("id" = Uuid, Path, description = "Master product id")),
    request_body = CloneMasterProductRequest,
    responses(
        (status = 201, description = "Seller product created", body = ApiResponse<ProductResponse>),
        (status = 404, description = "Master product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Seller already has this product", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "master-products"
)]
pub async fn clone_master_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CloneMasterProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ServiceError> {
    let product = state
        .services
        .products
        .clone_master_product(id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}
