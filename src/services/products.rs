use crate::{
    db::DbPool,
    entities::master_product::{self, Entity as MasterProductEntity},
    entities::product::{self, Entity as ProductEntity, Model as ProductModel, ProductStatus},
    entities::product_variant::{self, Entity as VariantEntity, VariantType},
    errors::ServiceError,
    events::{Event, EventSender},
    reconciliation::{CatalogProduct, CatalogStore, NewCatalogProduct, VariantLink},
    services::{contains_ci, equals_ci, page_index, validate_non_negative},
    PaginatedResponse,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_UNIT: &str = "piece";

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub price: Decimal,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    #[serde(default)]
    pub stock_available: i32,
    pub unit: Option<String>,
    pub seller_id: Uuid,
    pub status: Option<ProductStatus>,
    pub variant_group_id: Option<Uuid>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Create even when the seller already has a product with this name.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock_available: Option<i32>,
    pub unit: Option<String>,
    pub seller_id: Option<Uuid>,
    pub status: Option<ProductStatus>,
    pub variant_group_id: Option<Uuid>,
    pub image_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    pub seller_id: Option<Uuid>,
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
    pub variant_group_id: Option<Uuid>,
    /// Case-insensitive match on name or description
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub stock_available: i32,
    pub unit: String,
    pub seller_id: Uuid,
    pub status: ProductStatus,
    pub variant_group_id: Option<Uuid>,
    pub image_urls: Vec<String>,
    pub master_product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductModel> for ProductResponse {
    fn from(model: ProductModel) -> Self {
        let image_urls = model.image_list();
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            category: model.category,
            subcategory: model.subcategory,
            stock_available: model.stock_available,
            unit: model.unit,
            seller_id: model.seller_id,
            status: model.status,
            variant_group_id: model.variant_group_id,
            image_urls,
            master_product_id: model.master_product_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DuplicateCheckResult {
    pub is_duplicate: bool,
    pub existing_product_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DuplicateCheckRequest {
    #[validate(length(min = 1))]
    pub name: String,
    pub seller_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateVariantRequest {
    #[validate(length(min = 1, max = 100))]
    pub sku: String,
    pub variant_type: VariantType,
    #[validate(length(min = 1, max = 100))]
    pub variant_value: String,
    #[validate(custom = "validate_non_negative")]
    pub price: Decimal,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub display_order: i32,
    pub variant_product_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateVariantRequest {
    #[validate(length(min = 1, max = 100))]
    pub sku: Option<String>,
    pub variant_type: Option<VariantType>,
    #[validate(length(min = 1, max = 100))]
    pub variant_value: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    pub is_default: Option<bool>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VariantResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub variant_type: VariantType,
    pub variant_value: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub is_default: bool,
    pub display_order: i32,
    pub variant_product_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<product_variant::Model> for VariantResponse {
    fn from(model: product_variant::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            sku: model.sku,
            variant_type: model.variant_type,
            variant_value: model.variant_value,
            price: model.price,
            stock_quantity: model.stock_quantity,
            is_default: model.is_default,
            display_order: model.display_order,
            variant_product_id: model.variant_product_id,
            created_at: model.created_at,
        }
    }
}

/// Every product sharing a variant group, plus the variant rows between them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VariantGroupView {
    pub variant_group_id: Uuid,
    pub products: Vec<ProductResponse>,
    pub variants: Vec<VariantResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMasterProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub unit: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub suggested_price: Decimal,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MasterProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub unit: String,
    pub suggested_price: Decimal,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<master_product::Model> for MasterProductResponse {
    fn from(model: master_product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            category: model.category,
            subcategory: model.subcategory,
            unit: model.unit,
            suggested_price: model.suggested_price,
            image_urls: serde_json::from_value(model.image_urls).unwrap_or_default(),
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CloneMasterProductRequest {
    pub seller_id: Uuid,
    #[validate(custom = "validate_non_negative")]
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock_available: Option<i32>,
    #[serde(default)]
    pub force: bool,
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn image_json(urls: &[String]) -> serde_json::Value {
    serde_json::Value::Array(
        urls.iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(|u| serde_json::Value::String(u.to_string()))
            .collect(),
    )
}

pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Case-insensitive name match within one seller's inventory.
    #[instrument(skip(self))]
    pub async fn check_duplicate(
        &self,
        name: &str,
        seller_id: Uuid,
    ) -> Result<DuplicateCheckResult, ServiceError> {
        let existing = ProductEntity::find()
            .filter(product::Column::SellerId.eq(seller_id))
            .filter(equals_ci(product::Column::Name, name))
            .order_by_asc(product::Column::CreatedAt)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Duplicate check failed");
                ServiceError::DatabaseError(e)
            })?;

        Ok(DuplicateCheckResult {
            is_duplicate: existing.is_some(),
            existing_product_id: existing.map(|p| p.id),
        })
    }

    #[instrument(skip(self, filter))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: u64,
        per_page: u64,
    ) -> Result<PaginatedResponse<ProductResponse>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(seller_id) = filter.seller_id {
            condition = condition.add(product::Column::SellerId.eq(seller_id));
        }
        if let Some(category) = filter.category.as_deref().filter(|c| !c.trim().is_empty()) {
            condition = condition.add(equals_ci(product::Column::Category, category));
        }
        if let Some(status) = filter.status {
            condition = condition.add(product::Column::Status.eq(status));
        }
        if let Some(group_id) = filter.variant_group_id {
            condition = condition.add(product::Column::VariantGroupId.eq(group_id));
        }
        if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(contains_ci(product::Column::Name, term))
                    .add(contains_ci(product::Column::Description, term)),
            );
        }

        let paginator = ProductEntity::find()
            .filter(condition)
            .order_by_desc(product::Column::CreatedAt)
            .paginate(&*self.db_pool, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count products");
            ServiceError::DatabaseError(e)
        })?;
        let products = paginator.fetch_page(page_index(page)).await.map_err(|e| {
            error!(error = %e, page, per_page, "Failed to fetch products page");
            ServiceError::DatabaseError(e)
        })?;

        let items: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
        info!(total, page, per_page, returned = items.len(), "Products listed");
        Ok(PaginatedResponse::new(items, total, page, per_page))
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductResponse, ServiceError> {
        self.find_model(product_id).await.map(Into::into)
    }

    /// Creates a product. Exact (name, seller) duplicates are refused with a
    /// conflict unless `force` is set.
    #[instrument(skip(self, request), fields(seller_id = %request.seller_id, name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;

        if !request.force {
            let duplicate = self.check_duplicate(&request.name, request.seller_id).await?;
            if let Some(existing) = duplicate.existing_product_id {
                warn!(%existing, "Refusing duplicate product");
                return Err(ServiceError::Conflict(format!(
                    "Seller already has a product named '{}' ({})",
                    request.name.trim(),
                    existing
                )));
            }
        }

        let now = Utc::now();
        let status = request.status.unwrap_or(if request.stock_available > 0 {
            ProductStatus::Available
        } else {
            ProductStatus::OutOfStock
        });

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            description: Set(normalize_optional(request.description)),
            price: Set(request.price),
            category: Set(normalize_optional(request.category)),
            subcategory: Set(normalize_optional(request.subcategory)),
            stock_available: Set(request.stock_available),
            unit: Set(normalize_optional(request.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string())),
            seller_id: Set(request.seller_id),
            status: Set(status),
            variant_group_id: Set(request.variant_group_id),
            image_urls: Set(image_json(&request.image_urls)),
            master_product_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert product");
            ServiceError::DatabaseError(e)
        })?;

        self.event_sender
            .send_or_log(Event::ProductCreated {
                product_id: model.id,
                seller_id: model.seller_id,
            })
            .await;
        info!(product_id = %model.id, "Product created");
        Ok(model.into())
    }

    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;
        let existing = self.find_model(product_id).await?;

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = request.description {
            active.description = Set(normalize_optional(Some(description)));
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(category) = request.category {
            active.category = Set(normalize_optional(Some(category)));
        }
        if let Some(subcategory) = request.subcategory {
            active.subcategory = Set(normalize_optional(Some(subcategory)));
        }
        if let Some(stock) = request.stock_available {
            active.stock_available = Set(stock);
        }
        if let Some(unit) = normalize_optional(request.unit) {
            active.unit = Set(unit);
        }
        if let Some(seller_id) = request.seller_id {
            active.seller_id = Set(seller_id);
        }
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        if let Some(group_id) = request.variant_group_id {
            active.variant_group_id = Set(Some(group_id));
        }
        if let Some(urls) = request.image_urls {
            active.image_urls = Set(image_json(&urls));
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&*self.db_pool).await.map_err(|e| {
            error!(error = %e, "Failed to update product");
            ServiceError::DatabaseError(e)
        })?;

        self.event_sender.send_or_log(Event::ProductUpdated(product_id)).await;
        Ok(model.into())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        // Rows where the product is the base or the linked sibling.
        VariantEntity::delete_many()
            .filter(
                Condition::any()
                    .add(product_variant::Column::ProductId.eq(product_id))
                    .add(product_variant::Column::VariantProductId.eq(product_id)),
            )
            .exec(&txn)
            .await?;
        let result = ProductEntity::delete_by_id(product_id).exec(&txn).await?;
        if result.rows_affected == 0 {
            warn!("Delete requested for missing product");
            return Err(ServiceError::not_found("Product", product_id));
        }

        txn.commit().await?;
        self.event_sender.send_or_log(Event::ProductDeleted(product_id)).await;
        info!("Product deleted");
        Ok(())
    }

    /// Variant rows whose base is `product_id`, in display order.
    pub async fn list_variants(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<VariantResponse>, ServiceError> {
        self.find_model(product_id).await?;
        let variants = VariantEntity::find()
            .filter(product_variant::Column::ProductId.eq(product_id))
            .order_by_asc(product_variant::Column::DisplayOrder)
            .order_by_asc(product_variant::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok(variants.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn create_variant(
        &self,
        product_id: Uuid,
        request: CreateVariantRequest,
    ) -> Result<VariantResponse, ServiceError> {
        request.validate()?;
        self.find_model(product_id).await?;

        let now = Utc::now();
        let model = product_variant::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            sku: Set(request.sku.trim().to_string()),
            variant_type: Set(request.variant_type),
            variant_value: Set(request.variant_value.trim().to_string()),
            price: Set(request.price),
            stock_quantity: Set(request.stock_quantity),
            is_default: Set(request.is_default),
            display_order: Set(request.display_order),
            variant_product_id: Set(request.variant_product_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert product variant");
            ServiceError::DatabaseError(e)
        })?;

        Ok(model.into())
    }

    #[instrument(skip(self, request), fields(variant_id = %variant_id))]
    pub async fn update_variant(
        &self,
        variant_id: Uuid,
        request: UpdateVariantRequest,
    ) -> Result<VariantResponse, ServiceError> {
        request.validate()?;
        let existing = VariantEntity::find_by_id(variant_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product variant", variant_id))?;

        let mut active: product_variant::ActiveModel = existing.into();
        if let Some(sku) = request.sku {
            active.sku = Set(sku.trim().to_string());
        }
        if let Some(variant_type) = request.variant_type {
            active.variant_type = Set(variant_type);
        }
        if let Some(value) = request.variant_value {
            active.variant_value = Set(value.trim().to_string());
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(stock) = request.stock_quantity {
            active.stock_quantity = Set(stock);
        }
        if let Some(is_default) = request.is_default {
            active.is_default = Set(is_default);
        }
        if let Some(order) = request.display_order {
            active.display_order = Set(order);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db_pool).await?.into())
    }

    pub async fn delete_variant(&self, variant_id: Uuid) -> Result<(), ServiceError> {
        let result = VariantEntity::delete_by_id(variant_id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Product variant", variant_id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_variant_group(
        &self,
        variant_group_id: Uuid,
    ) -> Result<VariantGroupView, ServiceError> {
        let db = &*self.db_pool;
        let products = ProductEntity::find()
            .filter(product::Column::VariantGroupId.eq(variant_group_id))
            .order_by_asc(product::Column::CreatedAt)
            .all(db)
            .await?;
        if products.is_empty() {
            return Err(ServiceError::not_found("Variant group", variant_group_id));
        }

        let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
        let variants = VariantEntity::find()
            .filter(product_variant::Column::ProductId.is_in(ids))
            .order_by_asc(product_variant::Column::DisplayOrder)
            .all(db)
            .await?;

        Ok(VariantGroupView {
            variant_group_id,
            products: products.into_iter().map(Into::into).collect(),
            variants: variants.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn list_master_products(
        &self,
        search: Option<&str>,
        page: u64,
        per_page: u64,
    ) -> Result<PaginatedResponse<MasterProductResponse>, ServiceError> {
        let mut query = MasterProductEntity::find().order_by_asc(master_product::Column::Name);
        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            query = query.filter(contains_ci(master_product::Column::Name, term));
        }

        let paginator = query.paginate(&*self.db_pool, per_page);
        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(page_index(page))
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(PaginatedResponse::new(items, total, page, per_page))
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_master_product(
        &self,
        request: CreateMasterProductRequest,
    ) -> Result<MasterProductResponse, ServiceError> {
        request.validate()?;
        let now = Utc::now();
        let model = master_product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            description: Set(normalize_optional(request.description)),
            category: Set(normalize_optional(request.category)),
            subcategory: Set(normalize_optional(request.subcategory)),
            unit: Set(normalize_optional(request.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string())),
            suggested_price: Set(request.suggested_price),
            image_urls: Set(image_json(&request.image_urls)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await?;
        info!(master_product_id = %model.id, "Master product created");
        Ok(model.into())
    }

    /// Copies a master catalog template into a seller's inventory.
    #[instrument(skip(self, request), fields(master_id = %master_id, seller_id = %request.seller_id))]
    pub async fn clone_master_product(
        &self,
        master_id: Uuid,
        request: CloneMasterProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request.validate()?;
        let master = MasterProductEntity::find_by_id(master_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Master product", master_id))?;

        let image_urls: Vec<String> =
            serde_json::from_value(master.image_urls.clone()).unwrap_or_default();
        let created = self
            .create_product(CreateProductRequest {
                name: master.name.clone(),
                description: master.description.clone(),
                price: request.price.unwrap_or(master.suggested_price),
                category: master.category.clone(),
                subcategory: master.subcategory.clone(),
                stock_available: request.stock_available.unwrap_or(0),
                unit: Some(master.unit.clone()),
                seller_id: request.seller_id,
                status: None,
                variant_group_id: None,
                image_urls,
                force: request.force,
            })
            .await?;

        let mut active: product::ActiveModel = self.find_model(created.id).await?.into();
        active.master_product_id = Set(Some(master_id));
        let model = active.update(&*self.db_pool).await?;

        self.event_sender
            .send_or_log(Event::MasterProductCloned {
                master_product_id: master_id,
                product_id: model.id,
                seller_id: model.seller_id,
            })
            .await;
        Ok(model.into())
    }

    async fn find_model(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        ProductEntity::find_by_id(product_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, %product_id, "Failed to load product");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))
    }
}

fn to_catalog(model: ProductModel) -> CatalogProduct {
    CatalogProduct {
        id: model.id,
        name: model.name,
        variant_group_id: model.variant_group_id,
    }
}

#[async_trait]
impl CatalogStore for ProductService {
    async fn seller_products(&self, seller_id: Uuid) -> Result<Vec<CatalogProduct>, ServiceError> {
        let products = ProductEntity::find()
            .filter(product::Column::SellerId.eq(seller_id))
            .order_by_asc(product::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok(products.into_iter().map(to_catalog).collect())
    }

    async fn insert_product(
        &self,
        product: NewCatalogProduct,
    ) -> Result<CatalogProduct, ServiceError> {
        let created = self
            .create_product(CreateProductRequest {
                name: product.name,
                description: None,
                price: product.price,
                category: product.category,
                subcategory: product.subcategory,
                stock_available: product.stock,
                unit: product.unit,
                seller_id: product.seller_id,
                status: None,
                variant_group_id: product.variant_group_id,
                image_urls: Vec::new(),
                force: true,
            })
            .await?;
        Ok(CatalogProduct {
            id: created.id,
            name: created.name,
            variant_group_id: created.variant_group_id,
        })
    }

    async fn assign_variant_group(
        &self,
        product_id: Uuid,
        variant_group_id: Uuid,
    ) -> Result<(), ServiceError> {
        let mut active: product::ActiveModel = self.find_model(product_id).await?.into();
        active.variant_group_id = Set(Some(variant_group_id));
        active.updated_at = Set(Utc::now());
        active.update(&*self.db_pool).await?;

        self.event_sender
            .send_or_log(Event::VariantGroupAssigned {
                product_id,
                variant_group_id,
            })
            .await;
        Ok(())
    }

    async fn link_variant(&self, link: VariantLink) -> Result<Uuid, ServiceError> {
        let created = self
            .create_variant(
                link.base_product_id,
                CreateVariantRequest {
                    sku: link.sku,
                    variant_type: link.variant_type,
                    variant_value: link.variant_value,
                    price: link.price,
                    stock_quantity: link.stock_quantity.max(0),
                    is_default: link.is_default,
                    display_order: link.display_order,
                    variant_product_id: Some(link.variant_product_id),
                },
            )
            .await
            .map_err(|e| match e {
                // The (product_id, variant_product_id) index rejects relinks.
                ServiceError::DatabaseError(db_err)
                    if matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
                {
                    ServiceError::Conflict("Variant link already exists".to_string())
                }
                other => other,
            })?;
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_text_is_trimmed_and_blank_dropped() {
        assert_eq!(normalize_optional(Some("  Dairy ".into())), Some("Dairy".into()));
        assert_eq!(normalize_optional(Some("   ".into())), None);
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn image_list_skips_blank_urls() {
        let json = image_json(&["https://cdn/a.png".into(), " ".into()]);
        assert_eq!(json, serde_json::json!(["https://cdn/a.png"]));
    }

    #[test]
    fn create_request_defaults_force_to_false() {
        let request: CreateProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Amul Butter 100g",
            "price": "56.00",
            "seller_id": Uuid::nil(),
        }))
        .unwrap();
        assert!(!request.force);
        assert_eq!(request.stock_available, 0);
        assert!(request.validate().is_ok());
    }
}
