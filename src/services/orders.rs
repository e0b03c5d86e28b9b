use crate::{
    db::DbPool,
    entities::order::{self, Entity as OrderEntity, Model as OrderModel, OrderStatus},
    entities::order_item::{self, Entity as OrderItemEntity, Model as OrderItemModel},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{contains_ci, page_index, validate_non_negative},
    PaginatedResponse,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Alias, Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Where an order should be delivered. Older clients send a single free-text
/// line; newer ones send a structured address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum DeliveryAddress {
    Text(String),
    Structured(StructuredAddress),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StructuredAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub landmark: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl DeliveryAddress {
    fn to_json(&self) -> serde_json::Value {
        match self {
            DeliveryAddress::Text(text) => serde_json::Value::String(text.trim().to_string()),
            DeliveryAddress::Structured(address) => {
                serde_json::to_value(address).unwrap_or(serde_json::Value::Null)
            }
        }
    }

    fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            other => serde_json::from_value(other).ok(),
        }
    }

    /// Single-line rendering for lists and exports.
    pub fn display_line(&self) -> String {
        match self {
            DeliveryAddress::Text(text) => text.clone(),
            DeliveryAddress::Structured(a) => [
                Some(a.line1.as_str()),
                a.line2.as_deref(),
                a.city.as_deref(),
                a.state.as_deref(),
                a.postal_code.as_deref(),
                a.country.as_deref(),
            ]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemInput {
    pub product_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Product name is required"))]
    pub product_name: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom = "validate_non_negative")]
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub retailer_id: Uuid,
    pub seller_id: Uuid,
    pub status: Option<OrderStatus>,
    #[validate(length(min = 1, message = "An order needs at least one item"))]
    pub items: Vec<OrderItemInput>,
    /// Defaults to the sum of quantity x price over the items.
    #[validate(custom = "validate_non_negative")]
    pub total_amount: Option<Decimal>,
    pub delivery_address: Option<DeliveryAddress>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderRequest {
    pub retailer_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    #[validate(custom = "validate_non_negative")]
    pub total_amount: Option<Decimal>,
    pub delivery_address: Option<DeliveryAddress>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub seller_id: Option<Uuid>,
    pub retailer_id: Option<Uuid>,
    /// Order id, or text in the delivery address or notes
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

impl From<OrderItemModel> for OrderItemResponse {
    fn from(item: OrderItemModel) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub retailer_id: Uuid,
    pub seller_id: Uuid,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub delivery_address: Option<DeliveryAddress>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sum of quantity x price. Fails instead of overflowing.
pub fn items_total(items: &[OrderItemInput]) -> Result<Decimal, ServiceError> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        item.price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| {
                ServiceError::ValidationError("Order total is too large".to_string())
            })
    })
}

pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, filter))]
    pub async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: u64,
        per_page: u64,
    ) -> Result<PaginatedResponse<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let mut condition = Condition::all();
        if let Some(status) = filter.status {
            condition = condition.add(order::Column::Status.eq(status));
        }
        if let Some(seller_id) = filter.seller_id {
            condition = condition.add(order::Column::SellerId.eq(seller_id));
        }
        if let Some(retailer_id) = filter.retailer_id {
            condition = condition.add(order::Column::RetailerId.eq(retailer_id));
        }
        if let Some(from) = filter.created_from {
            condition = condition.add(order::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.created_to {
            condition = condition.add(order::Column::CreatedAt.lte(to));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            condition = match Uuid::parse_str(term) {
                Ok(id) => condition.add(order::Column::Id.eq(id)),
                Err(_) => {
                    let pattern = format!("%{}%", term.to_lowercase());
                    let address_text = Expr::expr(Func::lower(
                        Expr::col(order::Column::DeliveryAddress).cast_as(Alias::new("text")),
                    ))
                    .like(pattern);
                    condition.add(
                        Condition::any()
                            .add(address_text)
                            .add(contains_ci(order::Column::Notes, term)),
                    )
                }
            };
        }

        let paginator = OrderEntity::find()
            .filter(condition)
            .order_by_desc(order::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count orders");
            ServiceError::DatabaseError(e)
        })?;

        let orders = paginator.fetch_page(page_index(page)).await.map_err(|e| {
            error!(error = %e, page, per_page, "Failed to fetch orders page");
            ServiceError::DatabaseError(e)
        })?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let mut items_by_order: HashMap<Uuid, Vec<OrderItemResponse>> = HashMap::new();
        if !order_ids.is_empty() {
            let items = OrderItemEntity::find()
                .filter(order_item::Column::OrderId.is_in(order_ids))
                .all(db)
                .await?;
            for item in items {
                items_by_order
                    .entry(item.order_id)
                    .or_default()
                    .push(item.into());
            }
        }

        let responses: Vec<OrderResponse> = orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                model_to_response(order, items)
            })
            .collect();

        info!(total, page, per_page, returned = responses.len(), "Orders listed");
        Ok(PaginatedResponse::new(responses, total, page, per_page))
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let order = self.find_model(order_id).await?;
        let items = order
            .find_related(OrderItemEntity)
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(OrderItemResponse::from)
            .collect();
        Ok(model_to_response(order, items))
    }

    #[instrument(skip(self, request), fields(seller_id = %request.seller_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        for item in &request.items {
            item.validate()?;
        }

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let total = match request.total_amount {
            Some(total) => total,
            None => items_total(&request.items)?,
        };

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let order = order::ActiveModel {
            id: Set(order_id),
            retailer_id: Set(request.retailer_id),
            seller_id: Set(request.seller_id),
            total_amount: Set(total),
            status: Set(request.status.unwrap_or(OrderStatus::Pending)),
            delivery_address: Set(request.delivery_address.as_ref().map(DeliveryAddress::to_json)),
            notes: Set(request.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert order");
            ServiceError::DatabaseError(e)
        })?;

        let mut items = Vec::with_capacity(request.items.len());
        for input in request.items {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(input.product_id),
                product_name: Set(input.product_name.trim().to_string()),
                quantity: Set(input.quantity),
                price: Set(input.price),
            }
            .insert(&txn)
            .await?;
            items.push(OrderItemResponse::from(item));
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        self.event_sender.send_or_log(Event::OrderCreated(order_id)).await;
        info!(%order_id, %total, "Order created");
        Ok(model_to_response(order, items))
    }

    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        request: UpdateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        let order = self.find_model(order_id).await?;

        let mut active: order::ActiveModel = order.into();
        if let Some(retailer_id) = request.retailer_id {
            active.retailer_id = Set(retailer_id);
        }
        if let Some(seller_id) = request.seller_id {
            active.seller_id = Set(seller_id);
        }
        if let Some(total) = request.total_amount {
            active.total_amount = Set(total);
        }
        if let Some(address) = &request.delivery_address {
            active.delivery_address = Set(Some(address.to_json()));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());

        active.update(&*self.db_pool).await.map_err(|e| {
            error!(error = %e, "Failed to update order");
            ServiceError::DatabaseError(e)
        })?;

        self.event_sender.send_or_log(Event::OrderUpdated(order_id)).await;
        self.get_order(order_id).await
    }

    /// Sets the status. Every status is reachable from every other one.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderResponse, ServiceError> {
        let order = self.find_model(order_id).await?;
        let old_status = order.status;

        let mut active: order::ActiveModel = order.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db_pool).await.map_err(|e| {
            error!(error = %e, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        if old_status != status {
            self.event_sender
                .send_or_log(Event::OrderStatusChanged {
                    order_id,
                    old_status: old_status.to_string(),
                    new_status: status.to_string(),
                })
                .await;
        }
        self.get_order(order_id).await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await?;
        let result = OrderEntity::delete_by_id(order_id).exec(&txn).await?;
        if result.rows_affected == 0 {
            warn!("Delete requested for missing order");
            return Err(ServiceError::not_found("Order", order_id));
        }

        txn.commit().await?;
        self.event_sender.send_or_log(Event::OrderDeleted(order_id)).await;
        info!("Order deleted");
        Ok(())
    }

    async fn find_model(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        OrderEntity::find_by_id(order_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load order");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))
    }
}

fn model_to_response(order: OrderModel, items: Vec<OrderItemResponse>) -> OrderResponse {
    OrderResponse {
        id: order.id,
        retailer_id: order.retailer_id,
        seller_id: order.seller_id,
        total_amount: order.total_amount,
        status: order.status,
        delivery_address: order.delivery_address.and_then(DeliveryAddress::from_json),
        notes: order.notes,
        items,
        created_at: order.created_at,
        updated_at: order.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn item(quantity: i32, price: Decimal) -> OrderItemInput {
        OrderItemInput {
            product_id: None,
            product_name: "Basmati Rice 5kg".into(),
            quantity,
            price,
        }
    }

    #[test]
    fn total_is_quantity_times_price() {
        let items = vec![item(2, dec!(10.50)), item(3, dec!(1.25))];
        assert_eq!(items_total(&items).unwrap(), dec!(24.75));
    }

    #[test]
    fn overflowing_total_is_a_validation_error() {
        let line = item(2, Decimal::MAX);
        assert_matches!(items_total(&[line]), Err(ServiceError::ValidationError(_)));

        let many = vec![item(1, Decimal::MAX), item(1, dec!(1))];
        assert_matches!(items_total(&many), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn free_text_address_round_trips_through_json() {
        let address = DeliveryAddress::Text("Shop 4, Market Road".into());
        let json = address.to_json();
        assert_eq!(json, serde_json::json!("Shop 4, Market Road"));
        assert_eq!(DeliveryAddress::from_json(json), Some(address));
    }

    #[test]
    fn structured_address_is_detected() {
        let json = serde_json::json!({"line1": "12 Mill Lane", "city": "Pune"});
        let parsed = DeliveryAddress::from_json(json).unwrap();
        assert!(matches!(parsed, DeliveryAddress::Structured(_)));
        assert_eq!(parsed.display_line(), "12 Mill Lane, Pune");
    }

    #[test]
    fn order_without_items_fails_validation() {
        let request = CreateOrderRequest {
            retailer_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            status: None,
            items: vec![],
            total_amount: None,
            delivery_address: None,
            notes: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn negative_item_price_fails_validation() {
        assert!(item(1, dec!(-1)).validate().is_err());
        assert!(item(1, dec!(0)).validate().is_ok());
    }
}
