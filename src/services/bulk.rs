//! Bulk actions over selected rows.
//!
//! Every id is handled independently and concurrently. Nothing is rolled
//! back: the result lists which ids failed and why, and
//! `updated + errors.len()` always equals the number of ids submitted.

use crate::{
    entities::{order::OrderStatus, product::ProductStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        orders::OrderService,
        products::{ProductService, UpdateProductRequest},
    },
};
use futures::{stream, StreamExt};
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkRequest {
    pub ids: Vec<Uuid>,
    /// e.g. `update_status`, `update_price`, `set_stock`, `update_category`, `delete`
    pub operation: String,
    #[schema(value_type = Object)]
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BulkItemError {
    pub id: Uuid,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BulkResult {
    pub updated: usize,
    pub errors: Vec<BulkItemError>,
}

impl BulkResult {
    fn collect(outcomes: Vec<(Uuid, Result<(), ServiceError>)>) -> Self {
        let mut result = BulkResult::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => result.updated += 1,
                Err(e) => result.errors.push(BulkItemError {
                    id,
                    error: e.response_message(),
                }),
            }
        }
        result
    }
}

/// A product bulk operation with its already-parsed value.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductBulkOperation {
    UpdateStatus(ProductStatus),
    UpdatePrice(Decimal),
    SetStock(i32),
    UpdateCategory(String),
    Delete,
}

impl ProductBulkOperation {
    pub fn parse(operation: &str, value: &serde_json::Value) -> Result<Self, ServiceError> {
        match operation.trim() {
            "update_status" => {
                let status = value_as_str(value, operation)?;
                ProductStatus::from_str(status)
                    .map(Self::UpdateStatus)
                    .map_err(|_| invalid_value(operation, "a product status"))
            }
            "update_price" => {
                let price = value_as_decimal(value)
                    .ok_or_else(|| invalid_value(operation, "a price"))?;
                if price.is_sign_negative() && !price.is_zero() {
                    return Err(invalid_value(operation, "a non-negative price"));
                }
                Ok(Self::UpdatePrice(price))
            }
            "set_stock" => value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .filter(|n| *n >= 0)
                .map(Self::SetStock)
                .ok_or_else(|| invalid_value(operation, "a non-negative integer")),
            "update_category" => {
                let category = value_as_str(value, operation)?.trim();
                if category.is_empty() {
                    return Err(invalid_value(operation, "a category name"));
                }
                Ok(Self::UpdateCategory(category.to_string()))
            }
            "delete" => Ok(Self::Delete),
            other => Err(ServiceError::BadRequest(format!(
                "Unsupported product bulk operation '{}'",
                other
            ))),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::UpdateStatus(_) => "update_status",
            Self::UpdatePrice(_) => "update_price",
            Self::SetStock(_) => "set_stock",
            Self::UpdateCategory(_) => "update_category",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderBulkOperation {
    UpdateStatus(OrderStatus),
    Delete,
}

impl OrderBulkOperation {
    pub fn parse(operation: &str, value: &serde_json::Value) -> Result<Self, ServiceError> {
        match operation.trim() {
            "update_status" => {
                let status = value_as_str(value, operation)?;
                OrderStatus::from_str(status)
                    .map(Self::UpdateStatus)
                    .map_err(|_| invalid_value(operation, "an order status"))
            }
            "delete" => Ok(Self::Delete),
            other => Err(ServiceError::BadRequest(format!(
                "Unsupported order bulk operation '{}'",
                other
            ))),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::UpdateStatus(_) => "update_status",
            Self::Delete => "delete",
        }
    }
}

fn invalid_value(operation: &str, expected: &str) -> ServiceError {
    ServiceError::BadRequest(format!("'{}' expects {} as value", operation, expected))
}

fn value_as_str<'a>(value: &'a serde_json::Value, operation: &str) -> Result<&'a str, ServiceError> {
    value
        .as_str()
        .ok_or_else(|| invalid_value(operation, "a string"))
}

fn value_as_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

fn check_ids(ids: &[Uuid]) -> Result<(), ServiceError> {
    if ids.is_empty() {
        return Err(ServiceError::BadRequest("ids must not be empty".into()));
    }
    Ok(())
}

pub struct BulkService {
    products: Arc<ProductService>,
    orders: Arc<OrderService>,
    event_sender: EventSender,
    concurrency: usize,
}

impl BulkService {
    pub fn new(
        products: Arc<ProductService>,
        orders: Arc<OrderService>,
        event_sender: EventSender,
        concurrency: usize,
    ) -> Self {
        Self {
            products,
            orders,
            event_sender,
            concurrency: concurrency.max(1),
        }
    }

    #[instrument(skip(self, request), fields(operation = %request.operation, ids = request.ids.len()))]
    pub async fn bulk_update_products(
        &self,
        request: BulkRequest,
    ) -> Result<BulkResult, ServiceError> {
        check_ids(&request.ids)?;
        let operation = ProductBulkOperation::parse(&request.operation, &request.value)?;

        let outcomes: Vec<(Uuid, Result<(), ServiceError>)> = stream::iter(request.ids)
            .map(|id| {
                let operation = operation.clone();
                async move { (id, self.apply_to_product(id, operation).await) }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let result = BulkResult::collect(outcomes);
        self.finish("products", operation.name(), &result).await;
        Ok(result)
    }

    #[instrument(skip(self, request), fields(operation = %request.operation, ids = request.ids.len()))]
    pub async fn bulk_update_orders(&self, request: BulkRequest) -> Result<BulkResult, ServiceError> {
        check_ids(&request.ids)?;
        let operation = OrderBulkOperation::parse(&request.operation, &request.value)?;

        let outcomes: Vec<(Uuid, Result<(), ServiceError>)> = stream::iter(request.ids)
            .map(|id| {
                let operation = operation.clone();
                async move {
                    let outcome = match operation {
                        OrderBulkOperation::UpdateStatus(status) => {
                            self.orders.update_status(id, status).await.map(|_| ())
                        }
                        OrderBulkOperation::Delete => self.orders.delete_order(id).await,
                    };
                    (id, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let result = BulkResult::collect(outcomes);
        self.finish("orders", operation.name(), &result).await;
        Ok(result)
    }

    async fn apply_to_product(
        &self,
        id: Uuid,
        operation: ProductBulkOperation,
    ) -> Result<(), ServiceError> {
        let update = match operation {
            ProductBulkOperation::Delete => return self.products.delete_product(id).await,
            ProductBulkOperation::UpdateStatus(status) => UpdateProductRequest {
                status: Some(status),
                ..Default::default()
            },
            ProductBulkOperation::UpdatePrice(price) => UpdateProductRequest {
                price: Some(price),
                ..Default::default()
            },
            ProductBulkOperation::SetStock(stock) => UpdateProductRequest {
                stock_available: Some(stock),
                ..Default::default()
            },
            ProductBulkOperation::UpdateCategory(category) => UpdateProductRequest {
                category: Some(category),
                ..Default::default()
            },
        };
        self.products.update_product(id, update).await.map(|_| ())
    }

    async fn finish(&self, entity: &str, operation: &str, result: &BulkResult) {
        counter!("marketplace_bulk.updated", result.updated as u64, "entity" => entity.to_string());
        counter!("marketplace_bulk.failed", result.errors.len() as u64, "entity" => entity.to_string());
        if !result.errors.is_empty() {
            warn!(failed = result.errors.len(), "Bulk operation finished with failures");
        }
        info!(updated = result.updated, "Bulk operation finished");
        self.event_sender
            .send_or_log(Event::BulkOperationCompleted {
                entity: entity.to_string(),
                operation: operation.to_string(),
                updated: result.updated,
                failed: result.errors.len(),
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn product_operations_parse_their_values() {
        assert_eq!(
            ProductBulkOperation::parse("update_status", &json!("out_of_stock")).unwrap(),
            ProductBulkOperation::UpdateStatus(ProductStatus::OutOfStock)
        );
        assert_eq!(
            ProductBulkOperation::parse("update_price", &json!("12.50")).unwrap(),
            ProductBulkOperation::UpdatePrice(dec!(12.50))
        );
        assert_eq!(
            ProductBulkOperation::parse("update_price", &json!(3)).unwrap(),
            ProductBulkOperation::UpdatePrice(dec!(3))
        );
        assert_eq!(
            ProductBulkOperation::parse("set_stock", &json!(40)).unwrap(),
            ProductBulkOperation::SetStock(40)
        );
        assert_eq!(
            ProductBulkOperation::parse("delete", &serde_json::Value::Null).unwrap(),
            ProductBulkOperation::Delete
        );
    }

    #[test]
    fn bad_values_are_rejected_up_front() {
        assert_matches!(
            ProductBulkOperation::parse("set_stock", &json!(-1)),
            Err(ServiceError::BadRequest(_))
        );
        assert_matches!(
            ProductBulkOperation::parse("update_price", &json!("-2")),
            Err(ServiceError::BadRequest(_))
        );
        assert_matches!(
            ProductBulkOperation::parse("update_category", &json!("  ")),
            Err(ServiceError::BadRequest(_))
        );
        assert_matches!(
            ProductBulkOperation::parse("archive", &json!(null)),
            Err(ServiceError::BadRequest(_))
        );
    }

    #[test]
    fn order_operations_accept_any_status() {
        assert_eq!(
            OrderBulkOperation::parse("update_status", &json!("delivered")).unwrap(),
            OrderBulkOperation::UpdateStatus(OrderStatus::Delivered)
        );
        assert_matches!(
            OrderBulkOperation::parse("update_price", &json!(1)),
            Err(ServiceError::BadRequest(_))
        );
    }

    #[test]
    fn result_counts_cover_every_id() {
        let ok = Uuid::new_v4();
        let missing = Uuid::new_v4();
        let result = BulkResult::collect(vec![
            (ok, Ok(())),
            (missing, Err(ServiceError::not_found("Product", missing))),
        ]);
        assert_eq!(result.updated, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].id, missing);
    }

    #[test]
    fn empty_id_list_is_a_bad_request() {
        assert_matches!(check_ids(&[]), Err(ServiceError::BadRequest(_)));
    }
}
