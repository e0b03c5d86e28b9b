use crate::{
    db::DbPool,
    entities::delivery_location_log::{self, Entity as LocationLogEntity},
    entities::delivery_partner::{self, Entity as DeliveryPartnerEntity, Model as PartnerModel},
    entities::delivery_rejection::{self, Entity as RejectionEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{contains_ci, page_index},
    PaginatedResponse,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_rating(rating: &Decimal) -> Result<(), ValidationError> {
    if *rating < Decimal::ZERO || *rating > Decimal::from(5) {
        return Err(ValidationError::new("rating_out_of_range"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDeliveryPartnerRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(length(min = 1, max = 50))]
    pub vehicle_type: String,
    pub vehicle_number: Option<String>,
    #[validate(custom = "validate_rating")]
    pub rating: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateDeliveryPartnerRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub vehicle_type: Option<String>,
    pub vehicle_number: Option<String>,
    #[validate(custom = "validate_rating")]
    pub rating: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityRequest {
    pub is_online: bool,
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LocationRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RejectionRequest {
    pub order_id: Uuid,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DeliveryPartnerFilter {
    pub is_online: Option<bool>,
    pub is_available: Option<bool>,
    /// Matches name, phone or vehicle number
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryPartnerResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub vehicle_type: String,
    pub vehicle_number: Option<String>,
    pub is_online: bool,
    pub is_available: bool,
    pub rating: Option<Decimal>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PartnerModel> for DeliveryPartnerResponse {
    fn from(model: PartnerModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            phone: model.phone,
            vehicle_type: model.vehicle_type,
            vehicle_number: model.vehicle_number,
            is_online: model.is_online,
            is_available: model.is_available,
            rating: model.rating,
            last_seen_at: model.last_seen_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationResponse {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

impl From<delivery_location_log::Model> for LocationResponse {
    fn from(model: delivery_location_log::Model) -> Self {
        Self {
            id: model.id,
            latitude: model.latitude,
            longitude: model.longitude,
            recorded_at: model.recorded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RejectionResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<delivery_rejection::Model> for RejectionResponse {
    fn from(model: delivery_rejection::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            reason: model.reason,
            created_at: model.created_at,
        }
    }
}

pub struct DeliveryPartnerService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl DeliveryPartnerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, filter))]
    pub async fn list_partners(
        &self,
        filter: &DeliveryPartnerFilter,
        page: u64,
        per_page: u64,
    ) -> Result<PaginatedResponse<DeliveryPartnerResponse>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(is_online) = filter.is_online {
            condition = condition.add(delivery_partner::Column::IsOnline.eq(is_online));
        }
        if let Some(is_available) = filter.is_available {
            condition = condition.add(delivery_partner::Column::IsAvailable.eq(is_available));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(contains_ci(delivery_partner::Column::Name, term))
                    .add(delivery_partner::Column::Phone.contains(term))
                    .add(contains_ci(delivery_partner::Column::VehicleNumber, term)),
            );
        }

        let paginator = DeliveryPartnerEntity::find()
            .filter(condition)
            .order_by_asc(delivery_partner::Column::Name)
            .paginate(&*self.db_pool, per_page);

        let total = paginator.num_items().await?;
        let partners = paginator.fetch_page(page_index(page)).await.map_err(|e| {
            error!(error = %e, "Failed to fetch delivery partners");
            ServiceError::DatabaseError(e)
        })?;

        Ok(PaginatedResponse::new(
            partners.into_iter().map(Into::into).collect(),
            total,
            page,
            per_page,
        ))
    }

    #[instrument(skip(self), fields(partner_id = %partner_id))]
    pub async fn get_partner(
        &self,
        partner_id: Uuid,
    ) -> Result<DeliveryPartnerResponse, ServiceError> {
        self.find_model(partner_id).await.map(Into::into)
    }

    #[instrument(skip(self, request))]
    pub async fn create_partner(
        &self,
        request: CreateDeliveryPartnerRequest,
    ) -> Result<DeliveryPartnerResponse, ServiceError> {
        request.validate()?;
        let now = Utc::now();

        let partner = delivery_partner::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            phone: Set(request.phone.trim().to_string()),
            vehicle_type: Set(request.vehicle_type.trim().to_string()),
            vehicle_number: Set(request.vehicle_number),
            is_online: Set(false),
            is_available: Set(false),
            rating: Set(request.rating),
            last_seen_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert delivery partner");
            ServiceError::DatabaseError(e)
        })?;

        info!(partner_id = %partner.id, "Delivery partner created");
        Ok(partner.into())
    }

    #[instrument(skip(self, request), fields(partner_id = %partner_id))]
    pub async fn update_partner(
        &self,
        partner_id: Uuid,
        request: UpdateDeliveryPartnerRequest,
    ) -> Result<DeliveryPartnerResponse, ServiceError> {
        request.validate()?;
        let mut active: delivery_partner::ActiveModel = self.find_model(partner_id).await?.into();

        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(phone) = request.phone {
            active.phone = Set(phone.trim().to_string());
        }
        if let Some(vehicle_type) = request.vehicle_type {
            active.vehicle_type = Set(vehicle_type.trim().to_string());
        }
        if let Some(vehicle_number) = request.vehicle_number {
            active.vehicle_number = Set(Some(vehicle_number));
        }
        if let Some(rating) = request.rating {
            active.rating = Set(Some(rating));
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db_pool).await?.into())
    }

    /// Removes the partner together with its location and rejection history.
    #[instrument(skip(self), fields(partner_id = %partner_id))]
    pub async fn delete_partner(&self, partner_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;

        LocationLogEntity::delete_many()
            .filter(delivery_location_log::Column::PartnerId.eq(partner_id))
            .exec(&txn)
            .await?;
        RejectionEntity::delete_many()
            .filter(delivery_rejection::Column::PartnerId.eq(partner_id))
            .exec(&txn)
            .await?;
        let result = DeliveryPartnerEntity::delete_by_id(partner_id)
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            warn!("Delete requested for missing delivery partner");
            return Err(ServiceError::not_found("Delivery partner", partner_id));
        }

        txn.commit().await?;
        info!("Delivery partner deleted");
        Ok(())
    }

    #[instrument(skip(self, request), fields(partner_id = %partner_id))]
    pub async fn set_availability(
        &self,
        partner_id: Uuid,
        request: AvailabilityRequest,
    ) -> Result<DeliveryPartnerResponse, ServiceError> {
        let partner = self.find_model(partner_id).await?;
        // An offline partner can never be available for dispatch.
        let is_available = request.is_online && request.is_available;
        let now = Utc::now();

        let mut active: delivery_partner::ActiveModel = partner.into();
        active.is_online = Set(request.is_online);
        active.is_available = Set(is_available);
        active.last_seen_at = Set(Some(now));
        active.updated_at = Set(now);
        let updated = active.update(&*self.db_pool).await?;

        self.event_sender
            .send_or_log(Event::DeliveryPartnerAvailabilityChanged {
                partner_id,
                is_online: updated.is_online,
                is_available: updated.is_available,
            })
            .await;
        Ok(updated.into())
    }

    #[instrument(skip(self, request), fields(partner_id = %partner_id))]
    pub async fn record_location(
        &self,
        partner_id: Uuid,
        request: LocationRequest,
    ) -> Result<LocationResponse, ServiceError> {
        request.validate()?;
        let partner = self.find_model(partner_id).await?;
        let now = Utc::now();
        let txn = self.db_pool.begin().await?;

        let log = delivery_location_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            partner_id: Set(partner_id),
            latitude: Set(request.latitude),
            longitude: Set(request.longitude),
            recorded_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut active: delivery_partner::ActiveModel = partner.into();
        active.last_seen_at = Set(Some(now));
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(log.into())
    }

    /// Most recent first.
    #[instrument(skip(self), fields(partner_id = %partner_id))]
    pub async fn list_locations(
        &self,
        partner_id: Uuid,
        limit: u64,
    ) -> Result<Vec<LocationResponse>, ServiceError> {
        self.find_model(partner_id).await?;
        let logs = LocationLogEntity::find()
            .filter(delivery_location_log::Column::PartnerId.eq(partner_id))
            .order_by_desc(delivery_location_log::Column::RecordedAt)
            .limit(limit)
            .all(&*self.db_pool)
            .await?;
        Ok(logs.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, request), fields(partner_id = %partner_id, order_id = %request.order_id))]
    pub async fn record_rejection(
        &self,
        partner_id: Uuid,
        request: RejectionRequest,
    ) -> Result<RejectionResponse, ServiceError> {
        request.validate()?;
        self.find_model(partner_id).await?;

        let rejection = delivery_rejection::ActiveModel {
            id: Set(Uuid::new_v4()),
            partner_id: Set(partner_id),
            order_id: Set(request.order_id),
            reason: Set(request.reason),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?;

        self.event_sender
            .send_or_log(Event::DeliveryRejected {
                partner_id,
                order_id: rejection.order_id,
            })
            .await;
        Ok(rejection.into())
    }

    #[instrument(skip(self), fields(partner_id = %partner_id))]
    pub async fn list_rejections(
        &self,
        partner_id: Uuid,
    ) -> Result<Vec<RejectionResponse>, ServiceError> {
        self.find_model(partner_id).await?;
        let rejections = RejectionEntity::find()
            .filter(delivery_rejection::Column::PartnerId.eq(partner_id))
            .order_by_desc(delivery_rejection::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok(rejections.into_iter().map(Into::into).collect())
    }

    async fn find_model(&self, partner_id: Uuid) -> Result<PartnerModel, ServiceError> {
        DeliveryPartnerEntity::find_by_id(partner_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Delivery partner", partner_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rating_must_be_between_zero_and_five() {
        assert!(validate_rating(&dec!(4.75)).is_ok());
        assert!(validate_rating(&dec!(5.01)).is_err());
        assert!(validate_rating(&dec!(-1)).is_err());
    }

    #[test]
    fn coordinates_are_range_checked() {
        let bad = LocationRequest {
            latitude: 91.0,
            longitude: 0.0,
        };
        assert!(bad.validate().is_err());
        let good = LocationRequest {
            latitude: 18.52,
            longitude: 73.85,
        };
        assert!(good.validate().is_ok());
    }
}
