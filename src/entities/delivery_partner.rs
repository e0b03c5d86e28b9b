use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_partners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub vehicle_type: String,
    pub vehicle_number: Option<String>,
    pub is_online: bool,
    pub is_available: bool,
    #[sea_orm(column_type = "Decimal(Some((3, 2)))", nullable)]
    pub rating: Option<Decimal>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::delivery_location_log::Entity")]
    LocationLogs,
    #[sea_orm(has_many = "super::delivery_rejection::Entity")]
    Rejections,
}

impl Related<super::delivery_location_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LocationLogs.def()
    }
}

impl Related<super::delivery_rejection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rejections.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
