use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delivery_rejections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub partner_id: Uuid,
    pub order_id: Uuid,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::delivery_partner::Entity",
        from = "Column::PartnerId",
        to = "super::delivery_partner::Column::Id"
    )]
    DeliveryPartner,
}

impl Related<super::delivery_partner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryPartner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
