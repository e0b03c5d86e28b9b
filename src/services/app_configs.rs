use crate::{
    db::DbPool,
    entities::app_config::{self, Entity as AppConfigEntity, Model as AppConfigModel},
    entities::ScopeKind,
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        feature_flags::validate_setting_key,
        scoping::{resolve_most_specific, Scope, ScopeContext},
    },
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpsertAppConfigRequest {
    #[validate(custom = "validate_setting_key")]
    pub key: String,
    /// Any JSON value
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    pub description: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: ScopeKind,
    pub scope_value: Option<String>,
}

fn default_scope() -> ScopeKind {
    ScopeKind::Global
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppConfigResponse {
    pub id: Uuid,
    pub key: String,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    pub description: Option<String>,
    pub scope: ScopeKind,
    pub scope_value: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl From<AppConfigModel> for AppConfigResponse {
    fn from(model: AppConfigModel) -> Self {
        Self {
            id: model.id,
            key: model.key,
            value: model.value,
            description: model.description,
            scope: model.scope,
            scope_value: model.scope_value,
            updated_by: model.updated_by,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResolvedConfig {
    pub key: String,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    pub matched_scope: Scope,
}

pub struct AppConfigService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl AppConfigService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_configs(
        &self,
        key: Option<&str>,
    ) -> Result<Vec<AppConfigResponse>, ServiceError> {
        let mut query = AppConfigEntity::find();
        if let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) {
            query = query.filter(app_config::Column::Key.eq(key.to_lowercase()));
        }
        let configs = query
            .order_by_asc(app_config::Column::Key)
            .order_by_asc(app_config::Column::Scope)
            .all(&*self.db_pool)
            .await?;
        Ok(configs.into_iter().map(Into::into).collect())
    }

    /// Inserts or replaces the value for (key, scope, scope_value).
    #[instrument(skip(self, request), fields(key = %request.key, scope = %request.scope))]
    pub async fn upsert_config(
        &self,
        request: UpsertAppConfigRequest,
        updated_by: Option<Uuid>,
    ) -> Result<AppConfigResponse, ServiceError> {
        request.validate()?;
        let key = request.key.trim().to_lowercase();
        let scope = Scope::parse(request.scope, request.scope_value.as_deref())?;
        let now = Utc::now();

        let mut existing_query = AppConfigEntity::find()
            .filter(app_config::Column::Key.eq(key.clone()))
            .filter(app_config::Column::Scope.eq(scope.kind));
        existing_query = match &scope.value {
            Some(value) => existing_query.filter(app_config::Column::ScopeValue.eq(value.clone())),
            None => existing_query.filter(app_config::Column::ScopeValue.is_null()),
        };

        let saved = match existing_query.one(&*self.db_pool).await? {
            Some(row) => {
                let mut active: app_config::ActiveModel = row.into();
                active.value = Set(request.value);
                if request.description.is_some() {
                    active.description = Set(request.description);
                }
                active.updated_by = Set(updated_by);
                active.updated_at = Set(now);
                active.update(&*self.db_pool).await?
            }
            None => {
                app_config::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    key: Set(key),
                    value: Set(request.value),
                    description: Set(request.description),
                    scope: Set(scope.kind),
                    scope_value: Set(scope.value),
                    updated_by: Set(updated_by),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&*self.db_pool)
                .await?
            }
        };

        self.event_sender
            .send_or_log(Event::AppConfigChanged {
                key: saved.key.clone(),
            })
            .await;
        info!(config_id = %saved.id, "App config saved");
        Ok(saved.into())
    }

    #[instrument(skip(self), fields(config_id = %config_id))]
    pub async fn delete_config(&self, config_id: Uuid) -> Result<(), ServiceError> {
        let result = AppConfigEntity::delete_by_id(config_id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            warn!("Delete requested for missing app config");
            return Err(ServiceError::not_found("App config", config_id));
        }
        Ok(())
    }

    /// Most specific value for `key` that applies to `ctx`, or 404.
    #[instrument(skip(self, ctx))]
    pub async fn resolve(
        &self,
        key: &str,
        ctx: &ScopeContext,
    ) -> Result<ResolvedConfig, ServiceError> {
        let key = key.trim().to_lowercase();
        let rows = AppConfigEntity::find()
            .filter(app_config::Column::Key.eq(key.clone()))
            .order_by_asc(app_config::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;

        resolve_most_specific(rows, ctx)
            .map(|row| ResolvedConfig {
                key: row.key,
                value: row.value,
                matched_scope: Scope {
                    kind: row.scope,
                    value: row.scope_value,
                },
            })
            .ok_or_else(|| ServiceError::not_found("App config", &key))
    }
}
