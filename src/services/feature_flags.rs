use crate::{
    db::DbPool,
    entities::feature_flag::{self, Entity as FeatureFlagEntity, Model as FeatureFlagModel},
    entities::ScopeKind,
    errors::ServiceError,
    events::{Event, EventSender},
    services::scoping::{resolve_most_specific, Scope, ScopeContext},
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

static SETTING_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_.\-]{0,99}$").expect("valid setting key regex"));

/// Keys for flags and configs: letters, digits, `_`, `.` and `-`. Keys are
/// stored lowercased, so case is checked after folding.
pub(crate) fn validate_setting_key(key: &str) -> Result<(), ValidationError> {
    if SETTING_KEY.is_match(&key.trim().to_lowercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_setting_key"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpsertFeatureFlagRequest {
    #[validate(custom = "validate_setting_key")]
    pub key: String,
    pub enabled: bool,
    pub description: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: ScopeKind,
    pub scope_value: Option<String>,
}

fn default_scope() -> ScopeKind {
    ScopeKind::Global
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeatureFlagResponse {
    pub id: Uuid,
    pub key: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub scope: ScopeKind,
    pub scope_value: Option<String>,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl From<FeatureFlagModel> for FeatureFlagResponse {
    fn from(model: FeatureFlagModel) -> Self {
        Self {
            id: model.id,
            key: model.key,
            description: model.description,
            enabled: model.enabled,
            scope: model.scope,
            scope_value: model.scope_value,
            updated_by: model.updated_by,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FlagEvaluation {
    pub key: String,
    pub enabled: bool,
    /// Scope of the row that decided the answer; `None` when no row applied.
    pub matched_scope: Option<Scope>,
}

/// Picks the deciding row for `key`. No applicable row means disabled.
pub fn evaluate_rows(key: &str, rows: Vec<FeatureFlagModel>, ctx: &ScopeContext) -> FlagEvaluation {
    match resolve_most_specific(rows, ctx) {
        Some(row) => FlagEvaluation {
            key: key.to_string(),
            enabled: row.enabled,
            matched_scope: Some(Scope {
                kind: row.scope,
                value: row.scope_value,
            }),
        },
        None => FlagEvaluation {
            key: key.to_string(),
            enabled: false,
            matched_scope: None,
        },
    }
}

pub struct FeatureFlagService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl FeatureFlagService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_flags(
        &self,
        key: Option<&str>,
    ) -> Result<Vec<FeatureFlagResponse>, ServiceError> {
        let mut query = FeatureFlagEntity::find();
        if let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) {
            query = query.filter(feature_flag::Column::Key.eq(key.to_lowercase()));
        }
        let flags = query
            .order_by_asc(feature_flag::Column::Key)
            .order_by_asc(feature_flag::Column::Scope)
            .all(&*self.db_pool)
            .await?;
        Ok(flags.into_iter().map(Into::into).collect())
    }

    /// Inserts or replaces the row for (key, scope, scope_value).
    #[instrument(skip(self, request), fields(key = %request.key, scope = %request.scope))]
    pub async fn upsert_flag(
        &self,
        request: UpsertFeatureFlagRequest,
        updated_by: Option<Uuid>,
    ) -> Result<FeatureFlagResponse, ServiceError> {
        request.validate()?;
        let key = request.key.trim().to_lowercase();
        let scope = Scope::parse(request.scope, request.scope_value.as_deref())?;
        let now = Utc::now();

        let mut existing_query = FeatureFlagEntity::find()
            .filter(feature_flag::Column::Key.eq(key.clone()))
            .filter(feature_flag::Column::Scope.eq(scope.kind));
        existing_query = match &scope.value {
            Some(value) => existing_query.filter(feature_flag::Column::ScopeValue.eq(value.clone())),
            None => existing_query.filter(feature_flag::Column::ScopeValue.is_null()),
        };

        let saved = match existing_query.one(&*self.db_pool).await? {
            Some(row) => {
                let mut active: feature_flag::ActiveModel = row.into();
                active.enabled = Set(request.enabled);
                if request.description.is_some() {
                    active.description = Set(request.description);
                }
                active.updated_by = Set(updated_by);
                active.updated_at = Set(now);
                active.update(&*self.db_pool).await?
            }
            None => {
                feature_flag::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    key: Set(key.clone()),
                    description: Set(request.description),
                    enabled: Set(request.enabled),
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
            .send_or_log(Event::FeatureFlagChanged {
                key: saved.key.clone(),
                enabled: saved.enabled,
            })
            .await;
        info!(flag_id = %saved.id, enabled = saved.enabled, "Feature flag saved");
        Ok(saved.into())
    }

    #[instrument(skip(self), fields(flag_id = %flag_id))]
    pub async fn delete_flag(&self, flag_id: Uuid) -> Result<(), ServiceError> {
        let result = FeatureFlagEntity::delete_by_id(flag_id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            warn!("Delete requested for missing feature flag");
            return Err(ServiceError::not_found("Feature flag", flag_id));
        }
        Ok(())
    }

    #[instrument(skip(self, ctx))]
    pub async fn evaluate(
        &self,
        key: &str,
        ctx: &ScopeContext,
    ) -> Result<FlagEvaluation, ServiceError> {
        let key = key.trim().to_lowercase();
        let rows = FeatureFlagEntity::find()
            .filter(feature_flag::Column::Key.eq(key.clone()))
            .order_by_asc(feature_flag::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        let evaluation = evaluate_rows(&key, rows, ctx);
        debug!(enabled = evaluation.enabled, "Feature flag evaluated");
        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::UserRole;
    use test_case::test_case;

    fn row(enabled: bool, scope: ScopeKind, value: Option<&str>) -> FeatureFlagModel {
        let now = Utc::now();
        FeatureFlagModel {
            id: Uuid::new_v4(),
            key: "receipt_import".into(),
            description: None,
            enabled,
            scope,
            scope_value: value.map(str::to_string),
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test_case("receipt_import", true ; "snake case")]
    #[test_case("checkout.v2-beta", true ; "dots and dashes")]
    #[test_case("Dark_Mode", true ; "mixed case")]
    #[test_case("Receipt Import", false ; "spaces")]
    #[test_case("", false ; "empty")]
    fn setting_keys(key: &str, valid: bool) {
        assert_eq!(validate_setting_key(key).is_ok(), valid);
    }

    #[test]
    fn role_override_beats_global_default() {
        let ctx = ScopeContext {
            role: Some(UserRole::Manufacturer),
            ..Default::default()
        };
        let rows = vec![
            row(false, ScopeKind::Global, None),
            row(true, ScopeKind::Role, Some("manufacturer")),
        ];

        let evaluation = evaluate_rows("receipt_import", rows, &ctx);
        assert!(evaluation.enabled);
        assert_eq!(
            evaluation.matched_scope.map(|s| s.kind),
            Some(ScopeKind::Role)
        );
    }

    #[test]
    fn unknown_flag_is_disabled() {
        let evaluation = evaluate_rows("missing", vec![], &ScopeContext::default());
        assert!(!evaluation.enabled);
        assert!(evaluation.matched_scope.is_none());
    }

    #[test]
    fn non_matching_override_falls_back_to_nothing() {
        let rows = vec![row(true, ScopeKind::Region, Some("kerala"))];
        let ctx = ScopeContext {
            region: Some("goa".into()),
            ..Default::default()
        };
        assert!(!evaluate_rows("receipt_import", rows, &ctx).enabled);
    }
}
