use crate::{
    db::DbPool,
    entities::admin_message::{self, Entity as AdminMessageEntity, Model as AdminMessageModel},
    entities::ScopeKind,
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        page_index,
        scoping::{Scope, ScopeContext, Scoped},
    },
    PaginatedResponse,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAdminMessageRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub body: String,
    #[serde(default = "default_scope")]
    pub scope: ScopeKind,
    pub scope_value: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_scope() -> ScopeKind {
    ScopeKind::Global
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateAdminMessageRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub body: Option<String>,
    pub scope: Option<ScopeKind>,
    pub scope_value: Option<String>,
    pub priority: Option<i32>,
    pub is_active: Option<bool>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AdminMessageFilter {
    pub scope: Option<ScopeKind>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminMessageResponse {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub scope: ScopeKind,
    pub scope_value: Option<String>,
    pub priority: i32,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AdminMessageModel> for AdminMessageResponse {
    fn from(model: AdminMessageModel) -> Self {
        Self {
            id: model.id,
            title: model.title,
            body: model.body,
            scope: model.scope,
            scope_value: model.scope_value,
            priority: model.priority,
            is_active: model.is_active,
            starts_at: model.starts_at,
            expires_at: model.expires_at,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn check_window(
    starts_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
) -> Result<(), ServiceError> {
    match (starts_at, expires_at) {
        (Some(start), Some(end)) if end <= start => Err(ServiceError::ValidationError(
            "expires_at must be after starts_at".to_string(),
        )),
        _ => Ok(()),
    }
}

/// True when the message is switched on and `now` falls inside its window.
pub fn is_live(message: &AdminMessageModel, now: DateTime<Utc>) -> bool {
    message.is_active
        && message.starts_at.map_or(true, |start| start <= now)
        && message.expires_at.map_or(true, |end| now < end)
}

/// Live messages that apply to `ctx`, highest priority first, then newest.
pub fn select_active(
    messages: Vec<AdminMessageModel>,
    ctx: &ScopeContext,
    now: DateTime<Utc>,
) -> Vec<AdminMessageModel> {
    let mut live: Vec<_> = messages
        .into_iter()
        .filter(|m| is_live(m, now) && m.scope().applies_to(ctx))
        .collect();
    live.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    live
}

pub struct AdminMessageService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl AdminMessageService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, filter))]
    pub async fn list_messages(
        &self,
        filter: &AdminMessageFilter,
        page: u64,
        per_page: u64,
    ) -> Result<PaginatedResponse<AdminMessageResponse>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(scope) = filter.scope {
            condition = condition.add(admin_message::Column::Scope.eq(scope));
        }
        if let Some(is_active) = filter.is_active {
            condition = condition.add(admin_message::Column::IsActive.eq(is_active));
        }

        let paginator = AdminMessageEntity::find()
            .filter(condition)
            .order_by_desc(admin_message::Column::Priority)
            .order_by_desc(admin_message::Column::CreatedAt)
            .paginate(&*self.db_pool, per_page);

        let total = paginator.num_items().await?;
        let messages = paginator.fetch_page(page_index(page)).await?;
        Ok(PaginatedResponse::new(
            messages.into_iter().map(Into::into).collect(),
            total,
            page,
            per_page,
        ))
    }

    #[instrument(skip(self), fields(message_id = %message_id))]
    pub async fn get_message(
        &self,
        message_id: Uuid,
    ) -> Result<AdminMessageResponse, ServiceError> {
        self.find_model(message_id).await.map(Into::into)
    }

    #[instrument(skip(self, request), fields(scope = %request.scope))]
    pub async fn create_message(
        &self,
        request: CreateAdminMessageRequest,
        created_by: Option<Uuid>,
    ) -> Result<AdminMessageResponse, ServiceError> {
        request.validate()?;
        check_window(request.starts_at, request.expires_at)?;
        let scope = Scope::parse(request.scope, request.scope_value.as_deref())?;
        let now = Utc::now();

        let message = admin_message::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(request.title.trim().to_string()),
            body: Set(request.body),
            scope: Set(scope.kind),
            scope_value: Set(scope.value),
            priority: Set(request.priority),
            is_active: Set(request.is_active),
            starts_at: Set(request.starts_at),
            expires_at: Set(request.expires_at),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert admin message");
            ServiceError::DatabaseError(e)
        })?;

        if message.is_active {
            self.event_sender
                .send_or_log(Event::AdminMessagePublished(message.id))
                .await;
        }
        info!(message_id = %message.id, "Admin message created");
        Ok(message.into())
    }

    #[instrument(skip(self, request), fields(message_id = %message_id))]
    pub async fn update_message(
        &self,
        message_id: Uuid,
        request: UpdateAdminMessageRequest,
    ) -> Result<AdminMessageResponse, ServiceError> {
        request.validate()?;
        let existing = self.find_model(message_id).await?;

        let starts_at = request.starts_at.or(existing.starts_at);
        let expires_at = request.expires_at.or(existing.expires_at);
        check_window(starts_at, expires_at)?;

        let scope = match (request.scope, request.scope_value.as_deref()) {
            (None, None) => None,
            (kind, value) => Some(Scope::parse(
                kind.unwrap_or(existing.scope),
                value.or(existing.scope_value.as_deref()),
            )?),
        };
        let was_active = existing.is_active;

        let mut active: admin_message::ActiveModel = existing.into();
        if let Some(title) = request.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(body) = request.body {
            active.body = Set(body);
        }
        if let Some(scope) = scope {
            active.scope = Set(scope.kind);
            active.scope_value = Set(scope.value);
        }
        if let Some(priority) = request.priority {
            active.priority = Set(priority);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.starts_at = Set(starts_at);
        active.expires_at = Set(expires_at);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db_pool).await?;
        if updated.is_active && !was_active {
            self.event_sender
                .send_or_log(Event::AdminMessagePublished(updated.id))
                .await;
        }
        Ok(updated.into())
    }

    #[instrument(skip(self), fields(message_id = %message_id))]
    pub async fn delete_message(&self, message_id: Uuid) -> Result<(), ServiceError> {
        let result = AdminMessageEntity::delete_by_id(message_id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            warn!("Delete requested for missing admin message");
            return Err(ServiceError::not_found("Admin message", message_id));
        }
        Ok(())
    }

    /// Messages a given audience should see right now.
    #[instrument(skip(self, ctx))]
    pub async fn active_for(
        &self,
        ctx: &ScopeContext,
        now: DateTime<Utc>,
    ) -> Result<Vec<AdminMessageResponse>, ServiceError> {
        let candidates = AdminMessageEntity::find()
            .filter(admin_message::Column::IsActive.eq(true))
            .all(&*self.db_pool)
            .await?;
        Ok(select_active(candidates, ctx, now)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn find_model(&self, message_id: Uuid) -> Result<AdminMessageModel, ServiceError> {
        AdminMessageEntity::find_by_id(message_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Admin message", message_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::UserRole;
    use chrono::Duration;

    fn message(title: &str, priority: i32, scope: ScopeKind, value: Option<&str>) -> AdminMessageModel {
        let now = Utc::now();
        AdminMessageModel {
            id: Uuid::new_v4(),
            title: title.to_string(),
            body: "body".to_string(),
            scope,
            scope_value: value.map(str::to_string),
            priority,
            is_active: true,
            starts_at: None,
            expires_at: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn window_is_half_open() {
        let now = Utc::now();
        let mut m = message("sale", 0, ScopeKind::Global, None);
        m.starts_at = Some(now);
        m.expires_at = Some(now + Duration::hours(1));
        assert!(is_live(&m, now));
        assert!(!is_live(&m, now + Duration::hours(1)));
        assert!(!is_live(&m, now - Duration::seconds(1)));
    }

    #[test]
    fn inactive_messages_are_never_live() {
        let mut m = message("draft", 0, ScopeKind::Global, None);
        m.is_active = false;
        assert!(!is_live(&m, Utc::now()));
    }

    #[test]
    fn active_messages_are_scoped_and_sorted_by_priority() {
        let ctx = ScopeContext {
            role: Some(UserRole::Retailer),
            region: None,
            user_id: None,
        };
        let messages = vec![
            message("low", 1, ScopeKind::Global, None),
            message("sellers only", 9, ScopeKind::Role, Some("wholesaler")),
            message("high", 5, ScopeKind::Role, Some("retailer")),
        ];

        let titles: Vec<String> = select_active(messages, &ctx, Utc::now())
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["high", "low"]);
    }

    #[test]
    fn expiry_before_start_is_rejected() {
        let now = Utc::now();
        assert!(check_window(Some(now), Some(now - Duration::minutes(5))).is_err());
        assert!(check_window(None, Some(now)).is_ok());
    }
}
