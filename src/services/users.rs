use crate::{
    db::DbPool,
    entities::user::{self, Entity as UserEntity, Model as UserModel, UserRole},
    errors::ServiceError,
    services::{contains_ci, page_index},
    PaginatedResponse,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

static PHONE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{6,18}[0-9]$").expect("valid phone regex"));

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_NUMBER.is_match(phone.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone_number"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Business name is required"))]
    pub business_name: String,
    #[validate(length(max = 255))]
    pub display_name: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone_number: String,
    pub role: UserRole,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub business_name: Option<String>,
    #[validate(length(max = 255))]
    pub display_name: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone_number: Option<String>,
    pub role: Option<UserRole>,
    pub region: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    /// Matches business name, display name or phone number
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub business_name: String,
    pub display_name: Option<String>,
    pub phone_number: String,
    pub role: UserRole,
    pub region: Option<String>,
    pub is_active: bool,
    pub is_seller: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserModel> for UserResponse {
    fn from(model: UserModel) -> Self {
        Self {
            is_seller: model.role.is_seller(),
            id: model.id,
            business_name: model.business_name,
            display_name: model.display_name,
            phone_number: model.phone_number,
            role: model.role,
            region: model.region,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Sellers and retailers registered on the marketplace.
pub struct UserService {
    db_pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, filter))]
    pub async fn list_users(
        &self,
        filter: &UserFilter,
        page: u64,
        per_page: u64,
    ) -> Result<PaginatedResponse<UserResponse>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(role) = filter.role {
            condition = condition.add(user::Column::Role.eq(role));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(contains_ci(user::Column::BusinessName, term))
                    .add(contains_ci(user::Column::DisplayName, term))
                    .add(user::Column::PhoneNumber.contains(term)),
            );
        }

        let paginator = UserEntity::find()
            .filter(condition)
            .order_by_asc(user::Column::BusinessName)
            .paginate(&*self.db_pool, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count users");
            ServiceError::DatabaseError(e)
        })?;
        let users = paginator.fetch_page(page_index(page)).await?;

        Ok(PaginatedResponse::new(
            users.into_iter().map(UserResponse::from).collect(),
            total,
            page,
            per_page,
        ))
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserResponse, ServiceError> {
        self.find_model(user_id).await.map(UserResponse::from)
    }

    #[instrument(skip(self, request), fields(role = %request.role))]
    pub async fn create_user(
        &self,
        request: CreateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        request.validate()?;
        let now = Utc::now();

        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_name: Set(request.business_name.trim().to_string()),
            display_name: Set(request.display_name),
            phone_number: Set(request.phone_number.trim().to_string()),
            role: Set(request.role),
            region: Set(request.region),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert user");
            ServiceError::DatabaseError(e)
        })?;

        info!(user_id = %user.id, "User created");
        Ok(user.into())
    }

    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn update_user(
        &self,
        user_id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        request.validate()?;
        let mut active: user::ActiveModel = self.find_model(user_id).await?.into();

        if let Some(name) = request.business_name {
            active.business_name = Set(name.trim().to_string());
        }
        if let Some(display_name) = request.display_name {
            active.display_name = Set(Some(display_name));
        }
        if let Some(phone) = request.phone_number {
            active.phone_number = Set(phone.trim().to_string());
        }
        if let Some(role) = request.role {
            active.role = Set(role);
        }
        if let Some(region) = request.region {
            active.region = Set(Some(region));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db_pool).await.map_err(|e| {
            error!(error = %e, "Failed to update user");
            ServiceError::DatabaseError(e)
        })?;
        Ok(updated.into())
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let result = UserEntity::delete_by_id(user_id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            warn!("Delete requested for missing user");
            return Err(ServiceError::not_found("User", user_id));
        }
        info!("User deleted");
        Ok(())
    }

    async fn find_model(&self, user_id: Uuid) -> Result<UserModel, ServiceError> {
        UserEntity::find_by_id(user_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("+91 98765 43210", true ; "international with spaces")]
    #[test_case("020-2612-3456", true ; "dashed landline")]
    #[test_case("12345", false ; "too short")]
    #[test_case("call me", false ; "letters")]
    fn phone_numbers(phone: &str, valid: bool) {
        assert_eq!(validate_phone(phone).is_ok(), valid);
    }

    #[test]
    fn blank_business_name_is_rejected() {
        let request = CreateUserRequest {
            business_name: String::new(),
            display_name: None,
            phone_number: "+919876543210".into(),
            role: UserRole::Wholesaler,
            region: None,
        };
        assert!(request.validate().is_err());
    }
}
