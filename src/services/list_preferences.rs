//! Per-admin paging state for list views, so a reload lands on the same page
//! with the same page size for a given filter combination.

use crate::{
    db::DbPool,
    entities::list_preference::{self, Entity as ListPreferenceEntity, Model as ListPreferenceModel},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const MAX_KEY_VALUE_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ListState {
    #[validate(range(min = 1))]
    pub page: u64,
    #[validate(range(min = 1))]
    pub per_page: u64,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub filters: serde_json::Value,
}

/// `?page=&per_page=` on list endpoints. Both optional; absent values come
/// from the saved preference.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Stable key for a list view and its non-empty filters, e.g.
/// `orders?seller_id=...&status=pending`.
pub fn list_key<F: Serialize>(list: &str, filters: &F) -> String {
    let params: BTreeMap<String, String> = match serde_json::to_value(filters) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter_map(|(k, v)| {
                let value = match v {
                    serde_json::Value::Null => return None,
                    serde_json::Value::String(s) => s.trim().to_lowercase(),
                    other => other.to_string(),
                };
                (!value.is_empty())
                    .then(|| (k, value.chars().take(MAX_KEY_VALUE_LEN).collect()))
            })
            .collect(),
        _ => BTreeMap::new(),
    };

    if params.is_empty() {
        return list.to_string();
    }
    let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{}?{}", list, query.join("&"))
}

/// Rejects pages whose row offset would not fit the database's signed
/// 64-bit offset. Returns `(page, per_page)` ready for storage.
fn storable_paging(page: u64, per_page: u64) -> Result<(i64, i64), ServiceError> {
    let out_of_range = || ServiceError::ValidationError(format!("page {} is out of range", page));
    page.checked_mul(per_page)
        .and_then(|offset| i64::try_from(offset).ok())
        .ok_or_else(out_of_range)?;
    Ok((
        i64::try_from(page).map_err(|_| out_of_range())?,
        i64::try_from(per_page).map_err(|_| out_of_range())?,
    ))
}

fn to_state(model: ListPreferenceModel) -> ListState {
    ListState {
        page: u64::try_from(model.page).unwrap_or(1).max(1),
        per_page: u64::try_from(model.per_page).unwrap_or(1).max(1),
        filters: model.filters,
    }
}

pub struct ListPreferenceService {
    db_pool: Arc<DbPool>,
    default_per_page: u64,
    max_per_page: u64,
}

impl ListPreferenceService {
    pub fn new(db_pool: Arc<DbPool>, default_per_page: u64, max_per_page: u64) -> Self {
        Self {
            db_pool,
            default_per_page,
            max_per_page: max_per_page.max(1),
        }
    }

    fn defaults(&self) -> ListState {
        ListState {
            page: 1,
            per_page: self.default_per_page.clamp(1, self.max_per_page),
            filters: serde_json::Value::Object(Default::default()),
        }
    }

    /// Saved state, or page 1 with the default page size.
    #[instrument(skip(self))]
    pub async fn get(&self, admin_id: Uuid, list_key: &str) -> Result<ListState, ServiceError> {
        Ok(self
            .find_model(admin_id, list_key)
            .await?
            .map(to_state)
            .unwrap_or_else(|| self.defaults()))
    }

    #[instrument(skip(self, state))]
    pub async fn save(
        &self,
        admin_id: Uuid,
        list_key: &str,
        state: ListState,
    ) -> Result<ListState, ServiceError> {
        state.validate()?;
        if list_key.trim().is_empty() {
            return Err(ServiceError::ValidationError("list_key is required".into()));
        }
        let (page, per_page) = storable_paging(state.page, state.per_page.min(self.max_per_page))?;
        let now = Utc::now();

        let saved = match self.find_model(admin_id, list_key).await? {
            Some(existing) => {
                let mut active: list_preference::ActiveModel = existing.into();
                active.page = Set(page);
                active.per_page = Set(per_page);
                active.filters = Set(state.filters);
                active.updated_at = Set(now);
                active.update(&*self.db_pool).await?
            }
            None => {
                list_preference::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    admin_id: Set(admin_id),
                    list_key: Set(list_key.to_string()),
                    page: Set(page),
                    per_page: Set(per_page),
                    filters: Set(state.filters),
                    updated_at: Set(now),
                }
                .insert(&*self.db_pool)
                .await?
            }
        };
        debug!(page = saved.page, per_page = saved.per_page, "List preference saved");
        Ok(to_state(saved))
    }

    /// Paging for one list request. Explicit values win and are remembered;
    /// missing ones fall back to what was saved for this key.
    pub async fn resolve_paging(
        &self,
        admin_id: Uuid,
        list_key: &str,
        requested: PageParams,
        filters: serde_json::Value,
    ) -> Result<(u64, u64), ServiceError> {
        let saved = self.get(admin_id, list_key).await?;
        if requested.page.is_none() && requested.per_page.is_none() {
            return Ok((saved.page, saved.per_page.clamp(1, self.max_per_page)));
        }

        let per_page = requested
            .per_page
            .unwrap_or(saved.per_page)
            .clamp(1, self.max_per_page);
        // A new page size invalidates the old page offset.
        let page = match (requested.page, requested.per_page) {
            (Some(page), _) => page.max(1),
            (None, Some(size)) if size != saved.per_page => 1,
            (None, _) => saved.page,
        };

        self.save(
            admin_id,
            list_key,
            ListState {
                page,
                per_page,
                filters,
            },
        )
        .await?;
        Ok((page, per_page))
    }

    async fn find_model(
        &self,
        admin_id: Uuid,
        list_key: &str,
    ) -> Result<Option<ListPreferenceModel>, ServiceError> {
        Ok(ListPreferenceEntity::find()
            .filter(list_preference::Column::AdminId.eq(admin_id))
            .filter(list_preference::Column::ListKey.eq(list_key))
            .one(&*self.db_pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[derive(Serialize)]
    struct Filter {
        status: Option<&'static str>,
        seller_id: Option<&'static str>,
        search: Option<&'static str>,
    }

    #[test]
    fn key_is_sorted_and_skips_empty_filters() {
        let filter = Filter {
            status: Some("Pending"),
            seller_id: Some("abc"),
            search: Some("  "),
        };
        assert_eq!(list_key("orders", &filter), "orders?seller_id=abc&status=pending");
    }

    #[test]
    fn key_without_filters_is_the_list_name() {
        let filter = Filter {
            status: None,
            seller_id: None,
            search: None,
        };
        assert_eq!(list_key("products", &filter), "products");
        assert_eq!(list_key("products", &json!(null)), "products");
    }

    #[test]
    fn long_filter_values_are_truncated() {
        let long = "x".repeat(300);
        let key = list_key("products", &json!({ "search": long }));
        assert_eq!(key.len(), "products?search=".len() + MAX_KEY_VALUE_LEN);
    }

    #[test]
    fn offsets_beyond_i64_are_rejected() {
        assert_eq!(storable_paging(3, 20).unwrap(), (3, 20));
        assert_matches!(
            storable_paging(u64::MAX, 100),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            storable_paging(i64::MAX as u64 / 10 + 1, 10),
            Err(ServiceError::ValidationError(_))
        );
        assert!(storable_paging(i64::MAX as u64 / 10, 10).is_ok());
    }

    #[test]
    fn zero_page_size_fails_validation() {
        let state = ListState {
            page: 1,
            per_page: 0,
            filters: json!({}),
        };
        assert!(state.validate().is_err());
    }
}
