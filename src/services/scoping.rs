//! Audience targeting shared by admin messages, feature flags and app configs.
//!
//! A record is scoped globally, to a user role, to a region or to a single
//! user. When several records share a key, the most specific one that
//! applies wins: user > region > role > global.

use crate::{
    entities::{admin_message, app_config, feature_flag, user::UserRole, ScopeKind},
    errors::ServiceError,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Who is asking. Every field is optional; a missing field only matches
/// global records for that dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ScopeContext {
    pub role: Option<UserRole>,
    pub region: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Scope {
    pub kind: ScopeKind,
    pub value: Option<String>,
}

impl Scope {
    pub fn global() -> Self {
        Self {
            kind: ScopeKind::Global,
            value: None,
        }
    }

    /// Validates and normalizes a (kind, value) pair coming from a request.
    ///
    /// Global scopes drop any value. Role values must name a role, user
    /// values must be a UUID and region values must be non-blank.
    pub fn parse(kind: ScopeKind, value: Option<&str>) -> Result<Self, ServiceError> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        let normalized = match (kind, value) {
            (ScopeKind::Global, _) => None,
            (_, None) => {
                return Err(ServiceError::ValidationError(format!(
                    "scope_value is required for {} scope",
                    kind
                )))
            }
            (ScopeKind::Role, Some(v)) => Some(
                UserRole::from_str(v)
                    .map_err(|_| ServiceError::ValidationError(format!("Unknown role '{}'", v)))?
                    .to_string(),
            ),
            (ScopeKind::User, Some(v)) => Some(
                Uuid::parse_str(v)
                    .map_err(|_| {
                        ServiceError::ValidationError(format!("'{}' is not a user id", v))
                    })?
                    .to_string(),
            ),
            (ScopeKind::Region, Some(v)) => Some(v.to_lowercase()),
        };
        Ok(Self {
            kind,
            value: normalized,
        })
    }

    pub fn applies_to(&self, ctx: &ScopeContext) -> bool {
        let value = self.value.as_deref().unwrap_or_default();
        match self.kind {
            ScopeKind::Global => true,
            ScopeKind::Role => ctx
                .role
                .map(|role| role.to_string().eq_ignore_ascii_case(value))
                .unwrap_or(false),
            ScopeKind::Region => ctx
                .region
                .as_deref()
                .map(|region| region.trim().eq_ignore_ascii_case(value))
                .unwrap_or(false),
            ScopeKind::User => ctx
                .user_id
                .map(|id| Uuid::parse_str(value).map(|v| v == id).unwrap_or(false))
                .unwrap_or(false),
        }
    }

    pub fn specificity(&self) -> u8 {
        specificity(self.kind)
    }
}

pub fn specificity(kind: ScopeKind) -> u8 {
    match kind {
        ScopeKind::Global => 0,
        ScopeKind::Role => 1,
        ScopeKind::Region => 2,
        ScopeKind::User => 3,
    }
}

/// Anything stored with a scope column pair.
pub trait Scoped {
    fn scope(&self) -> Scope;
}

macro_rules! impl_scoped {
    ($($model:ty),+ $(,)?) => {
        $(impl Scoped for $model {
            fn scope(&self) -> Scope {
                Scope {
                    kind: self.scope,
                    value: self.scope_value.clone(),
                }
            }
        })+
    };
}

impl_scoped!(admin_message::Model, feature_flag::Model, app_config::Model);

/// The applicable record with the highest specificity. On a tie the earlier
/// record wins.
pub fn resolve_most_specific<T, I>(records: I, ctx: &ScopeContext) -> Option<T>
where
    T: Scoped,
    I: IntoIterator<Item = T>,
{
    records
        .into_iter()
        .filter(|record| record.scope().applies_to(ctx))
        .fold(None, |best: Option<(u8, T)>, record| {
            let rank = record.scope().specificity();
            match best {
                Some((best_rank, best)) if best_rank >= rank => Some((best_rank, best)),
                _ => Some((rank, record)),
            }
        })
        .map(|(_, record)| record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str, Scope);

    impl Scoped for Row {
        fn scope(&self) -> Scope {
            self.1.clone()
        }
    }

    fn scope(kind: ScopeKind, value: Option<&str>) -> Scope {
        Scope::parse(kind, value).unwrap()
    }

    #[test]
    fn global_scope_ignores_value() {
        assert_eq!(scope(ScopeKind::Global, Some("north")), Scope::global());
    }

    #[test]
    fn scoped_kinds_require_a_valid_value() {
        assert_matches!(
            Scope::parse(ScopeKind::Region, Some("  ")),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            Scope::parse(ScopeKind::Role, Some("admin")),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            Scope::parse(ScopeKind::User, Some("bob")),
            Err(ServiceError::ValidationError(_))
        );
        assert_eq!(
            scope(ScopeKind::Role, Some("Wholesaler")).value.as_deref(),
            Some("wholesaler")
        );
    }

    #[test]
    fn applies_to_matches_each_dimension() {
        let user_id = Uuid::new_v4();
        let ctx = ScopeContext {
            role: Some(UserRole::Retailer),
            region: Some("Maharashtra".into()),
            user_id: Some(user_id),
        };

        assert!(Scope::global().applies_to(&ctx));
        assert!(scope(ScopeKind::Role, Some("retailer")).applies_to(&ctx));
        assert!(!scope(ScopeKind::Role, Some("manufacturer")).applies_to(&ctx));
        assert!(scope(ScopeKind::Region, Some("maharashtra")).applies_to(&ctx));
        assert!(scope(ScopeKind::User, Some(&user_id.to_string())).applies_to(&ctx));
        assert!(!scope(ScopeKind::User, Some(&Uuid::new_v4().to_string())).applies_to(&ctx));
        assert!(!scope(ScopeKind::Region, Some("goa")).applies_to(&ScopeContext::default()));
    }

    #[test]
    fn most_specific_applicable_record_wins() {
        let ctx = ScopeContext {
            role: Some(UserRole::Wholesaler),
            region: Some("goa".into()),
            user_id: None,
        };
        let rows = vec![
            Row("global", Scope::global()),
            Row("region", scope(ScopeKind::Region, Some("goa"))),
            Row("role", scope(ScopeKind::Role, Some("wholesaler"))),
            Row("other-user", scope(ScopeKind::User, Some(&Uuid::new_v4().to_string()))),
        ];

        let winner = resolve_most_specific(rows, &ctx).unwrap();
        assert_eq!(winner.0, "region");
    }

    #[test]
    fn ties_keep_the_first_record() {
        let rows = vec![Row("first", Scope::global()), Row("second", Scope::global())];
        let winner = resolve_most_specific(rows, &ScopeContext::default()).unwrap();
        assert_eq!(winner.0, "first");
    }

    #[test]
    fn nothing_applicable_resolves_to_none() {
        let rows = vec![Row("role", scope(ScopeKind::Role, Some("retailer")))];
        assert!(resolve_most_specific(rows, &ScopeContext::default()).is_none());
    }
}
