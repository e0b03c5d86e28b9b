/*!
 * # Authentication
 *
 * Admin sessions for the dashboard. Credentials are checked against
 * `admin_users` (argon2 hashes) and a successful login returns a signed
 * HS256 JWT. Protected routers are wrapped with [`AuthRouterExt::with_auth`],
 * which validates the bearer token and places an [`AdminUser`] into the
 * request extensions.
 */

use crate::{
    db::DbPool,
    entities::admin_user::{self, AdminRole},
    errors::ServiceError,
    events::{Event, EventSender},
    ApiResponse,
};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const MIN_PASSWORD_LEN: usize = 8;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Admin id
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Authenticated admin extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
}

impl AdminUser {
    pub fn is_super_admin(&self) -> bool {
        self.role == AdminRole::SuperAdmin
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub session_ttl: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, jwt_issuer: String, session_ttl: Duration) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            session_ttl,
        }
    }
}

impl From<&crate::config::AppConfig> for AuthConfig {
    fn from(cfg: &crate::config::AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(cfg.session_ttl_secs),
        )
    }
}

/// Public view of an admin account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<admin_user::Model> for AdminProfile {
    fn from(model: admin_user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            last_login_at: model.last_login_at,
        }
    }
}

/// Session payload returned by a successful login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminSession {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    pub admin: AdminProfile,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginCredentials {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAdminRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub role: Option<AdminRole>,
}

pub struct AuthService {
    config: AuthConfig,
    db: Arc<DbPool>,
    event_sender: Option<EventSender>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DbPool>) -> Self {
        Self {
            config,
            db,
            event_sender: None,
        }
    }

    pub fn with_events(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    /// Checks an email/password pair and opens a session.
    ///
    /// Unknown emails, wrong passwords and inactive accounts all produce the
    /// same `Unauthorized` error.
    #[instrument(skip(self, password))]
    pub async fn validate_admin_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AdminSession, ServiceError> {
        let email = normalize_email(email);
        let admin = admin_user::Entity::find()
            .filter(admin_user::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to look up admin");
                ServiceError::DatabaseError(e)
            })?;

        let admin = match admin {
            Some(admin) if admin.is_active => admin,
            Some(_) => {
                warn!(%email, "Login attempt for inactive admin");
                return Err(invalid_credentials());
            }
            None => {
                debug!(%email, "Login attempt for unknown admin");
                return Err(invalid_credentials());
            }
        };

        if !verify_password(&admin.password_hash, password)? {
            warn!(admin_id = %admin.id, "Login attempt with wrong password");
            return Err(invalid_credentials());
        }

        let mut active: admin_user::ActiveModel = admin.into();
        active.last_login_at = Set(Some(Utc::now()));
        let admin = active.update(&*self.db).await.map_err(|e| {
            error!(error = %e, "Failed to record admin login");
            ServiceError::DatabaseError(e)
        })?;

        let session = self.issue_session(admin)?;
        info!(admin_id = %session.admin.id, "Admin logged in");
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::AdminLoggedIn(session.admin.id)).await;
        }
        Ok(session)
    }

    /// Signs a session token for an admin without checking a password.
    pub fn issue_session(&self, admin: admin_user::Model) -> Result<AdminSession, ServiceError> {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.session_ttl)
            .map_err(|_| ServiceError::InternalError("Invalid session duration".to_string()))?;
        let expires_at = now + ttl;

        let claims = Claims {
            sub: admin.id.to_string(),
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: admin.role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.config.jwt_issuer.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Token creation failed: {}", e)))?;

        Ok(AdminSession {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.session_ttl.as_secs() as i64,
            expires_at,
            admin: admin.into(),
        })
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ServiceError::Unauthorized("Session has expired".to_string())
            }
            _ => ServiceError::Unauthorized("Invalid authentication token".to_string()),
        })
    }

    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn create_admin(
        &self,
        email: &str,
        name: &str,
        password: &str,
        role: AdminRole,
    ) -> Result<admin_user::Model, ServiceError> {
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(ServiceError::ValidationError(
                "email must be a valid address".to_string(),
            ));
        }

        let existing = admin_user::Entity::find()
            .filter(admin_user::Column::Email.eq(email.as_str()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Admin with email {} already exists",
                email
            )));
        }

        let admin = admin_user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            name: Set(name.trim().to_string()),
            password_hash: Set(hash_password(password)?),
            role: Set(role),
            is_active: Set(true),
            last_login_at: Set(None),
            created_at: Set(Utc::now()),
        };

        let model = admin.insert(&*self.db).await.map_err(|e| {
            error!(error = %e, "Failed to create admin");
            ServiceError::DatabaseError(e)
        })?;
        info!(admin_id = %model.id, "Admin created");
        Ok(model)
    }

    /// Creates the configured super admin on first start.
    pub async fn ensure_bootstrap_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<admin_user::Model>, ServiceError> {
        let normalized = normalize_email(email);
        let existing = admin_user::Entity::find()
            .filter(admin_user::Column::Email.eq(normalized.as_str()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            debug!(email = %normalized, "Bootstrap admin already present");
            return Ok(None);
        }

        self.create_admin(&normalized, "Administrator", password, AdminRole::SuperAdmin)
            .await
            .map(Some)
    }

    pub async fn get_admin(&self, id: Uuid) -> Result<admin_user::Model, ServiceError> {
        admin_user::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Admin", id))
    }
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Unauthorized("Invalid email or password".to_string())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ServiceError::ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "Argon2 password hashing failed");
            ServiceError::InternalError("Password hashing failed".to_string())
        })
}

pub fn verify_password(stored_hash: &str, password: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "Stored password hash is malformed");
        ServiceError::InternalError("Invalid stored password hash".to_string())
    })?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!(error = %e, "Argon2 password verification failed");
            Err(ServiceError::InternalError(
                "Password verification failed".to_string(),
            ))
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware that extracts and validates auth tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return ServiceError::InternalError(
                "Authentication service not available".to_string(),
            )
            .into_response();
        }
    };

    let claims = match bearer_token(request.headers()) {
        Some(token) => auth_service.validate_token(token),
        None => Err(ServiceError::Unauthorized(
            "Authentication required".to_string(),
        )),
    };

    let admin = claims.and_then(|claims| {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid token subject".to_string()))?;
        Ok(AdminUser {
            id,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        })
    });

    match admin {
        Ok(admin) => {
            request.extensions_mut().insert(admin);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
}

impl<S> AuthRouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }
}

/// Authentication routes
pub fn auth_routes() -> Router<Arc<AuthService>> {
    let protected = Router::new()
        .route("/me", get(me_handler))
        .route("/admins", post(create_admin_handler))
        .with_auth();

    Router::new()
        .route("/login", post(login_handler))
        .merge(protected)
        .layer(DefaultBodyLimit::max(1024 * 64))
}

/// Login with admin credentials
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Session opened", body = AdminSession),
        (status = 400, description = "Malformed credentials", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid email or password", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(credentials): Json<LoginCredentials>,
) -> Result<Json<ApiResponse<AdminSession>>, ServiceError> {
    credentials.validate()?;
    let session = auth_service
        .validate_admin_credentials(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(ApiResponse::success(session)))
}

/// Current admin profile
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Authenticated admin", body = AdminProfile),
        (status = 401, description = "Missing or invalid token", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me_handler(
    State(auth_service): State<Arc<AuthService>>,
    Extension(admin): Extension<AdminUser>,
) -> Result<Json<ApiResponse<AdminProfile>>, ServiceError> {
    let model = auth_service.get_admin(admin.id).await?;
    Ok(Json(ApiResponse::success(model.into())))
}

/// Create another admin account (super admins only)
#[utoipa::path(
    post,
    path = "/auth/admins",
    request_body = CreateAdminRequest,
    responses(
        (status = 200, description = "Admin created", body = AdminProfile),
        (status = 403, description = "Caller is not a super admin", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn create_admin_handler(
    State(auth_service): State<Arc<AuthService>>,
    Extension(admin): Extension<AdminUser>,
    Json(request): Json<CreateAdminRequest>,
) -> Result<Json<ApiResponse<AdminProfile>>, ServiceError> {
    if !admin.is_super_admin() {
        return Err(ServiceError::Forbidden(
            "Only super admins can create admins".to_string(),
        ));
    }
    request.validate()?;
    let created = auth_service
        .create_admin(
            &request.email,
            &request.name,
            &request.password,
            request.role.unwrap_or(AdminRole::Admin),
        )
        .await?;
    Ok(Json(ApiResponse::success(created.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password(&hash, "correct horse battery").unwrap());
        assert!(!verify_password(&hash, "wrong horse battery").unwrap());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert_matches!(hash_password("short"), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email("  Ops@Example.COM "), "ops@example.com");
    }
}
