//! Marketplace admin backend
//!
//! HTTP API for the people who run a B2B marketplace: orders, seller
//! inventory and variant groups, marketplace users, delivery partners,
//! scoped announcements and settings, bulk edits, CSV imports and receipt
//! reconciliation.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod reconciliation;
pub mod services;
pub mod tracing;

use axum::{middleware, routing::get, Extension, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{AuthRouterExt, AuthService};
use crate::db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// One page of a list. `page` is 1-based.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        Self {
            items,
            total,
            page: page.max(1),
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;
    use proptest::prelude::*;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 21, 3, 10);
        assert_eq!(page.total_pages, 3);
        let empty = PaginatedResponse::<u8>::new(vec![], 0, 1, 10);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn zero_page_values_are_clamped() {
        let page = PaginatedResponse::<u8>::new(vec![], 5, 0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.total_pages, 5);
    }

    proptest! {
        #[test]
        fn page_math_holds_for_any_slice(
            total in 0u64..10_000,
            page in 0u64..200,
            per_page in 0u64..150,
        ) {
            let size = per_page.max(1);
            let offset = (page.max(1) - 1).saturating_mul(size);
            let shown = total.saturating_sub(offset).min(size);
            let items = vec![0u8; shown as usize];

            let response = PaginatedResponse::new(items, total, page, per_page);
            prop_assert!(response.page >= 1);
            prop_assert!(response.per_page >= 1);
            prop_assert!(response.items.len() as u64 <= response.per_page);
            prop_assert!(response.total_pages * response.per_page >= total);
            if response.total_pages > 0 {
                prop_assert!((response.total_pages - 1) * response.per_page < total);
            }
        }
    }
}

/// Everything under `/api/v1`. Only `/health` and `/status` are public.
pub fn api_v1_routes() -> Router<AppState> {
    let protected = Router::new()
        .nest("/orders", handlers::orders::order_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/variants", handlers::products::variant_routes())
        .nest("/variant-groups", handlers::products::variant_group_routes())
        .nest("/master-products", handlers::products::master_product_routes())
        .nest("/users", handlers::users::user_routes())
        .nest(
            "/delivery-partners",
            handlers::delivery_partners::delivery_partner_routes(),
        )
        .nest("/messages", handlers::messages::message_routes())
        .nest("/feature-flags", handlers::settings::feature_flag_routes())
        .nest("/app-configs", handlers::settings::app_config_routes())
        .nest("/preferences", handlers::preferences::preference_routes())
        .nest("/bulk", handlers::bulk::bulk_routes())
        .nest("/imports", handlers::imports::import_routes())
        .nest("/receipts", handlers::receipts::receipt_routes())
        .with_auth();

    Router::new()
        .route("/status", get(handlers::health::api_status))
        .nest("/health", handlers::health::health_routes())
        .merge(protected)
}

/// The full application: API, admin auth, Swagger UI, request ids and
/// HTTP tracing. CORS and compression are added by the binary.
pub fn build_router(state: AppState) -> Router {
    let auth_service = state.auth.clone();

    Router::new()
        .route("/", get(|| async { "marketplace-admin up" }))
        .nest("/api/v1", api_v1_routes())
        .nest("/auth", auth::auth_routes().with_state(auth_service.clone()))
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        // The auth middleware reads the service from request extensions.
        .layer(Extension(auth_service))
        .layer(middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
