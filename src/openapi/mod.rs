use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Marketplace Admin API",
        version = "0.3.0",
        description = r#"
# Marketplace Admin API

Back office for a B2B marketplace: orders, seller inventory with variant
groups, a master catalog, marketplace users, delivery partners, scoped
announcements, feature flags and app configuration, bulk edits, CSV imports
and receipt reconciliation.

## Authentication

Everything under `/api/v1` except `/health` and `/status` needs an admin
session token from `POST /auth/login`:

```
Authorization: Bearer <token>
```

## Pagination

List endpoints take `page` (1-based) and `per_page`. When either is left out
the value saved for the same list and filters is used, so an admin returns
to where they left off.

## Errors

```json
{ "error": "Not found: Product 6f1c...", "code": "Not Found", "timestamp": "2026-01-01T00:00:00Z" }
```
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Admin sessions"),
        (name = "orders", description = "Order management"),
        (name = "products", description = "Seller inventory and variants"),
        (name = "master-products", description = "Master catalog"),
        (name = "users", description = "Marketplace sellers and buyers"),
        (name = "delivery-partners", description = "Delivery fleet"),
        (name = "messages", description = "Scoped admin announcements"),
        (name = "settings", description = "Feature flags and app configs"),
        (name = "preferences", description = "Saved list state"),
        (name = "bulk", description = "Bulk edits"),
        (name = "imports", description = "CSV product imports"),
        (name = "receipts", description = "Receipt OCR and reconciliation"),
        (name = "health", description = "Liveness and status")
    ),
    paths(
        crate::auth::login_handler,
        crate::auth::me_handler,
        crate::auth::create_admin_handler,

        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::create_order,
        crate::handlers::orders::update_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::delete_order,

        crate::handlers::products::list_products,
        crate::handlers::products::check_duplicate,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::list_variants,
        crate::handlers::products::create_variant,
        crate::handlers::products::update_variant,
        crate::handlers::products::delete_variant,
        crate::handlers::products::get_variant_group,
        crate::handlers::products::list_master_products,
        crate::handlers::products::create_master_product,
        crate::handlers::products::clone_master_product,

        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,

        crate::handlers::delivery_partners::list_partners,
        crate::handlers::delivery_partners::get_partner,
        crate::handlers::delivery_partners::create_partner,
        crate::handlers::delivery_partners::update_partner,
        crate::handlers::delivery_partners::delete_partner,
        crate::handlers::delivery_partners::set_availability,
        crate::handlers::delivery_partners::record_location,
        crate::handlers::delivery_partners::list_locations,
        crate::handlers::delivery_partners::record_rejection,
        crate::handlers::delivery_partners::list_rejections,

        crate::handlers::messages::list_messages,
        crate::handlers::messages::active_messages,
        crate::handlers::messages::get_message,
        crate::handlers::messages::create_message,
        crate::handlers::messages::update_message,
        crate::handlers::messages::delete_message,

        crate::handlers::settings::list_flags,
        crate::handlers::settings::upsert_flag,
        crate::handlers::settings::delete_flag,
        crate::handlers::settings::evaluate_flag,
        crate::handlers::settings::list_configs,
        crate::handlers::settings::upsert_config,
        crate::handlers::settings::delete_config,
        crate::handlers::settings::resolve_config,

        crate::handlers::preferences::get_list_state,
        crate::handlers::preferences::save_list_state,

        crate::handlers::bulk::bulk_products,
        crate::handlers::bulk::bulk_orders,

        crate::handlers::imports::preview_products,
        crate::handlers::imports::import_products,

        crate::handlers::receipts::extract_receipt,
        crate::handlers::receipts::reconcile_receipt,
        crate::handlers::receipts::import_receipt,

        crate::handlers::health::liveness_check,
        crate::handlers::health::readiness_check,
        crate::handlers::health::detailed_health_check,
        crate::handlers::health::api_status,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::ResponseMeta,
            crate::entities::ScopeKind,
            crate::entities::user::UserRole,
            crate::entities::order::OrderStatus,
            crate::entities::product::ProductStatus,
            crate::reconciliation::OutcomeAction,
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
