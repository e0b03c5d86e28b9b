pub mod bulk;
pub mod common;
pub mod delivery_partners;
pub mod health;
pub mod imports;
pub mod messages;
pub mod orders;
pub mod preferences;
pub mod products;
pub mod receipts;
pub mod settings;
pub mod users;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    reconciliation::CatalogStore,
    services::{
        admin_messages::AdminMessageService, app_configs::AppConfigService, bulk::BulkService,
        delivery_partners::DeliveryPartnerService, feature_flags::FeatureFlagService,
        imports::ImportService, list_preferences::ListPreferenceService, ocr::OcrBackend,
        orders::OrderService, products::ProductService, receipts::ReceiptService,
        users::UserService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub products: Arc<ProductService>,
    pub users: Arc<UserService>,
    pub delivery_partners: Arc<DeliveryPartnerService>,
    pub admin_messages: Arc<AdminMessageService>,
    pub feature_flags: Arc<FeatureFlagService>,
    pub app_configs: Arc<AppConfigService>,
    pub list_preferences: Arc<ListPreferenceService>,
    pub bulk: Arc<BulkService>,
    pub imports: Arc<ImportService>,
    pub receipts: Arc<ReceiptService>,
}

impl AppServices {
    /// Wires every service against one pool and event channel. `ocr` is
    /// `None` when no provider is configured; receipt extraction then
    /// answers 503 while reconciliation keeps working.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        config: &AppConfig,
        ocr: Option<Arc<dyn OcrBackend>>,
    ) -> Self {
        let orders = Arc::new(OrderService::new(db_pool.clone(), event_sender.clone()));
        let products = Arc::new(ProductService::new(db_pool.clone(), event_sender.clone()));

        let bulk = Arc::new(BulkService::new(
            products.clone(),
            orders.clone(),
            event_sender.clone(),
            config.bulk_concurrency,
        ));
        let imports = Arc::new(ImportService::new(
            products.clone(),
            event_sender.clone(),
            config.import_max_rows,
            config.bulk_concurrency,
        ));
        let catalog: Arc<dyn CatalogStore> = products.clone();
        let receipts = Arc::new(ReceiptService::new(ocr, catalog, event_sender.clone()));

        Self {
            users: Arc::new(UserService::new(db_pool.clone())),
            delivery_partners: Arc::new(DeliveryPartnerService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            admin_messages: Arc::new(AdminMessageService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            feature_flags: Arc::new(FeatureFlagService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            app_configs: Arc::new(AppConfigService::new(db_pool.clone(), event_sender)),
            list_preferences: Arc::new(ListPreferenceService::new(
                db_pool,
                config.api_default_page_size,
                config.api_max_page_size,
            )),
            orders,
            products,
            bulk,
            imports,
            receipts,
        }
    }
}
