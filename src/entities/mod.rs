pub mod admin_message;
pub mod admin_user;
pub mod app_config;
pub mod delivery_location_log;
pub mod delivery_partner;
pub mod delivery_rejection;
pub mod feature_flag;
pub mod list_preference;
pub mod master_product;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_variant;
pub mod scope;
pub mod user;

pub use scope::ScopeKind;
