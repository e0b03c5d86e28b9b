pub mod admin_messages;
pub mod app_configs;
pub mod bulk;
pub mod delivery_partners;
pub mod feature_flags;
pub mod imports;
pub mod list_preferences;
pub mod ocr;
pub mod orders;
pub mod products;
pub mod receipts;
pub mod scoping;
pub mod users;

use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};
use validator::ValidationError;

/// `lower(column) LIKE '%term%'`, with the term lowercased.
pub(crate) fn contains_ci<C: IntoColumnRef>(column: C, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", term.trim().to_lowercase()))
}

/// `lower(column) = value`, with the value lowercased and trimmed.
pub(crate) fn equals_ci<C: IntoColumnRef>(column: C, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).eq(value.trim().to_lowercase())
}

pub(crate) fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("must_not_be_negative"));
    }
    Ok(())
}

/// Turns a 1-based page into the 0-based index the paginator expects.
pub(crate) fn page_index(page: u64) -> u64 {
    page.max(1) - 1
}
