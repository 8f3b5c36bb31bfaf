use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "invoice_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Paid,
}

/// Invoice entity
///
/// Created as `draft` before the gateway order is opened, so the order amount already
/// includes tax. Becomes `paid` when the linked payment verifies.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    #[schema(value_type = String, example = "1000.00")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "180.00")]
    pub tax_amount: Decimal,
    #[schema(value_type = String, example = "1180.00")]
    pub total_amount: Decimal,
    pub currency: String,
    pub status: InvoiceStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new draft invoice; the number is allocated by the repository.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
}
