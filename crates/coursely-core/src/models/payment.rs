use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::Invoice;

/// Payment gateway used for a payment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "payment_method", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Razorpay,
    Cashfree,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Razorpay => "razorpay",
            PaymentMethod::Cashfree => "cashfree",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "razorpay" => Ok(PaymentMethod::Razorpay),
            "cashfree" => Ok(PaymentMethod::Cashfree),
            _ => Err(anyhow::anyhow!("Unsupported payment method: {}", s)),
        }
    }
}

/// Payment lifecycle status
///
/// `pending → completed | failed`, then `completed → partially_refunded → refunded`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
    PartiallyRefunded,
}

impl PaymentStatus {
    /// Whether a refund may be issued against a payment in this status.
    pub fn is_refundable(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed | PaymentStatus::PartiallyRefunded
        )
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
            PaymentStatus::PartiallyRefunded => write!(f, "partially_refunded"),
        }
    }
}

/// Payment entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    #[schema(value_type = String, example = "1180.00")]
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    /// Gateway payment id, set on verification
    pub payment_id: Option<String>,
    /// Gateway order id
    pub order_id: String,
    pub status: PaymentStatus,
    #[schema(value_type = String, example = "0.00")]
    pub refunded_amount: Decimal,
    pub invoice_id: Option<Uuid>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a new pending payment
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub order_id: String,
    pub invoice_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub course_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    #[validate(custom(function = "crate::validation::positive_amount"))]
    #[schema(value_type = String, example = "1000")]
    pub amount: Decimal,
    #[validate(custom(function = "crate::validation::currency_code"))]
    pub currency: String,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub payment: Payment,
    /// Raw order payload returned by the gateway
    #[schema(value_type = Object)]
    pub order: JsonValue,
    pub invoice: Invoice,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, max = 255, message = "paymentId is required"))]
    pub payment_id: String,
    #[validate(length(min = 1, max = 255, message = "orderId is required"))]
    pub order_id: String,
    /// Required for Razorpay, ignored by Cashfree
    #[serde(default)]
    pub signature: Option<String>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub payment: Payment,
}

/// Refund reason codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "refund_reason", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum RefundReason {
    RequestedByCustomer,
    Duplicate,
    Fraudulent,
    CourseCancelled,
    Other,
}

impl Display for RefundReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RefundReason::RequestedByCustomer => write!(f, "requested_by_customer"),
            RefundReason::Duplicate => write!(f, "duplicate"),
            RefundReason::Fraudulent => write!(f, "fraudulent"),
            RefundReason::CourseCancelled => write!(f, "course_cancelled"),
            RefundReason::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "refund_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Refund entity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    pub id: Uuid,
    pub payment_id: Uuid,
    #[schema(value_type = String, example = "100.00")]
    pub amount: Decimal,
    pub reason: RefundReason,
    pub notes: Option<String>,
    pub status: RefundStatus,
    pub provider_refund_id: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRefund {
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub reason: RefundReason,
    pub notes: Option<String>,
    pub status: RefundStatus,
    pub provider_refund_id: Option<String>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRefundRequest {
    #[validate(custom(function = "crate::validation::positive_amount"))]
    #[schema(value_type = String, example = "100.00")]
    pub amount: Decimal,
    pub reason: RefundReason,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefundResponse {
    pub refund: Refund,
    pub payment: Payment,
}
