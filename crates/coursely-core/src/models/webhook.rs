use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

use super::PaymentMethod;

/// Source of an inbound gateway callback
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "webhook_provider", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum WebhookProvider {
    Razorpay,
    Cashfree,
}

impl From<WebhookProvider> for PaymentMethod {
    fn from(provider: WebhookProvider) -> Self {
        match provider {
            WebhookProvider::Razorpay => PaymentMethod::Razorpay,
            WebhookProvider::Cashfree => PaymentMethod::Cashfree,
        }
    }
}

impl Display for WebhookProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            WebhookProvider::Razorpay => write!(f, "razorpay"),
            WebhookProvider::Cashfree => write!(f, "cashfree"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "webhook_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Pending,
    Processed,
    Failed,
}

/// Append-only audit record of an inbound callback
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct WebhookRecord {
    pub id: Uuid,
    pub provider: WebhookProvider,
    pub event_type: String,
    pub event_id: Option<String>,
    #[schema(value_type = Object)]
    pub payload: JsonValue,
    pub signature_verified: bool,
    pub status: WebhookStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewWebhookRecord {
    pub provider: WebhookProvider,
    pub event_type: String,
    pub event_id: Option<String>,
    pub payload: JsonValue,
    pub signature_verified: bool,
}

/// Body returned to the gateway after intake
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    pub duplicate: bool,
    pub record_id: Uuid,
}
