use chrono::{DateTime, Duration, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Billing interval of a subscription plan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "plan_interval", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PlanInterval {
    Week,
    Month,
    Year,
}

impl PlanInterval {
    /// End of a billing period of `count` intervals starting at `start`.
    ///
    /// Month arithmetic clamps to the last day of the target month (Jan 31 + 1 month = Feb 28/29).
    pub fn advance(&self, start: DateTime<Utc>, count: u32) -> Option<DateTime<Utc>> {
        match self {
            PlanInterval::Week => start.checked_add_signed(Duration::weeks(i64::from(count))),
            PlanInterval::Month => start.checked_add_months(Months::new(count)),
            PlanInterval::Year => start.checked_add_months(Months::new(count.checked_mul(12)?)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "subscription_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "499.00")]
    pub price: Decimal,
    pub currency: String,
    pub interval: PlanInterval,
    pub interval_count: i32,
    pub trial_days: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub status: SubscriptionStatus,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub trial_start: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub trial_start: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    #[validate(length(min = 2, max = 120, message = "Name must be between 2 and 120 characters"))]
    pub name: String,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "crate::validation::positive_amount"))]
    #[schema(value_type = String, example = "499.00")]
    pub price: Decimal,
    #[validate(custom(function = "crate::validation::currency_code"))]
    pub currency: String,
    pub interval: PlanInterval,
    #[serde(default = "default_interval_count")]
    #[validate(range(min = 1, max = 36, message = "intervalCount must be between 1 and 36"))]
    pub interval_count: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 365, message = "trialDays must be between 0 and 365"))]
    pub trial_days: i32,
}

fn default_interval_count() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub plan_id: Uuid,
}
