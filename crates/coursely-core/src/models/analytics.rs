use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Filters shared by every analytics function
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// Tenant to scope to; ignored for non-admin callers
    pub tenant_id: Option<Uuid>,
    /// Inclusive start date (YYYY-MM-DD)
    pub start_date: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD)
    pub end_date: Option<NaiveDate>,
}

impl AnalyticsQuery {
    /// Start of `start_date` as a UTC instant.
    pub fn start_at(&self) -> Option<DateTime<Utc>> {
        self.start_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Exclusive upper bound: midnight after `end_date`.
    pub fn end_before(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub total_users: i64,
    pub total_courses: i64,
    pub published_courses: i64,
    pub total_enrollments: i64,
    pub completed_enrollments: i64,
    #[schema(value_type = String)]
    pub net_revenue: Decimal,
    pub certificates_issued: i64,
    pub live_classes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyAmount {
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MethodRevenue {
    pub payment_method: String,
    pub payments: i64,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStats {
    #[schema(value_type = String)]
    pub gross_revenue: Decimal,
    #[schema(value_type = String)]
    pub refunded_amount: Decimal,
    #[schema(value_type = String)]
    pub net_revenue: Decimal,
    pub completed_payments: i64,
    #[schema(value_type = String)]
    pub average_order_value: Decimal,
    pub by_payment_method: Vec<MethodRevenue>,
    pub daily: Vec<DailyAmount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseCount {
    pub course_id: Uuid,
    pub title: String,
    pub enrollments: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentStats {
    pub total_enrollments: i64,
    pub completed_enrollments: i64,
    /// Percentage, two decimals
    pub completion_rate: f64,
    pub daily: Vec<DailyCount>,
    pub top_courses: Vec<CourseCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserGrowthStats {
    pub new_users: i64,
    pub daily: Vec<DailyCount>,
    pub by_role: Vec<LabelCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoursePerformance {
    pub course_id: Uuid,
    pub title: String,
    pub enrollments: i64,
    pub completions: i64,
    pub completion_rate: f64,
    #[schema(value_type = String)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveClassStats {
    pub total: i64,
    pub by_status: Vec<LabelCount>,
    pub by_platform: Vec<LabelCount>,
}

/// Percentage rounded to two decimals; zero when the denominator is zero.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 10_000.0).round() / 100.0
}
