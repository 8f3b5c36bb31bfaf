//! Aggregate reports. Instructors see their own tenant; admins may pass any `tenant_id`
//! or none for platform-wide numbers.

use crate::auth::CurrentUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use coursely_core::models::{
    AnalyticsQuery, CoursePerformance, EnrollmentStats, LiveClassStats, OverviewStats,
    RevenueStats, UserGrowthStats,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CoursePerformanceQuery {
    /// Number of courses, 1-100 (default 20)
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/analytics/overview",
    tag = "analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Headline counts", body = OverviewStats),
        (status = 400, description = "start_date after end_date"),
        (status = 403, description = "Instructor role required")
    )
)]
pub async fn overview(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.analytics.overview(&user.actor(), &query).await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/revenue",
    tag = "analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Revenue totals and trend", body = RevenueStats)
    )
)]
pub async fn revenue(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.analytics.revenue(&user.actor(), &query).await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/enrollments",
    tag = "analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Enrollment totals, trend and top courses", body = EnrollmentStats)
    )
)]
pub async fn enrollments(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.analytics.enrollments(&user.actor(), &query).await?))
}

#[utoipa::path(
    get,
    path = "/api/analytics/user-growth",
    tag = "analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "New users per day and users by role", body = UserGrowthStats)
    )
)]
pub async fn user_growth(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.analytics.user_growth(&user.actor(), &query).await?))
}

// Both query structs read the same query string; neither rejects unknown keys.
#[utoipa::path(
    get,
    path = "/api/analytics/course-performance",
    tag = "analytics",
    params(AnalyticsQuery, CoursePerformanceQuery),
    responses(
        (status = 200, description = "Per-course enrollments, completions and revenue", body = Vec<CoursePerformance>)
    )
)]
pub async fn course_performance(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<AnalyticsQuery>,
    Query(page): Query<CoursePerformanceQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let rows = state
        .analytics
        .course_performance(&user.actor(), &query, page.limit)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/analytics/live-classes",
    tag = "analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Live classes by status and platform", body = LiveClassStats)
    )
)]
pub async fn live_classes(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.analytics.live_classes(&user.actor(), &query).await?))
}
