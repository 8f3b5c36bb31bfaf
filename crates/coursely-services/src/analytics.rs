//! Tenant-scoped analytics

use coursely_core::models::{
    AnalyticsQuery, CoursePerformance, EnrollmentStats, LiveClassStats, OverviewStats,
    RevenueStats, UserGrowthStats, UserRole,
};
use coursely_core::AppError;
use coursely_db::{AnalyticsFilter, AnalyticsRepositoryTrait};
use std::sync::Arc;

use crate::actor::Actor;

const MAX_COURSE_PERFORMANCE_ROWS: i64 = 100;

/// Aggregates for dashboards. Admins may scope to any tenant or none; instructors see
/// their own tenant only. Students have no access.
#[derive(Clone)]
pub struct AnalyticsService {
    analytics: Arc<dyn AnalyticsRepositoryTrait>,
}

impl AnalyticsService {
    pub fn new(analytics: Arc<dyn AnalyticsRepositoryTrait>) -> Self {
        Self { analytics }
    }

    fn filter(&self, actor: &Actor, query: &AnalyticsQuery) -> Result<AnalyticsFilter, AppError> {
        actor.require(UserRole::Instructor)?;
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            if start > end {
                return Err(AppError::InvalidInput(
                    "start_date must not be after end_date".to_string(),
                ));
            }
        }
        Ok(AnalyticsFilter::new(actor.scoped_tenant(query.tenant_id), query))
    }

    pub async fn overview(
        &self,
        actor: &Actor,
        query: &AnalyticsQuery,
    ) -> Result<OverviewStats, AppError> {
        let filter = self.filter(actor, query)?;
        self.analytics.overview(&filter).await
    }

    pub async fn revenue(
        &self,
        actor: &Actor,
        query: &AnalyticsQuery,
    ) -> Result<RevenueStats, AppError> {
        let filter = self.filter(actor, query)?;
        self.analytics.revenue(&filter).await
    }

    pub async fn enrollments(
        &self,
        actor: &Actor,
        query: &AnalyticsQuery,
    ) -> Result<EnrollmentStats, AppError> {
        let filter = self.filter(actor, query)?;
        self.analytics.enrollments(&filter).await
    }

    pub async fn user_growth(
        &self,
        actor: &Actor,
        query: &AnalyticsQuery,
    ) -> Result<UserGrowthStats, AppError> {
        let filter = self.filter(actor, query)?;
        self.analytics.user_growth(&filter).await
    }

    pub async fn course_performance(
        &self,
        actor: &Actor,
        query: &AnalyticsQuery,
        limit: Option<i64>,
    ) -> Result<Vec<CoursePerformance>, AppError> {
        let filter = self.filter(actor, query)?;
        let limit = limit.unwrap_or(20).clamp(1, MAX_COURSE_PERFORMANCE_ROWS);
        self.analytics.course_performance(&filter, limit).await
    }

    pub async fn live_classes(
        &self,
        actor: &Actor,
        query: &AnalyticsQuery,
    ) -> Result<LiveClassStats, AppError> {
        let filter = self.filter(actor, query)?;
        self.analytics.live_classes(&filter).await
    }
}
