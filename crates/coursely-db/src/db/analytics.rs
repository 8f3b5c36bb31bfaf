use chrono::{DateTime, NaiveDate, Utc};
use coursely_core::models::{
    percentage, AnalyticsQuery, CourseCount, CoursePerformance, DailyAmount, DailyCount,
    EnrollmentStats, LabelCount, LiveClassStats, MethodRevenue, OverviewStats, RevenueStats,
    UserGrowthStats,
};
use coursely_core::money::round_money;
use coursely_core::AppError;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Payment statuses that represent captured money.
const SETTLED: &str = "('completed', 'partially_refunded', 'refunded')";

/// Tenant scope and half-open `[start, end)` time range applied to every aggregate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyticsFilter {
    pub tenant_id: Option<Uuid>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl AnalyticsFilter {
    pub fn new(tenant_id: Option<Uuid>, query: &AnalyticsQuery) -> Self {
        Self {
            tenant_id,
            start: query.start_at(),
            end: query.end_before(),
        }
    }
}

/// `WHERE`-fragment over `$1` (tenant), `$2` (start) and `$3` (end). Every query binds all
/// three so absent filters are expressed as NULL parameters.
fn scope(tenant_column: &str, time_column: &str) -> String {
    format!(
        "($1::uuid IS NULL OR {tenant} = $1) \
         AND ($2::timestamptz IS NULL OR {time} >= $2) \
         AND ($3::timestamptz IS NULL OR {time} < $3)",
        tenant = tenant_column,
        time = time_column
    )
}

fn daily_counts(rows: Vec<PgRow>) -> Vec<DailyCount> {
    rows.into_iter()
        .map(|row| DailyCount {
            date: row.get::<NaiveDate, _>("day"),
            count: row.get("count"),
        })
        .collect()
}

fn label_counts(rows: Vec<PgRow>) -> Vec<LabelCount> {
    rows.into_iter()
        .map(|row| LabelCount {
            label: row.get("label"),
            count: row.get("count"),
        })
        .collect()
}

#[async_trait::async_trait]
pub trait AnalyticsRepositoryTrait: Send + Sync {
    async fn overview(&self, filter: &AnalyticsFilter) -> Result<OverviewStats, AppError>;

    async fn revenue(&self, filter: &AnalyticsFilter) -> Result<RevenueStats, AppError>;

    async fn enrollments(&self, filter: &AnalyticsFilter) -> Result<EnrollmentStats, AppError>;

    async fn user_growth(&self, filter: &AnalyticsFilter) -> Result<UserGrowthStats, AppError>;

    async fn course_performance(
        &self,
        filter: &AnalyticsFilter,
        limit: i64,
    ) -> Result<Vec<CoursePerformance>, AppError>;

    async fn live_classes(&self, filter: &AnalyticsFilter) -> Result<LiveClassStats, AppError>;
}

#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_all(&self, sql: &str, filter: &AnalyticsFilter) -> Result<Vec<PgRow>, AppError> {
        let rows = sqlx::query(sql)
            .bind(filter.tenant_id)
            .bind(filter.start)
            .bind(filter.end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_one(&self, sql: &str, filter: &AnalyticsFilter) -> Result<PgRow, AppError> {
        let row = sqlx::query(sql)
            .bind(filter.tenant_id)
            .bind(filter.start)
            .bind(filter.end)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait::async_trait]
impl AnalyticsRepositoryTrait for AnalyticsRepository {
    #[tracing::instrument(skip(self), fields(db.table = "*", db.operation = "aggregate"))]
    async fn overview(&self, filter: &AnalyticsFilter) -> Result<OverviewStats, AppError> {
        let sql = format!(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE {users}) AS total_users,
                (SELECT COUNT(*) FROM courses WHERE {courses}) AS total_courses,
                (SELECT COUNT(*) FROM courses WHERE {courses} AND is_published) AS published_courses,
                (SELECT COUNT(*) FROM enrollments WHERE {enrollments}) AS total_enrollments,
                (SELECT COUNT(*) FROM enrollments WHERE {enrollments} AND status = 'completed') AS completed_enrollments,
                (SELECT COALESCE(SUM(amount - refunded_amount), 0) FROM payments
                    WHERE {payments} AND status IN {settled}) AS net_revenue,
                (SELECT COUNT(*) FROM certificates WHERE {certificates} AND status = 'issued') AS certificates_issued,
                (SELECT COUNT(*) FROM live_classes WHERE {live}) AS live_classes
            "#,
            users = scope("tenant_id", "created_at"),
            courses = scope("tenant_id", "created_at"),
            enrollments = scope("tenant_id", "enrolled_at"),
            payments = scope("tenant_id", "created_at"),
            certificates = scope("tenant_id", "issued_at"),
            live = scope("tenant_id", "scheduled_at"),
            settled = SETTLED,
        );

        let row = self.fetch_one(&sql, filter).await?;
        Ok(OverviewStats {
            total_users: row.get("total_users"),
            total_courses: row.get("total_courses"),
            published_courses: row.get("published_courses"),
            total_enrollments: row.get("total_enrollments"),
            completed_enrollments: row.get("completed_enrollments"),
            net_revenue: row.get("net_revenue"),
            certificates_issued: row.get("certificates_issued"),
            live_classes: row.get("live_classes"),
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "payments", db.operation = "aggregate"))]
    async fn revenue(&self, filter: &AnalyticsFilter) -> Result<RevenueStats, AppError> {
        let where_clause = format!(
            "{} AND status IN {}",
            scope("tenant_id", "created_at"),
            SETTLED
        );

        let totals = self
            .fetch_one(
                &format!(
                    r#"
                    SELECT
                        COALESCE(SUM(amount), 0) AS gross,
                        COALESCE(SUM(refunded_amount), 0) AS refunded,
                        COUNT(*) AS payments
                    FROM payments
                    WHERE {}
                    "#,
                    where_clause
                ),
                filter,
            )
            .await?;

        let by_method = self
            .fetch_all(
                &format!(
                    r#"
                    SELECT payment_method::text AS method, COUNT(*) AS payments,
                           COALESCE(SUM(amount - refunded_amount), 0) AS amount
                    FROM payments
                    WHERE {}
                    GROUP BY payment_method
                    ORDER BY amount DESC
                    "#,
                    where_clause
                ),
                filter,
            )
            .await?
            .into_iter()
            .map(|row| MethodRevenue {
                payment_method: row.get("method"),
                payments: row.get("payments"),
                amount: row.get("amount"),
            })
            .collect();

        let daily = self
            .fetch_all(
                &format!(
                    r#"
                    SELECT DATE(created_at AT TIME ZONE 'UTC') AS day,
                           COALESCE(SUM(amount - refunded_amount), 0) AS amount
                    FROM payments
                    WHERE {}
                    GROUP BY day
                    ORDER BY day
                    "#,
                    where_clause
                ),
                filter,
            )
            .await?
            .into_iter()
            .map(|row| DailyAmount {
                date: row.get::<NaiveDate, _>("day"),
                amount: row.get("amount"),
            })
            .collect();

        let gross: Decimal = totals.get("gross");
        let refunded: Decimal = totals.get("refunded");
        let completed_payments: i64 = totals.get("payments");
        let average_order_value = if completed_payments > 0 {
            round_money(gross / Decimal::from(completed_payments))
        } else {
            Decimal::ZERO
        };

        Ok(RevenueStats {
            gross_revenue: gross,
            refunded_amount: refunded,
            net_revenue: gross - refunded,
            completed_payments,
            average_order_value,
            by_payment_method: by_method,
            daily,
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "enrollments", db.operation = "aggregate"))]
    async fn enrollments(&self, filter: &AnalyticsFilter) -> Result<EnrollmentStats, AppError> {
        let where_clause = scope("e.tenant_id", "e.enrolled_at");

        let totals = self
            .fetch_one(
                &format!(
                    r#"
                    SELECT COUNT(*) AS total,
                           COUNT(*) FILTER (WHERE e.status = 'completed') AS completed
                    FROM enrollments e
                    WHERE {}
                    "#,
                    where_clause
                ),
                filter,
            )
            .await?;

        let daily = daily_counts(
            self.fetch_all(
                &format!(
                    r#"
                    SELECT DATE(e.enrolled_at AT TIME ZONE 'UTC') AS day, COUNT(*) AS count
                    FROM enrollments e
                    WHERE {}
                    GROUP BY day
                    ORDER BY day
                    "#,
                    where_clause
                ),
                filter,
            )
            .await?,
        );

        let top_courses = self
            .fetch_all(
                &format!(
                    r#"
                    SELECT c.id AS course_id, c.title, COUNT(*) AS enrollments
                    FROM enrollments e
                    JOIN courses c ON c.id = e.course_id
                    WHERE {}
                    GROUP BY c.id, c.title
                    ORDER BY enrollments DESC, c.title
                    LIMIT 10
                    "#,
                    where_clause
                ),
                filter,
            )
            .await?
            .into_iter()
            .map(|row| CourseCount {
                course_id: row.get("course_id"),
                title: row.get("title"),
                enrollments: row.get("enrollments"),
            })
            .collect();

        let total: i64 = totals.get("total");
        let completed: i64 = totals.get("completed");
        Ok(EnrollmentStats {
            total_enrollments: total,
            completed_enrollments: completed,
            completion_rate: percentage(completed, total),
            daily,
            top_courses,
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "aggregate"))]
    async fn user_growth(&self, filter: &AnalyticsFilter) -> Result<UserGrowthStats, AppError> {
        let where_clause = scope("tenant_id", "created_at");

        let daily = daily_counts(
            self.fetch_all(
                &format!(
                    r#"
                    SELECT DATE(created_at AT TIME ZONE 'UTC') AS day, COUNT(*) AS count
                    FROM users
                    WHERE {}
                    GROUP BY day
                    ORDER BY day
                    "#,
                    where_clause
                ),
                filter,
            )
            .await?,
        );

        let by_role = label_counts(
            self.fetch_all(
                &format!(
                    r#"
                    SELECT role::text AS label, COUNT(*) AS count
                    FROM users
                    WHERE {}
                    GROUP BY role
                    ORDER BY role
                    "#,
                    where_clause
                ),
                filter,
            )
            .await?,
        );

        Ok(UserGrowthStats {
            new_users: daily.iter().map(|d| d.count).sum(),
            daily,
            by_role,
        })
    }

    #[tracing::instrument(skip(self), fields(db.table = "courses", db.operation = "aggregate"))]
    async fn course_performance(
        &self,
        filter: &AnalyticsFilter,
        limit: i64,
    ) -> Result<Vec<CoursePerformance>, AppError> {
        let sql = format!(
            r#"
            SELECT
                c.id AS course_id,
                c.title,
                (SELECT COUNT(*) FROM enrollments e
                    WHERE e.course_id = c.id
                      AND ($2::timestamptz IS NULL OR e.enrolled_at >= $2)
                      AND ($3::timestamptz IS NULL OR e.enrolled_at < $3)) AS enrollments,
                (SELECT COUNT(*) FROM enrollments e
                    WHERE e.course_id = c.id AND e.status = 'completed'
                      AND ($2::timestamptz IS NULL OR e.enrolled_at >= $2)
                      AND ($3::timestamptz IS NULL OR e.enrolled_at < $3)) AS completions,
                (SELECT COALESCE(SUM(p.amount - p.refunded_amount), 0) FROM payments p
                    WHERE p.course_id = c.id AND p.status IN {settled}
                      AND ($2::timestamptz IS NULL OR p.created_at >= $2)
                      AND ($3::timestamptz IS NULL OR p.created_at < $3)) AS revenue
            FROM courses c
            WHERE ($1::uuid IS NULL OR c.tenant_id = $1)
            ORDER BY enrollments DESC, revenue DESC, c.title
            LIMIT $4
            "#,
            settled = SETTLED,
        );

        let rows = sqlx::query(&sql)
            .bind(filter.tenant_id)
            .bind(filter.start)
            .bind(filter.end)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let enrollments: i64 = row.get("enrollments");
                let completions: i64 = row.get("completions");
                CoursePerformance {
                    course_id: row.get("course_id"),
                    title: row.get("title"),
                    enrollments,
                    completions,
                    completion_rate: percentage(completions, enrollments),
                    revenue: row.get("revenue"),
                }
            })
            .collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "live_classes", db.operation = "aggregate"))]
    async fn live_classes(&self, filter: &AnalyticsFilter) -> Result<LiveClassStats, AppError> {
        let where_clause = scope("tenant_id", "scheduled_at");

        let by_status = label_counts(
            self.fetch_all(
                &format!(
                    "SELECT status::text AS label, COUNT(*) AS count FROM live_classes WHERE {} GROUP BY status ORDER BY status",
                    where_clause
                ),
                filter,
            )
            .await?,
        );

        let by_platform = label_counts(
            self.fetch_all(
                &format!(
                    "SELECT platform::text AS label, COUNT(*) AS count FROM live_classes WHERE {} GROUP BY platform ORDER BY platform",
                    where_clause
                ),
                filter,
            )
            .await?,
        );

        Ok(LiveClassStats {
            total: by_status.iter().map(|s| s.count).sum(),
            by_status,
            by_platform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_uses_half_open_range() {
        let query = AnalyticsQuery {
            tenant_id: None,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31),
        };
        let filter = AnalyticsFilter::new(None, &query);
        assert_eq!(filter.start.unwrap().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(filter.end.unwrap().to_rfc3339(), "2024-04-01T00:00:00+00:00");
    }

    #[test]
    fn test_scope_references_all_parameters() {
        let clause = scope("e.tenant_id", "e.enrolled_at");
        assert!(clause.contains("e.tenant_id = $1"));
        assert!(clause.contains("e.enrolled_at >= $2"));
        assert!(clause.contains("e.enrolled_at < $3"));
    }
}
