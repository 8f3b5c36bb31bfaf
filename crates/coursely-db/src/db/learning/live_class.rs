use coursely_core::models::{LiveClass, LiveClassStatus, NewLiveClass};
use coursely_core::AppError;
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;

/// Instructor and tenant owning a course, used to authorize scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseOwner {
    pub instructor_id: Uuid,
    pub tenant_id: Uuid,
}

#[async_trait::async_trait]
pub trait LiveClassRepositoryTrait: Send + Sync {
    async fn course_owner(&self, course_id: Uuid) -> Result<Option<CourseOwner>, AppError>;

    async fn insert(&self, live_class: NewLiveClass) -> Result<LiveClass, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<LiveClass>, AppError>;

    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<LiveClass>, AppError>;

    /// Moves the class to `status` only while it is still in `expected`.
    async fn transition(
        &self,
        id: Uuid,
        expected: LiveClassStatus,
        status: LiveClassStatus,
    ) -> Result<Option<LiveClass>, AppError>;
}

#[derive(Clone)]
pub struct LiveClassRepository {
    pool: PgPool,
}

impl LiveClassRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LiveClassRepositoryTrait for LiveClassRepository {
    #[tracing::instrument(skip(self), fields(db.table = "courses", db.operation = "select"))]
    async fn course_owner(&self, course_id: Uuid) -> Result<Option<CourseOwner>, AppError> {
        let row = sqlx::query("SELECT instructor_id, tenant_id FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| CourseOwner {
            instructor_id: row.get("instructor_id"),
            tenant_id: row.get("tenant_id"),
        }))
    }

    #[tracing::instrument(skip(self, live_class), fields(db.table = "live_classes", db.operation = "insert"))]
    async fn insert(&self, live_class: NewLiveClass) -> Result<LiveClass, AppError> {
        let created = sqlx::query_as::<Postgres, LiveClass>(
            r#"
            INSERT INTO live_classes (
                course_id, tenant_id, instructor_id, title, description, platform,
                meeting_id, join_url, host_url, scheduled_at, duration_minutes, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'scheduled')
            RETURNING *
            "#,
        )
        .bind(live_class.course_id)
        .bind(live_class.tenant_id)
        .bind(live_class.instructor_id)
        .bind(&live_class.title)
        .bind(&live_class.description)
        .bind(live_class.platform)
        .bind(&live_class.meeting_id)
        .bind(&live_class.join_url)
        .bind(&live_class.host_url)
        .bind(live_class.scheduled_at)
        .bind(live_class.duration_minutes)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "live_classes", db.operation = "select"))]
    async fn get(&self, id: Uuid) -> Result<Option<LiveClass>, AppError> {
        let live_class =
            sqlx::query_as::<Postgres, LiveClass>("SELECT * FROM live_classes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(live_class)
    }

    #[tracing::instrument(skip(self), fields(db.table = "live_classes", db.operation = "select"))]
    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<LiveClass>, AppError> {
        let classes = sqlx::query_as::<Postgres, LiveClass>(
            "SELECT * FROM live_classes WHERE course_id = $1 ORDER BY scheduled_at ASC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(classes)
    }

    #[tracing::instrument(skip(self), fields(db.table = "live_classes", db.operation = "update"))]
    async fn transition(
        &self,
        id: Uuid,
        expected: LiveClassStatus,
        status: LiveClassStatus,
    ) -> Result<Option<LiveClass>, AppError> {
        let updated = sqlx::query_as::<Postgres, LiveClass>(
            r#"
            UPDATE live_classes
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }
}
