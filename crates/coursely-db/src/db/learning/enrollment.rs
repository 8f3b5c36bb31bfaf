use coursely_core::models::Enrollment;
use coursely_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait EnrollmentRepositoryTrait: Send + Sync {
    async fn find(&self, user_id: Uuid, course_id: Uuid) -> Result<Option<Enrollment>, AppError>;

    /// Creates an `active` enrollment, reactivating a cancelled one.
    async fn enroll(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<Enrollment, AppError>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Enrollment>, AppError>;

    /// Sets progress; reaching 100 marks the enrollment `completed`.
    async fn update_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        progress: i32,
    ) -> Result<Option<Enrollment>, AppError>;
}

#[derive(Clone)]
pub struct EnrollmentRepository {
    pool: PgPool,
}

impl EnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EnrollmentRepositoryTrait for EnrollmentRepository {
    #[tracing::instrument(skip(self), fields(db.table = "enrollments", db.operation = "select"))]
    async fn find(&self, user_id: Uuid, course_id: Uuid) -> Result<Option<Enrollment>, AppError> {
        let enrollment = sqlx::query_as::<Postgres, Enrollment>(
            "SELECT * FROM enrollments WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "enrollments", db.operation = "upsert"))]
    async fn enroll(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<Enrollment, AppError> {
        let enrollment = sqlx::query_as::<Postgres, Enrollment>(
            r#"
            INSERT INTO enrollments (user_id, course_id, tenant_id, status)
            VALUES ($1, $2, $3, 'active')
            ON CONFLICT (user_id, course_id) DO UPDATE
            SET status = CASE
                    WHEN enrollments.status = 'cancelled' THEN 'active'::enrollment_status
                    ELSE enrollments.status
                END,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(enrollment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "enrollments", db.operation = "select"))]
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Enrollment>, AppError> {
        let enrollments = sqlx::query_as::<Postgres, Enrollment>(
            "SELECT * FROM enrollments WHERE user_id = $1 ORDER BY enrolled_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(enrollments)
    }

    #[tracing::instrument(skip(self), fields(db.table = "enrollments", db.operation = "update"))]
    async fn update_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        progress: i32,
    ) -> Result<Option<Enrollment>, AppError> {
        // Completion is sticky: lowering progress afterwards does not reopen the enrollment
        let enrollment = sqlx::query_as::<Postgres, Enrollment>(
            r#"
            UPDATE enrollments
            SET progress = $3,
                status = CASE
                    WHEN $3 >= 100 THEN 'completed'::enrollment_status
                    ELSE status
                END,
                completed_at = CASE
                    WHEN $3 >= 100 THEN COALESCE(completed_at, NOW())
                    ELSE completed_at
                END,
                updated_at = NOW()
            WHERE user_id = $1 AND course_id = $2 AND status <> 'cancelled'
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(progress)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }
}
