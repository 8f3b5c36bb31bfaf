use coursely_core::models::{
    Course, CourseModule, CreateCourseRequest, CreateLessonRequest, CreateModuleRequest, Lesson,
    ModuleWithLessons, UpdateCourseRequest,
};
use coursely_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Lookups other services need from the catalog
#[async_trait::async_trait]
pub trait CourseRepositoryTrait: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Course>, AppError>;
}

#[derive(Clone)]
pub struct CourseRepository {
    pool: PgPool,
}

impl CourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "courses", db.operation = "insert"))]
    pub async fn create(
        &self,
        tenant_id: Uuid,
        instructor_id: Uuid,
        request: &CreateCourseRequest,
    ) -> Result<Course, AppError> {
        let course = sqlx::query_as::<Postgres, Course>(
            r#"
            INSERT INTO courses (
                tenant_id, instructor_id, title, slug, description, thumbnail_url, price, currency
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(instructor_id)
        .bind(&request.title)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.thumbnail_url)
        .bind(request.price)
        .bind(&request.currency)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(course_id = %course.id, slug = %course.slug, "Created course");
        Ok(course)
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "courses", db.operation = "update"))]
    pub async fn update(
        &self,
        id: Uuid,
        request: &UpdateCourseRequest,
    ) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<Postgres, Course>(
            r#"
            UPDATE courses
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                thumbnail_url = COALESCE($4, thumbnail_url),
                price = COALESCE($5, price),
                currency = COALESCE($6, currency),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.thumbnail_url)
        .bind(request.price)
        .bind(&request.currency)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    #[tracing::instrument(skip(self), fields(db.table = "courses", db.operation = "update"))]
    pub async fn set_published(&self, id: Uuid, published: bool) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<Postgres, Course>(
            r#"
            UPDATE courses
            SET is_published = $2,
                published_at = CASE WHEN $2 THEN COALESCE(published_at, NOW()) ELSE NULL END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(published)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    #[tracing::instrument(skip(self), fields(db.table = "courses", db.operation = "delete"))]
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::Conflict(
                    "Course has payments or certificates and cannot be deleted; unpublish it instead"
                        .to_string(),
                ),
                _ => AppError::from(e),
            })?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "courses", db.operation = "select"))]
    pub async fn list_published(
        &self,
        tenant_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Course>, AppError> {
        let mut query = String::from("SELECT * FROM courses WHERE is_published");
        if tenant_id.is_some() {
            query.push_str(" AND tenant_id = $3");
        }
        query.push_str(" ORDER BY published_at DESC NULLS LAST LIMIT $1 OFFSET $2");

        let mut query_builder = sqlx::query_as::<Postgres, Course>(&query)
            .bind(limit)
            .bind(offset);
        if let Some(tenant_id) = tenant_id {
            query_builder = query_builder.bind(tenant_id);
        }

        let courses = query_builder.fetch_all(&self.pool).await?;
        Ok(courses)
    }

    #[tracing::instrument(skip(self), fields(db.table = "courses", db.operation = "select"))]
    pub async fn list_by_instructor(&self, instructor_id: Uuid) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<Postgres, Course>(
            "SELECT * FROM courses WHERE instructor_id = $1 ORDER BY created_at DESC",
        )
        .bind(instructor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "course_modules", db.operation = "insert"))]
    pub async fn add_module(
        &self,
        course_id: Uuid,
        request: &CreateModuleRequest,
    ) -> Result<CourseModule, AppError> {
        let module = sqlx::query_as::<Postgres, CourseModule>(
            r#"
            INSERT INTO course_modules (course_id, title, position)
            VALUES (
                $1, $2,
                COALESCE($3, (SELECT COALESCE(MAX(position) + 1, 0) FROM course_modules WHERE course_id = $1))
            )
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(&request.title)
        .bind(request.position)
        .fetch_one(&self.pool)
        .await?;
        Ok(module)
    }

    #[tracing::instrument(skip(self), fields(db.table = "course_modules", db.operation = "select"))]
    pub async fn get_module(&self, module_id: Uuid) -> Result<Option<CourseModule>, AppError> {
        let module = sqlx::query_as::<Postgres, CourseModule>(
            "SELECT * FROM course_modules WHERE id = $1",
        )
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(module)
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "lessons", db.operation = "insert"))]
    pub async fn add_lesson(
        &self,
        module_id: Uuid,
        request: &CreateLessonRequest,
    ) -> Result<Lesson, AppError> {
        let lesson = sqlx::query_as::<Postgres, Lesson>(
            r#"
            INSERT INTO lessons (module_id, title, content, video_url, duration_minutes, position, is_preview)
            VALUES (
                $1, $2, $3, $4, $5,
                COALESCE($6, (SELECT COALESCE(MAX(position) + 1, 0) FROM lessons WHERE module_id = $1)),
                $7
            )
            RETURNING *
            "#,
        )
        .bind(module_id)
        .bind(&request.title)
        .bind(&request.content)
        .bind(&request.video_url)
        .bind(request.duration_minutes)
        .bind(request.position)
        .bind(request.is_preview)
        .fetch_one(&self.pool)
        .await?;
        Ok(lesson)
    }

    /// Modules of a course in order, each with its ordered lessons.
    #[tracing::instrument(skip(self), fields(db.table = "course_modules", db.operation = "select"))]
    pub async fn modules_with_lessons(
        &self,
        course_id: Uuid,
    ) -> Result<Vec<ModuleWithLessons>, AppError> {
        let modules = sqlx::query_as::<Postgres, CourseModule>(
            "SELECT * FROM course_modules WHERE course_id = $1 ORDER BY position, created_at",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        let lessons = sqlx::query_as::<Postgres, Lesson>(
            r#"
            SELECT l.* FROM lessons l
            JOIN course_modules m ON m.id = l.module_id
            WHERE m.course_id = $1
            ORDER BY l.position, l.created_at
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(modules
            .into_iter()
            .map(|module| {
                let lessons = lessons
                    .iter()
                    .filter(|l| l.module_id == module.id)
                    .cloned()
                    .collect();
                ModuleWithLessons { module, lessons }
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl CourseRepositoryTrait for CourseRepository {
    #[tracing::instrument(skip(self), fields(db.table = "courses", db.operation = "select"))]
    async fn get(&self, id: Uuid) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<Postgres, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }
}
