//! Course catalog and enrollment

use coursely_core::constants::clamp_pagination;
use coursely_core::models::{
    Course, CourseDetail, CourseModule, CreateCourseRequest, CreateLessonRequest,
    CreateModuleRequest, Enrollment, EnrollmentStatus, Lesson, ListCoursesQuery,
    UpdateCourseRequest, UpdateProgressRequest, UserRole,
};
use coursely_core::AppError;
use coursely_db::{
    CourseRepository, CourseRepositoryTrait, EnrollmentRepositoryTrait, PaymentRepositoryTrait,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::actor::Actor;

#[derive(Clone)]
pub struct CourseService {
    courses: CourseRepository,
}

impl CourseService {
    pub fn new(courses: CourseRepository) -> Self {
        Self { courses }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        mut request: CreateCourseRequest,
    ) -> Result<Course, AppError> {
        actor.require(UserRole::Instructor)?;
        request.validate()?;
        request.currency = request.currency.to_uppercase();
        let course = self
            .courses
            .create(actor.tenant_id, actor.user_id, &request)
            .await?;
        tracing::info!(course_id = %course.id, instructor_id = %actor.user_id, "Course created");
        Ok(course)
    }

    /// The course, if the caller is its instructor or an admin.
    async fn owned(&self, actor: &Actor, id: Uuid) -> Result<Course, AppError> {
        let course = self
            .courses
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;
        actor.ensure_owner(course.instructor_id)?;
        Ok(course)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        mut request: UpdateCourseRequest,
    ) -> Result<Course, AppError> {
        request.validate()?;
        self.owned(actor, id).await?;
        request.currency = request.currency.map(|c| c.to_uppercase());
        self.courses
            .update(id, &request)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
    }

    pub async fn set_published(
        &self,
        actor: &Actor,
        id: Uuid,
        published: bool,
    ) -> Result<Course, AppError> {
        self.owned(actor, id).await?;
        let course = self
            .courses
            .set_published(id, published)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;
        tracing::info!(course_id = %id, published, "Course publication changed");
        Ok(course)
    }

    /// Fails with `Conflict` while enrollments or payments still reference the course.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), AppError> {
        self.owned(actor, id).await?;
        if !self.courses.delete(id).await? {
            return Err(AppError::NotFound("Course not found".to_string()));
        }
        tracing::info!(course_id = %id, deleted_by = %actor.user_id, "Course deleted");
        Ok(())
    }

    pub async fn list_published(&self, query: &ListCoursesQuery) -> Result<Vec<Course>, AppError> {
        let (limit, offset) = clamp_pagination(query.limit, query.offset);
        self.courses
            .list_published(query.tenant_id, limit, offset)
            .await
    }

    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<Course>, AppError> {
        actor.require(UserRole::Instructor)?;
        self.courses.list_by_instructor(actor.user_id).await
    }

    /// Published courses are public; drafts are visible to their instructor and admins.
    pub async fn get(&self, actor: Option<&Actor>, id: Uuid) -> Result<CourseDetail, AppError> {
        let course = self
            .courses
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;
        if !course.is_published {
            let visible = actor.is_some_and(|a| a.ensure_owner(course.instructor_id).is_ok());
            if !visible {
                return Err(AppError::NotFound("Course not found".to_string()));
            }
        }
        let modules = self.courses.modules_with_lessons(id).await?;
        Ok(CourseDetail { course, modules })
    }

    pub async fn add_module(
        &self,
        actor: &Actor,
        course_id: Uuid,
        request: CreateModuleRequest,
    ) -> Result<CourseModule, AppError> {
        request.validate()?;
        self.owned(actor, course_id).await?;
        self.courses.add_module(course_id, &request).await
    }

    pub async fn add_lesson(
        &self,
        actor: &Actor,
        module_id: Uuid,
        request: CreateLessonRequest,
    ) -> Result<Lesson, AppError> {
        request.validate()?;
        let module = self
            .courses
            .get_module(module_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Module not found".to_string()))?;
        self.owned(actor, module.course_id).await?;
        self.courses.add_lesson(module_id, &request).await
    }
}

#[derive(Clone)]
pub struct EnrollmentService {
    courses: Arc<dyn CourseRepositoryTrait>,
    enrollments: Arc<dyn EnrollmentRepositoryTrait>,
    payments: Arc<dyn PaymentRepositoryTrait>,
}

impl EnrollmentService {
    pub fn new(
        courses: Arc<dyn CourseRepositoryTrait>,
        enrollments: Arc<dyn EnrollmentRepositoryTrait>,
        payments: Arc<dyn PaymentRepositoryTrait>,
    ) -> Self {
        Self {
            courses,
            enrollments,
            payments,
        }
    }

    /// Enrolls the caller. Free courses enroll directly; paid courses need a completed
    /// payment for that course. Enrolling twice returns the existing enrollment.
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn enroll(&self, actor: &Actor, course_id: Uuid) -> Result<Enrollment, AppError> {
        let course = self
            .courses
            .get(course_id)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        if let Some(existing) = self.enrollments.find(actor.user_id, course_id).await? {
            if existing.status != EnrollmentStatus::Cancelled {
                return Ok(existing);
            }
        }

        if !course.is_free()
            && !self
                .payments
                .has_completed_course_payment(actor.user_id, course_id)
                .await?
        {
            return Err(AppError::PreconditionFailed(
                "A completed payment is required to enroll in this course".to_string(),
            ));
        }

        let enrollment = self
            .enrollments
            .enroll(actor.user_id, course_id, Some(course.tenant_id))
            .await?;
        tracing::info!(enrollment_id = %enrollment.id, course_id = %course_id, "User enrolled");
        Ok(enrollment)
    }

    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<Enrollment>, AppError> {
        self.enrollments.list_for_user(actor.user_id).await
    }

    /// Reaching 100 completes the enrollment.
    pub async fn update_progress(
        &self,
        actor: &Actor,
        course_id: Uuid,
        request: UpdateProgressRequest,
    ) -> Result<Enrollment, AppError> {
        request.validate()?;
        let enrollment = self
            .enrollments
            .update_progress(actor.user_id, course_id, request.progress)
            .await?
            .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;
        if enrollment.status == EnrollmentStatus::Completed && request.progress >= 100 {
            tracing::info!(enrollment_id = %enrollment.id, course_id = %course_id, "Course completed");
        }
        Ok(enrollment)
    }
}
