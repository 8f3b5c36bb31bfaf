use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::PublishRequest;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use coursely_core::models::{
    Course, CourseDetail, CourseModule, CreateCourseRequest, CreateLessonRequest,
    CreateModuleRequest, Lesson, ListCoursesQuery, UpdateCourseRequest,
};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/courses",
    tag = "courses",
    params(ListCoursesQuery),
    responses(
        (status = 200, description = "Published courses", body = Vec<Course>)
    )
)]
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListCoursesQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let courses = state.courses.list_published(&query).await?;
    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/mine",
    tag = "courses",
    responses(
        (status = 200, description = "Courses the caller teaches", body = Vec<Course>),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_my_courses(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let courses = state.courses.list_mine(&user.actor()).await?;
    Ok(Json(courses))
}

/// Drafts are visible only to their instructor and admins.
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course with modules and lessons", body = CourseDetail),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    user: Option<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let actor = user.map(|u| u.actor());
    let course = state.courses.get(actor.as_ref(), id).await?;
    Ok(Json(course))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    tag = "courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Instructor role required")
    )
)]
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let course = state.courses.create(&user.actor(), request).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Not the course owner"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn update_course(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateCourseRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let course = state.courses.update(&user.actor(), id, request).await?;
    Ok(Json(course))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}/publish",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = PublishRequest,
    responses(
        (status = 200, description = "Publication state changed", body = Course),
        (status = 403, description = "Not the course owner")
    )
)]
pub async fn publish_course(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<PublishRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let course = state
        .courses
        .set_published(&user.actor(), id, request.published)
        .await?;
    Ok(Json(course))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Not the course owner"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.courses.delete(&user.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/modules",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CreateModuleRequest,
    responses(
        (status = 201, description = "Module added", body = CourseModule)
    )
)]
pub async fn add_module(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateModuleRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let module = state.courses.add_module(&user.actor(), id, request).await?;
    Ok((StatusCode::CREATED, Json(module)))
}

#[utoipa::path(
    post,
    path = "/api/modules/{id}/lessons",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Module ID")),
    request_body = CreateLessonRequest,
    responses(
        (status = 201, description = "Lesson added", body = Lesson)
    )
)]
pub async fn add_lesson(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateLessonRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let lesson = state.courses.add_lesson(&user.actor(), id, request).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}
