use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use coursely_core::models::{Enrollment, UpdateProgressRequest};
use std::sync::Arc;
use uuid::Uuid;

/// Enrolls the caller. Paid courses need a completed payment first; enrolling twice returns
/// the existing enrollment.
#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    tag = "enrollments",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 412, description = "Course requires a completed payment")
    )
)]
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let enrollment = state.enrollments.enroll(&user.actor(), id).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    get,
    path = "/api/enrollments",
    tag = "enrollments",
    responses(
        (status = 200, description = "Caller's enrollments", body = Vec<Enrollment>)
    )
)]
pub async fn list_enrollments(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let enrollments = state.enrollments.list_mine(&user.actor()).await?;
    Ok(Json(enrollments))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}/progress",
    tag = "enrollments",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "Progress updated", body = Enrollment),
        (status = 404, description = "Not enrolled")
    )
)]
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateProgressRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let enrollment = state
        .enrollments
        .update_progress(&user.actor(), id, request)
        .await?;
    Ok(Json(enrollment))
}
