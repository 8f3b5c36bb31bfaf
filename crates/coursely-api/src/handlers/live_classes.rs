use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use coursely_core::models::{LiveClass, ScheduleLiveClassRequest};
use std::sync::Arc;
use uuid::Uuid;

/// Creates the remote meeting first; if the row cannot be written the meeting is deleted.
#[utoipa::path(
    post,
    path = "/api/live-classes",
    tag = "live-classes",
    request_body = ScheduleLiveClassRequest,
    responses(
        (status = 201, description = "Live class scheduled", body = LiveClass),
        (status = 403, description = "Not the course instructor"),
        (status = 502, description = "Meeting provider error")
    )
)]
pub async fn schedule_live_class(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<ScheduleLiveClassRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let live_class = state.live_classes.schedule(&user.actor(), request).await?;
    Ok((StatusCode::CREATED, Json(live_class)))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/live-classes",
    tag = "live-classes",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Live classes of the course", body = Vec<LiveClass>)
    )
)]
pub async fn list_course_live_classes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let classes = state.live_classes.list_by_course(id).await?;
    Ok(Json(classes))
}

#[utoipa::path(
    get,
    path = "/api/live-classes/{id}",
    tag = "live-classes",
    params(("id" = Uuid, Path, description = "Live class ID")),
    responses(
        (status = 200, description = "Live class", body = LiveClass),
        (status = 404, description = "Live class not found")
    )
)]
pub async fn get_live_class(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.live_classes.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/live-classes/{id}/start",
    tag = "live-classes",
    params(("id" = Uuid, Path, description = "Live class ID")),
    responses(
        (status = 200, description = "Class is live", body = LiveClass),
        (status = 409, description = "Class is not scheduled")
    )
)]
pub async fn start_live_class(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.live_classes.start(&user.actor(), id).await?))
}

#[utoipa::path(
    post,
    path = "/api/live-classes/{id}/complete",
    tag = "live-classes",
    params(("id" = Uuid, Path, description = "Live class ID")),
    responses(
        (status = 200, description = "Class completed", body = LiveClass),
        (status = 409, description = "Class is not live")
    )
)]
pub async fn complete_live_class(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.live_classes.complete(&user.actor(), id).await?))
}

#[utoipa::path(
    post,
    path = "/api/live-classes/{id}/cancel",
    tag = "live-classes",
    params(("id" = Uuid, Path, description = "Live class ID")),
    responses(
        (status = 200, description = "Class cancelled", body = LiveClass),
        (status = 409, description = "Class already finished")
    )
)]
pub async fn cancel_live_class(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.live_classes.cancel(&user.actor(), id).await?))
}
