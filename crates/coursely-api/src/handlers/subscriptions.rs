use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use coursely_core::models::{
    CreatePlanRequest, CreateSubscriptionRequest, Subscription, SubscriptionPlan,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct PlanQuery {
    pub tenant_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/plans",
    tag = "subscriptions",
    params(PlanQuery),
    responses(
        (status = 200, description = "Active plans", body = Vec<SubscriptionPlan>)
    )
)]
pub async fn list_plans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlanQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let plans = state.subscriptions.list_plans(query.tenant_id).await?;
    Ok(Json(plans))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/plans",
    tag = "subscriptions",
    request_body = CreatePlanRequest,
    responses(
        (status = 201, description = "Plan created", body = SubscriptionPlan),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreatePlanRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let plan = state.subscriptions.create_plan(&user.actor(), request).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Starts a subscription for the caller. Payment goes through `POST /api/payments/orders`
/// with the returned subscription id.
#[utoipa::path(
    post,
    path = "/api/subscriptions",
    tag = "subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = Subscription),
        (status = 404, description = "Plan not found")
    )
)]
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let subscription = state.subscriptions.subscribe(&user.actor(), request).await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Caller's subscriptions", body = Vec<Subscription>)
    )
)]
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let subscriptions = state.subscriptions.list_mine(&user.actor()).await?;
    Ok(Json(subscriptions))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/{id}/cancel",
    tag = "subscriptions",
    params(("id" = Uuid, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Subscription cancelled", body = Subscription),
        (status = 403, description = "Not the subscriber")
    )
)]
pub async fn cancel_subscription(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let subscription = state.subscriptions.cancel(&user.actor(), id).await?;
    Ok(Json(subscription))
}
