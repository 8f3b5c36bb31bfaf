use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::Pagination;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use coursely_core::models::{
    CreateTenantRequest, LandingPage, Tenant, UpdateProfileRequest, User, WhiteLabelSettings,
};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "tenants",
    request_body = CreateTenantRequest,
    responses(
        (status = 201, description = "Tenant created", body = Tenant),
        (status = 409, description = "Slug already taken")
    )
)]
pub async fn create_tenant(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateTenantRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let tenant = state.tenants.create(&user.actor(), request).await?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "tenants",
    params(Pagination),
    responses(
        (status = 200, description = "All tenants", body = Vec<Tenant>)
    )
)]
pub async fn list_tenants(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, HttpAppError> {
    let tenants = state
        .tenants
        .list(&user.actor(), page.limit, page.offset)
        .await?;
    Ok(Json(tenants))
}

#[utoipa::path(
    get,
    path = "/api/tenants/by-slug/{slug}",
    tag = "tenants",
    params(("slug" = String, Path, description = "Tenant slug")),
    responses(
        (status = 200, description = "Tenant", body = Tenant),
        (status = 404, description = "Tenant not found")
    )
)]
pub async fn get_tenant_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.tenants.get_by_slug(&slug).await?))
}

#[utoipa::path(
    get,
    path = "/api/tenants/{id}",
    tag = "tenants",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant", body = Tenant),
        (status = 403, description = "Another tenant")
    )
)]
pub async fn get_tenant(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.tenants.get(&user.actor(), id).await?))
}

/// Public branding for rendering a tenant's storefront.
#[utoipa::path(
    get,
    path = "/api/tenants/{id}/settings",
    tag = "tenants",
    params(("id" = Uuid, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "White-label settings, defaults when never saved", body = WhiteLabelSettings)
    )
)]
pub async fn get_tenant_settings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.white_label.get_settings(id).await?))
}

/// Published pages are public; drafts are visible to admins of the tenant.
#[utoipa::path(
    get,
    path = "/api/tenants/{id}/pages/{slug}",
    tag = "tenants",
    params(
        ("id" = Uuid, Path, description = "Tenant ID"),
        ("slug" = String, Path, description = "Landing page slug")
    ),
    responses(
        (status = 200, description = "Landing page", body = LandingPage),
        (status = 404, description = "No such published page")
    )
)]
pub async fn get_landing_page(
    State(state): State<Arc<AppState>>,
    user: Option<CurrentUser>,
    Path((id, slug)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let actor = user.map(|u| u.actor());
    let page = state
        .white_label
        .get_landing_page(actor.as_ref(), id, &slug)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "tenants",
    responses(
        (status = 200, description = "Caller's local user row", body = User)
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.tenants.me(&user.actor()).await?))
}

/// Sets the name printed on certificates.
#[utoipa::path(
    put,
    path = "/api/users/me",
    tag = "tenants",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = User)
    )
)]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.tenants.update_profile(&user.actor(), request).await?))
}
