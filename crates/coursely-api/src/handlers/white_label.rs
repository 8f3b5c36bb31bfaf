//! Tenant branding administration. Every route here is admin-only and acts on the
//! caller's own tenant; the public read paths live under `/api/tenants/{id}`.

use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::PublishRequest;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use coursely_core::models::{
    AddDomainRequest, CreateLandingPageRequest, CustomDomain, EmailTemplate, EmailTemplateKind,
    LandingPage, RenderEmailRequest, RenderedEmail, SettingsUpdate, UpdateLandingPageRequest,
    UpsertEmailTemplateRequest, WhiteLabelSettings,
};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/white-label/settings",
    tag = "white-label",
    responses(
        (status = 200, description = "Settings of the caller's tenant", body = WhiteLabelSettings)
    )
)]
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.white_label.get_settings(user.tenant_id).await?))
}

/// Replaces one section (`branding`, `theme`, `features` or `seo`). Unknown keys are
/// rejected.
#[utoipa::path(
    put,
    path = "/api/white-label/settings",
    tag = "white-label",
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Updated settings", body = WhiteLabelSettings),
        (status = 400, description = "Unknown section, unknown key or invalid value")
    )
)]
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(update): ValidatedJson<SettingsUpdate>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.white_label.update_settings(&user.actor(), update).await?))
}

#[utoipa::path(
    post,
    path = "/api/white-label/domains",
    tag = "white-label",
    request_body = AddDomainRequest,
    responses(
        (status = 201, description = "Domain added with a verification token", body = CustomDomain),
        (status = 409, description = "Domain already claimed")
    )
)]
pub async fn add_domain(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<AddDomainRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let domain = state.white_label.add_domain(&user.actor(), request).await?;
    Ok((StatusCode::CREATED, Json(domain)))
}

#[utoipa::path(
    get,
    path = "/api/white-label/domains",
    tag = "white-label",
    responses(
        (status = 200, description = "Custom domains", body = Vec<CustomDomain>)
    )
)]
pub async fn list_domains(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.white_label.list_domains(&user.actor()).await?))
}

/// Fetches `https://{domain}/.well-known/coursely-verification.txt` and compares it with
/// the stored token.
#[utoipa::path(
    post,
    path = "/api/white-label/domains/{id}/verify",
    tag = "white-label",
    params(("id" = Uuid, Path, description = "Domain ID")),
    responses(
        (status = 200, description = "Domain verified", body = CustomDomain),
        (status = 412, description = "Token not served by the domain yet")
    )
)]
pub async fn verify_domain(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.white_label.verify_domain(&user.actor(), id).await?))
}

#[utoipa::path(
    get,
    path = "/api/white-label/email-templates",
    tag = "white-label",
    responses(
        (status = 200, description = "Email templates", body = Vec<EmailTemplate>)
    )
)]
pub async fn list_email_templates(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.white_label.list_email_templates(&user.actor()).await?))
}

#[utoipa::path(
    put,
    path = "/api/white-label/email-templates/{kind}",
    tag = "white-label",
    params(("kind" = EmailTemplateKind, Path, description = "Template kind")),
    request_body = UpsertEmailTemplateRequest,
    responses(
        (status = 200, description = "Template saved", body = EmailTemplate)
    )
)]
pub async fn upsert_email_template(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(kind): Path<EmailTemplateKind>,
    ValidatedJson(request): ValidatedJson<UpsertEmailTemplateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let template = state
        .white_label
        .upsert_email_template(&user.actor(), kind, request)
        .await?;
    Ok(Json(template))
}

/// Substitutes `{{name}}` placeholders. Values are HTML-escaped in the HTML body and
/// unknown placeholders are left as they are.
#[utoipa::path(
    post,
    path = "/api/white-label/email-templates/{kind}/render",
    tag = "white-label",
    params(("kind" = EmailTemplateKind, Path, description = "Template kind")),
    request_body = RenderEmailRequest,
    responses(
        (status = 200, description = "Rendered email", body = RenderedEmail),
        (status = 404, description = "Template not configured")
    )
)]
pub async fn render_email_template(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(kind): Path<EmailTemplateKind>,
    ValidatedJson(request): ValidatedJson<RenderEmailRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let rendered = state
        .white_label
        .render_email_template(&user.actor(), kind, request)
        .await?;
    Ok(Json(rendered))
}

#[utoipa::path(
    post,
    path = "/api/white-label/landing-pages",
    tag = "white-label",
    request_body = CreateLandingPageRequest,
    responses(
        (status = 201, description = "Landing page created as a draft", body = LandingPage),
        (status = 409, description = "Slug already used")
    )
)]
pub async fn create_landing_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateLandingPageRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let page = state
        .white_label
        .create_landing_page(&user.actor(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(page)))
}

#[utoipa::path(
    get,
    path = "/api/white-label/landing-pages",
    tag = "white-label",
    responses(
        (status = 200, description = "Landing pages including drafts", body = Vec<LandingPage>)
    )
)]
pub async fn list_landing_pages(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    Ok(Json(state.white_label.list_landing_pages(&user.actor()).await?))
}

#[utoipa::path(
    put,
    path = "/api/white-label/landing-pages/{id}",
    tag = "white-label",
    params(("id" = Uuid, Path, description = "Landing page ID")),
    request_body = UpdateLandingPageRequest,
    responses(
        (status = 200, description = "Landing page updated", body = LandingPage)
    )
)]
pub async fn update_landing_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateLandingPageRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let page = state
        .white_label
        .update_landing_page(&user.actor(), id, request)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    put,
    path = "/api/white-label/landing-pages/{id}/publish",
    tag = "white-label",
    params(("id" = Uuid, Path, description = "Landing page ID")),
    request_body = PublishRequest,
    responses(
        (status = 200, description = "Publication state changed", body = LandingPage)
    )
)]
pub async fn publish_landing_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<PublishRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let page = state
        .white_label
        .set_landing_page_published(&user.actor(), id, request.published)
        .await?;
    Ok(Json(page))
}
