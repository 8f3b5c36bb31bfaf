use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::ip_extraction::client_ip;
use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use coursely_core::models::{
    Certificate, CertificateTemplate, CreateTemplateRequest, DigitalSignature,
    IssueCertificateRequest, RevokeCertificateRequest, UploadSignatureRequest,
    VerificationResult,
};
use std::sync::Arc;
use uuid::Uuid;

/// Issues a completion certificate. The enrollment must be completed and no issued
/// certificate may exist for the same user and course.
#[utoipa::path(
    post,
    path = "/api/certificates",
    tag = "certificates",
    request_body = IssueCertificateRequest,
    responses(
        (status = 201, description = "Certificate issued", body = Certificate),
        (status = 409, description = "Certificate already issued"),
        (status = 412, description = "Enrollment not completed")
    )
)]
pub async fn issue_certificate(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<IssueCertificateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let certificate = state.certificates.issue(&user.actor(), request).await?;
    Ok((StatusCode::CREATED, Json(certificate)))
}

/// Public. Every attempt is logged with the caller's IP and user agent.
#[utoipa::path(
    get,
    path = "/api/certificates/verify/{code}",
    tag = "certificates",
    params(("code" = String, Path, description = "12-character verification code")),
    responses(
        (status = 200, description = "Verification outcome; revoked or unknown codes are not valid", body = VerificationResult)
    )
)]
pub async fn verify_certificate(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    request: Request,
) -> Result<impl IntoResponse, HttpAppError> {
    let ip = client_ip(&request, state.config.trusted_proxy_count());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());

    let result = state
        .certificates
        .verify(&code, Some(ip.as_str()), user_agent)
        .await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/certificates",
    tag = "certificates",
    responses(
        (status = 200, description = "Caller's certificates", body = Vec<Certificate>)
    )
)]
pub async fn list_certificates(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let certificates = state.certificates.list_mine(&user.actor()).await?;
    Ok(Json(certificates))
}

#[utoipa::path(
    get,
    path = "/api/certificates/{id}",
    tag = "certificates",
    params(("id" = Uuid, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Certificate", body = Certificate),
        (status = 404, description = "Certificate not found")
    )
)]
pub async fn get_certificate(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let certificate = state.certificates.get(&user.actor(), id).await?;
    Ok(Json(certificate))
}

#[utoipa::path(
    get,
    path = "/api/certificates/{id}/download",
    tag = "certificates",
    params(("id" = Uuid, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Certificate PDF", content_type = "application/pdf"),
        (status = 404, description = "Certificate not found")
    )
)]
pub async fn download_certificate(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, HttpAppError> {
    let (certificate, pdf) = state.certificates.download(&user.actor(), id).await?;

    let mut response = pdf.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    if let Ok(disposition) = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}.pdf\"",
        certificate.certificate_number
    )) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/certificates/{id}/revoke",
    tag = "certificates",
    params(("id" = Uuid, Path, description = "Certificate ID")),
    request_body = RevokeCertificateRequest,
    responses(
        (status = 200, description = "Certificate revoked", body = Certificate),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn revoke_certificate(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<RevokeCertificateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let certificate = state.certificates.revoke(&user.actor(), id, request).await?;
    Ok(Json(certificate))
}

#[utoipa::path(
    post,
    path = "/api/certificates/templates",
    tag = "certificates",
    request_body = CreateTemplateRequest,
    responses(
        (status = 201, description = "Template created", body = CertificateTemplate),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn create_template(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateTemplateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let template = state.certificates.create_template(&user.actor(), request).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

#[utoipa::path(
    get,
    path = "/api/certificates/templates",
    tag = "certificates",
    responses(
        (status = 200, description = "Templates of the caller's tenant", body = Vec<CertificateTemplate>)
    )
)]
pub async fn list_templates(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let templates = state.certificates.list_templates(&user.actor()).await?;
    Ok(Json(templates))
}

#[utoipa::path(
    post,
    path = "/api/certificates/signatures",
    tag = "certificates",
    request_body = UploadSignatureRequest,
    responses(
        (status = 201, description = "Signature stored", body = DigitalSignature),
        (status = 400, description = "Not a PNG or JPEG image, or larger than 1 MiB")
    )
)]
pub async fn upload_signature(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<UploadSignatureRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let signature = state.certificates.upload_signature(&user.actor(), request).await?;
    Ok((StatusCode::CREATED, Json(signature)))
}
