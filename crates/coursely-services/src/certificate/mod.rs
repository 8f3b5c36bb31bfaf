//! Certificate issuance, verification and administration

mod codes;
mod renderer;

pub use codes::{certificate_number, normalize_code, verification_code};
pub use renderer::{CertificateContent, CertificateRenderer, SignatureImage};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use coursely_core::constants::VERIFICATION_CODE_LEN;
use coursely_core::models::{
    Certificate, CertificateStatus, CertificateTemplate, CreateTemplateRequest,
    DigitalSignature, EnrollmentStatus, IssueCertificateRequest, NewCertificate,
    RevokeCertificateRequest, UploadSignatureRequest, UserRole, VerificationResult,
};
use coursely_core::AppError;
use coursely_db::{CertificateRepositoryTrait, EnrollmentRepositoryTrait};
use coursely_storage::{certificate_key, signature_key, Storage};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::actor::Actor;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const MAX_SIGNATURE_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct CertificateService {
    certificates: Arc<dyn CertificateRepositoryTrait>,
    enrollments: Arc<dyn EnrollmentRepositoryTrait>,
    storage: Arc<dyn Storage>,
    renderer: CertificateRenderer,
}

impl CertificateService {
    pub fn new(
        certificates: Arc<dyn CertificateRepositoryTrait>,
        enrollments: Arc<dyn EnrollmentRepositoryTrait>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            certificates,
            enrollments,
            storage,
            renderer: CertificateRenderer::new(),
        }
    }

    /// Issues a completion certificate.
    ///
    /// The PDF is stored before the row is written; if the insert fails the blob is
    /// removed again. The insert and the enrollment's `certificate_issued` flag share a
    /// transaction.
    #[tracing::instrument(skip(self, actor, request), fields(course_id = %request.course_id))]
    pub async fn issue(
        &self,
        actor: &Actor,
        request: IssueCertificateRequest,
    ) -> Result<Certificate, AppError> {
        let user_id = match request.user_id {
            Some(user_id) if user_id != actor.user_id => {
                actor.require(UserRole::Admin)?;
                user_id
            }
            _ => actor.user_id,
        };
        let course_id = request.course_id;

        let completed = self
            .enrollments
            .find(user_id, course_id)
            .await?
            .is_some_and(|e| e.status == EnrollmentStatus::Completed);
        if !completed {
            return Err(AppError::PreconditionFailed(
                "Course enrollment is not completed".to_string(),
            ));
        }
        if self.certificates.find_issued(user_id, course_id).await?.is_some() {
            return Err(AppError::Conflict(
                "A certificate has already been issued for this course".to_string(),
            ));
        }

        let context = self
            .certificates
            .issuance_context(user_id, course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Course or user not found".to_string()))?;
        let template = self
            .select_template(request.template_id, context.tenant_id)
            .await?;
        let template_id = (!template.id.is_nil()).then_some(template.id);
        let signature = match request.signature_id {
            Some(id) => Some(self.load_signature(id, context.tenant_id).await?),
            None => None,
        };

        let issued_at = Utc::now();
        let number = certificate_number(issued_at);
        let code = verification_code();
        let content = CertificateContent {
            recipient_name: context.recipient_name.clone(),
            course_title: context.course_title.clone(),
            instructor_name: context.instructor_name.clone(),
            issue_date: issued_at.format("%B %-d, %Y").to_string(),
            certificate_number: number.clone(),
            verification_code: code.clone(),
        };

        let renderer = self.renderer;
        let signature_image = signature.as_ref().map(|(_, image)| image.clone());
        let pdf = tokio::task::spawn_blocking(move || {
            renderer.render(&template, &content, signature_image.as_ref())
        })
        .await
        .map_err(|e| AppError::Internal(format!("Certificate rendering task failed: {}", e)))??;

        let storage_key = certificate_key(Some(context.tenant_id), &number);
        let file_url = self.storage.put(&storage_key, PDF_CONTENT_TYPE, pdf).await?;

        let created = self
            .certificates
            .create_and_flag_enrollment(NewCertificate {
                user_id,
                course_id,
                tenant_id: Some(context.tenant_id),
                template_id,
                signature_id: signature.as_ref().map(|(s, _)| s.id),
                certificate_number: number,
                verification_code: code,
                recipient_name: context.recipient_name,
                course_title: context.course_title,
                storage_key: storage_key.clone(),
                file_url,
            })
            .await;

        let certificate = match created {
            Ok(certificate) => certificate,
            Err(e) => {
                if let Err(delete_err) = self.storage.delete(&storage_key).await {
                    tracing::error!(error = %delete_err, storage_key = %storage_key, "Failed to remove orphaned certificate PDF");
                }
                return Err(e);
            }
        };

        tracing::info!(
            target: "audit",
            event = "certificate.issued",
            certificate_id = %certificate.id,
            certificate_number = %certificate.certificate_number,
            user_id = %user_id,
            issued_by = %actor.user_id,
            "Certificate issued"
        );
        Ok(certificate)
    }

    /// Explicit template, else the tenant default, else the built-in layout.
    async fn select_template(
        &self,
        template_id: Option<Uuid>,
        tenant_id: Uuid,
    ) -> Result<CertificateTemplate, AppError> {
        if let Some(id) = template_id {
            return self
                .certificates
                .get_template(id)
                .await?
                .filter(|t| t.tenant_id.is_none() || t.tenant_id == Some(tenant_id))
                .ok_or_else(|| AppError::NotFound("Certificate template not found".to_string()));
        }
        Ok(self
            .certificates
            .default_template(tenant_id)
            .await?
            .unwrap_or_else(CertificateTemplate::built_in))
    }

    async fn load_signature(
        &self,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<(DigitalSignature, SignatureImage), AppError> {
        let signature = self
            .certificates
            .get_signature(id)
            .await?
            .filter(|s| s.tenant_id.is_none() || s.tenant_id == Some(tenant_id))
            .ok_or_else(|| AppError::NotFound("Signature not found".to_string()))?;
        let bytes = self.storage.get(&signature.storage_key).await?;
        let image = SignatureImage::decode(&bytes)?;
        Ok((signature, image))
    }

    /// Public lookup by verification code. Every attempt is logged, valid or not.
    pub async fn verify(
        &self,
        code: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<VerificationResult, AppError> {
        let code: String = normalize_code(code).chars().take(64).collect();
        let certificate = if code.len() == VERIFICATION_CODE_LEN {
            self.certificates.find_by_verification_code(&code).await?
        } else {
            None
        };
        let result = certificate
            .as_ref()
            .map(VerificationResult::for_certificate)
            .unwrap_or_else(VerificationResult::invalid);

        self.certificates
            .log_verification(
                certificate.as_ref().map(|c| c.id),
                &code,
                result.valid,
                ip_address,
                user_agent,
            )
            .await?;

        tracing::info!(
            target: "audit",
            event = "certificate.verification",
            code = %code,
            valid = result.valid,
            ip = ?ip_address,
            "Certificate verification attempt"
        );
        Ok(result)
    }

    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<Certificate>, AppError> {
        self.certificates.list_for_user(actor.user_id).await
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Certificate, AppError> {
        let certificate = self
            .certificates
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Certificate not found".to_string()))?;
        actor.ensure_owner(certificate.user_id)?;
        Ok(certificate)
    }

    /// The certificate and its PDF bytes.
    pub async fn download(&self, actor: &Actor, id: Uuid) -> Result<(Certificate, Vec<u8>), AppError> {
        let certificate = self.get(actor, id).await?;
        let pdf = self.storage.get(&certificate.storage_key).await?;
        Ok((certificate, pdf))
    }

    pub async fn revoke(
        &self,
        actor: &Actor,
        id: Uuid,
        request: RevokeCertificateRequest,
    ) -> Result<Certificate, AppError> {
        actor.require(UserRole::Admin)?;
        request.validate()?;
        let current = self
            .certificates
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Certificate not found".to_string()))?;
        if current.status == CertificateStatus::Revoked {
            return Err(AppError::Conflict("Certificate is already revoked".to_string()));
        }
        let revoked = self
            .certificates
            .revoke(id, &request.reason)
            .await?
            .ok_or_else(|| AppError::Conflict("Certificate is already revoked".to_string()))?;

        tracing::warn!(
            target: "audit",
            event = "certificate.revoked",
            certificate_id = %id,
            admin_id = %actor.user_id,
            reason = %request.reason,
            "Certificate revoked"
        );
        Ok(revoked)
    }

    pub async fn create_template(
        &self,
        actor: &Actor,
        request: CreateTemplateRequest,
    ) -> Result<CertificateTemplate, AppError> {
        actor.require(UserRole::Admin)?;
        request.validate()?;
        let template = self
            .certificates
            .create_template(Some(actor.tenant_id), &request)
            .await?;
        tracing::info!(template_id = %template.id, is_default = template.is_default, "Certificate template created");
        Ok(template)
    }

    pub async fn list_templates(&self, actor: &Actor) -> Result<Vec<CertificateTemplate>, AppError> {
        actor.require(UserRole::Admin)?;
        self.certificates.list_templates(Some(actor.tenant_id)).await
    }

    /// Stores a PNG or JPEG signature sent as base64 (a `data:` URL prefix is accepted).
    pub async fn upload_signature(
        &self,
        actor: &Actor,
        request: UploadSignatureRequest,
    ) -> Result<DigitalSignature, AppError> {
        actor.require(UserRole::Admin)?;
        request.validate()?;

        let encoded = match request.image_base64.strip_prefix("data:") {
            Some(data_url) => data_url
                .split_once(',')
                .map(|(_, data)| data)
                .ok_or_else(|| AppError::InvalidInput("Malformed data URL".to_string()))?,
            None => request.image_base64.as_str(),
        };
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|_| AppError::InvalidInput("imageBase64 is not valid base64".to_string()))?;
        if bytes.len() > MAX_SIGNATURE_BYTES {
            return Err(AppError::InvalidInput(
                "Signature image must be at most 1MB".to_string(),
            ));
        }
        let (content_type, extension) = match image::guess_format(&bytes) {
            Ok(image::ImageFormat::Png) => ("image/png", "png"),
            Ok(image::ImageFormat::Jpeg) => ("image/jpeg", "jpg"),
            _ => {
                return Err(AppError::InvalidInput(
                    "Signature must be a PNG or JPEG image".to_string(),
                ))
            }
        };
        SignatureImage::decode(&bytes)?;

        let storage_key = signature_key(Some(actor.tenant_id), Uuid::new_v4(), extension);
        self.storage.put(&storage_key, content_type, bytes).await?;

        match self
            .certificates
            .create_signature(
                Some(actor.tenant_id),
                &request.signer_name,
                request.signer_title.as_deref(),
                &storage_key,
                content_type,
            )
            .await
        {
            Ok(signature) => Ok(signature),
            Err(e) => {
                if let Err(delete_err) = self.storage.delete(&storage_key).await {
                    tracing::error!(error = %delete_err, storage_key = %storage_key, "Failed to remove orphaned signature image");
                }
                Err(e)
            }
        }
    }
}
