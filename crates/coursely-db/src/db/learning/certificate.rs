use coursely_core::models::{
    Certificate, CertificateTemplate, CertificateVerification, CreateTemplateRequest,
    DigitalSignature, NewCertificate,
};
use coursely_core::AppError;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::db::transaction::TransactionGuard;

/// Names printed on a certificate, resolved from the user, course and instructor rows
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IssuanceContext {
    pub recipient_name: String,
    pub course_title: String,
    pub instructor_name: String,
    pub tenant_id: Uuid,
}

#[async_trait::async_trait]
pub trait CertificateRepositoryTrait: Send + Sync {
    async fn issuance_context(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<IssuanceContext>, AppError>;

    async fn find_issued(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Certificate>, AppError>;

    async fn get_template(&self, id: Uuid) -> Result<Option<CertificateTemplate>, AppError>;

    async fn default_template(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<CertificateTemplate>, AppError>;

    async fn get_signature(&self, id: Uuid) -> Result<Option<DigitalSignature>, AppError>;

    /// Inserts the certificate and flips the enrollment's `certificate_issued` flag in one
    /// transaction.
    async fn create_and_flag_enrollment(
        &self,
        certificate: NewCertificate,
    ) -> Result<Certificate, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Certificate>, AppError>;

    async fn find_by_verification_code(
        &self,
        code: &str,
    ) -> Result<Option<Certificate>, AppError>;

    async fn log_verification(
        &self,
        certificate_id: Option<Uuid>,
        code: &str,
        is_valid: bool,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<CertificateVerification, AppError>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Certificate>, AppError>;

    /// Revokes an issued certificate and clears the enrollment flag so it can be reissued.
    async fn revoke(&self, id: Uuid, reason: &str) -> Result<Option<Certificate>, AppError>;

    /// Creates a template; making it the default clears the tenant's previous default.
    async fn create_template(
        &self,
        tenant_id: Option<Uuid>,
        request: &CreateTemplateRequest,
    ) -> Result<CertificateTemplate, AppError>;

    async fn list_templates(
        &self,
        tenant_id: Option<Uuid>,
    ) -> Result<Vec<CertificateTemplate>, AppError>;

    async fn create_signature(
        &self,
        tenant_id: Option<Uuid>,
        signer_name: &str,
        signer_title: Option<&str>,
        storage_key: &str,
        content_type: &str,
    ) -> Result<DigitalSignature, AppError>;
}

#[derive(Clone)]
pub struct CertificateRepository {
    pool: PgPool,
}

impl CertificateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CertificateRepositoryTrait for CertificateRepository {
    #[tracing::instrument(skip(self), fields(db.table = "courses", db.operation = "select"))]
    async fn issuance_context(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<IssuanceContext>, AppError> {
        let context = sqlx::query_as::<Postgres, IssuanceContext>(
            r#"
            SELECT
                COALESCE(u.full_name, u.email) AS recipient_name,
                c.title AS course_title,
                COALESCE(i.full_name, i.email) AS instructor_name,
                c.tenant_id
            FROM users u
            CROSS JOIN courses c
            JOIN users i ON i.id = c.instructor_id
            WHERE u.id = $1 AND c.id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(context)
    }

    #[tracing::instrument(skip(self), fields(db.table = "certificates", db.operation = "select"))]
    async fn find_issued(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Certificate>, AppError> {
        let certificate = sqlx::query_as::<Postgres, Certificate>(
            r#"
            SELECT * FROM certificates
            WHERE user_id = $1 AND course_id = $2 AND status = 'issued'
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(certificate)
    }

    #[tracing::instrument(skip(self), fields(db.table = "certificate_templates", db.operation = "select"))]
    async fn get_template(&self, id: Uuid) -> Result<Option<CertificateTemplate>, AppError> {
        let template = sqlx::query_as::<Postgres, CertificateTemplate>(
            "SELECT * FROM certificate_templates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(template)
    }

    #[tracing::instrument(skip(self), fields(db.table = "certificate_templates", db.operation = "select"))]
    async fn default_template(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<CertificateTemplate>, AppError> {
        let template = sqlx::query_as::<Postgres, CertificateTemplate>(
            "SELECT * FROM certificate_templates WHERE tenant_id = $1 AND is_default",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(template)
    }

    #[tracing::instrument(skip(self), fields(db.table = "digital_signatures", db.operation = "select"))]
    async fn get_signature(&self, id: Uuid) -> Result<Option<DigitalSignature>, AppError> {
        let signature = sqlx::query_as::<Postgres, DigitalSignature>(
            "SELECT * FROM digital_signatures WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(signature)
    }

    #[tracing::instrument(skip(self, certificate), fields(db.table = "certificates", db.operation = "insert"))]
    async fn create_and_flag_enrollment(
        &self,
        certificate: NewCertificate,
    ) -> Result<Certificate, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "issue_certificate").await?;

        let created = sqlx::query_as::<Postgres, Certificate>(
            r#"
            INSERT INTO certificates (
                user_id, course_id, tenant_id, template_id, signature_id, certificate_number,
                verification_code, recipient_name, course_title, storage_key, file_url, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'issued')
            RETURNING *
            "#,
        )
        .bind(certificate.user_id)
        .bind(certificate.course_id)
        .bind(certificate.tenant_id)
        .bind(certificate.template_id)
        .bind(certificate.signature_id)
        .bind(&certificate.certificate_number)
        .bind(&certificate.verification_code)
        .bind(&certificate.recipient_name)
        .bind(&certificate.course_title)
        .bind(&certificate.storage_key)
        .bind(&certificate.file_url)
        .fetch_one(tx.conn())
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(
                "A certificate has already been issued for this course".to_string(),
            ),
            other => other,
        })?;

        let flagged = sqlx::query(
            r#"
            UPDATE enrollments
            SET certificate_issued = TRUE, updated_at = NOW()
            WHERE user_id = $1 AND course_id = $2 AND status = 'completed'
            "#,
        )
        .bind(certificate.user_id)
        .bind(certificate.course_id)
        .execute(tx.conn())
        .await?;

        if flagged.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::PreconditionFailed(
                "Course enrollment is not completed".to_string(),
            ));
        }

        tx.commit().await?;

        tracing::info!(
            certificate_id = %created.id,
            certificate_number = %created.certificate_number,
            "Issued certificate"
        );
        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "certificates", db.operation = "select"))]
    async fn get(&self, id: Uuid) -> Result<Option<Certificate>, AppError> {
        let certificate =
            sqlx::query_as::<Postgres, Certificate>("SELECT * FROM certificates WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(certificate)
    }

    #[tracing::instrument(skip(self, code), fields(db.table = "certificates", db.operation = "select"))]
    async fn find_by_verification_code(
        &self,
        code: &str,
    ) -> Result<Option<Certificate>, AppError> {
        let certificate = sqlx::query_as::<Postgres, Certificate>(
            "SELECT * FROM certificates WHERE verification_code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(certificate)
    }

    #[tracing::instrument(skip(self, code, user_agent), fields(db.table = "certificate_verifications", db.operation = "insert"))]
    async fn log_verification(
        &self,
        certificate_id: Option<Uuid>,
        code: &str,
        is_valid: bool,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<CertificateVerification, AppError> {
        let entry = sqlx::query_as::<Postgres, CertificateVerification>(
            r#"
            INSERT INTO certificate_verifications (certificate_id, verification_code, is_valid, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(certificate_id)
        .bind(code)
        .bind(is_valid)
        .bind(ip_address)
        .bind(user_agent)
        .fetch_one(&self.pool)
        .await?;
        Ok(entry)
    }

    #[tracing::instrument(skip(self), fields(db.table = "certificates", db.operation = "select"))]
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Certificate>, AppError> {
        let certificates = sqlx::query_as::<Postgres, Certificate>(
            "SELECT * FROM certificates WHERE user_id = $1 ORDER BY issued_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(certificates)
    }

    #[tracing::instrument(skip(self, reason), fields(db.table = "certificates", db.operation = "update"))]
    async fn revoke(&self, id: Uuid, reason: &str) -> Result<Option<Certificate>, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "revoke_certificate").await?;

        let revoked = sqlx::query_as::<Postgres, Certificate>(
            r#"
            UPDATE certificates
            SET status = 'revoked', revoked_at = NOW(), revocation_reason = $2
            WHERE id = $1 AND status = 'issued'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(tx.conn())
        .await?;

        if let Some(certificate) = &revoked {
            sqlx::query(
                r#"
                UPDATE enrollments
                SET certificate_issued = FALSE, updated_at = NOW()
                WHERE user_id = $1 AND course_id = $2
                "#,
            )
            .bind(certificate.user_id)
            .bind(certificate.course_id)
            .execute(tx.conn())
            .await?;
        }

        tx.commit().await?;
        Ok(revoked)
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "certificate_templates", db.operation = "insert"))]
    async fn create_template(
        &self,
        tenant_id: Option<Uuid>,
        request: &CreateTemplateRequest,
    ) -> Result<CertificateTemplate, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool, "create_certificate_template").await?;

        if request.is_default {
            sqlx::query(
                r#"
                UPDATE certificate_templates
                SET is_default = FALSE
                WHERE tenant_id IS NOT DISTINCT FROM $1 AND is_default
                "#,
            )
            .bind(tenant_id)
            .execute(tx.conn())
            .await?;
        }

        let template = sqlx::query_as::<Postgres, CertificateTemplate>(
            r#"
            INSERT INTO certificate_templates (
                tenant_id, name, title, page_width, page_height, fields, signature_placement, is_default
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&request.name)
        .bind(&request.title)
        .bind(request.page_width)
        .bind(request.page_height)
        .bind(Json(&request.fields))
        .bind(Json(&request.signature_placement))
        .bind(request.is_default)
        .fetch_one(tx.conn())
        .await?;

        tx.commit().await?;
        Ok(template)
    }

    #[tracing::instrument(skip(self), fields(db.table = "certificate_templates", db.operation = "select"))]
    async fn list_templates(
        &self,
        tenant_id: Option<Uuid>,
    ) -> Result<Vec<CertificateTemplate>, AppError> {
        let templates = sqlx::query_as::<Postgres, CertificateTemplate>(
            r#"
            SELECT * FROM certificate_templates
            WHERE tenant_id IS NOT DISTINCT FROM $1
            ORDER BY is_default DESC, created_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    #[tracing::instrument(skip(self), fields(db.table = "digital_signatures", db.operation = "insert"))]
    async fn create_signature(
        &self,
        tenant_id: Option<Uuid>,
        signer_name: &str,
        signer_title: Option<&str>,
        storage_key: &str,
        content_type: &str,
    ) -> Result<DigitalSignature, AppError> {
        let signature = sqlx::query_as::<Postgres, DigitalSignature>(
            r#"
            INSERT INTO digital_signatures (tenant_id, signer_name, signer_title, storage_key, content_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(signer_name)
        .bind(signer_title)
        .bind(storage_key)
        .bind(content_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(signature)
    }
}
