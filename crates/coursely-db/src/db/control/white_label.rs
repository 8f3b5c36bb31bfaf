use coursely_core::models::{
    CreateLandingPageRequest, CustomDomain, EmailTemplate, EmailTemplateKind, LandingPage,
    UpdateLandingPageRequest, UpsertEmailTemplateRequest, WhiteLabelSettings,
};
use coursely_core::AppError;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Settings, custom domains, email templates and landing pages of a tenant
#[derive(Clone)]
pub struct WhiteLabelRepository {
    pool: PgPool,
}

impl WhiteLabelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "white_label_settings", db.operation = "select"))]
    pub async fn get_settings(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<WhiteLabelSettings>, AppError> {
        let settings = sqlx::query_as::<Postgres, WhiteLabelSettings>(
            "SELECT * FROM white_label_settings WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(settings)
    }

    #[tracing::instrument(skip(self, settings), fields(db.table = "white_label_settings", db.operation = "upsert", tenant_id = %settings.tenant_id))]
    pub async fn save_settings(
        &self,
        settings: &WhiteLabelSettings,
    ) -> Result<WhiteLabelSettings, AppError> {
        let saved = sqlx::query_as::<Postgres, WhiteLabelSettings>(
            r#"
            INSERT INTO white_label_settings (tenant_id, branding, theme, features, seo, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (tenant_id) DO UPDATE
            SET branding = EXCLUDED.branding,
                theme = EXCLUDED.theme,
                features = EXCLUDED.features,
                seo = EXCLUDED.seo,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(settings.tenant_id)
        .bind(Json(&settings.branding))
        .bind(Json(&settings.theme))
        .bind(Json(&settings.features))
        .bind(Json(&settings.seo))
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    #[tracing::instrument(skip(self, verification_token), fields(db.table = "custom_domains", db.operation = "insert"))]
    pub async fn add_domain(
        &self,
        tenant_id: Uuid,
        domain: &str,
        verification_token: &str,
    ) -> Result<CustomDomain, AppError> {
        let created = sqlx::query_as::<Postgres, CustomDomain>(
            r#"
            INSERT INTO custom_domains (tenant_id, domain, verification_token)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(domain)
        .bind(verification_token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("Domain '{}' is already registered", domain))
            }
            other => other,
        })?;
        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "custom_domains", db.operation = "select"))]
    pub async fn list_domains(&self, tenant_id: Uuid) -> Result<Vec<CustomDomain>, AppError> {
        let domains = sqlx::query_as::<Postgres, CustomDomain>(
            "SELECT * FROM custom_domains WHERE tenant_id = $1 ORDER BY created_at ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(domains)
    }

    #[tracing::instrument(skip(self), fields(db.table = "custom_domains", db.operation = "select"))]
    pub async fn get_domain(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<CustomDomain>, AppError> {
        let domain = sqlx::query_as::<Postgres, CustomDomain>(
            "SELECT * FROM custom_domains WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(domain)
    }

    #[tracing::instrument(skip(self), fields(db.table = "custom_domains", db.operation = "update"))]
    pub async fn mark_domain_verified(&self, id: Uuid) -> Result<CustomDomain, AppError> {
        let domain = sqlx::query_as::<Postgres, CustomDomain>(
            r#"
            UPDATE custom_domains
            SET verified = TRUE, verified_at = COALESCE(verified_at, NOW())
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Custom domain not found".to_string()))?;
        Ok(domain)
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "email_templates", db.operation = "upsert"))]
    pub async fn upsert_email_template(
        &self,
        tenant_id: Uuid,
        kind: EmailTemplateKind,
        request: &UpsertEmailTemplateRequest,
    ) -> Result<EmailTemplate, AppError> {
        let template = sqlx::query_as::<Postgres, EmailTemplate>(
            r#"
            INSERT INTO email_templates (tenant_id, kind, subject, body_html, body_text)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id, kind) DO UPDATE
            SET subject = EXCLUDED.subject,
                body_html = EXCLUDED.body_html,
                body_text = EXCLUDED.body_text,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(kind)
        .bind(&request.subject)
        .bind(&request.body_html)
        .bind(&request.body_text)
        .fetch_one(&self.pool)
        .await?;
        Ok(template)
    }

    #[tracing::instrument(skip(self), fields(db.table = "email_templates", db.operation = "select"))]
    pub async fn get_email_template(
        &self,
        tenant_id: Uuid,
        kind: EmailTemplateKind,
    ) -> Result<Option<EmailTemplate>, AppError> {
        let template = sqlx::query_as::<Postgres, EmailTemplate>(
            "SELECT * FROM email_templates WHERE tenant_id = $1 AND kind = $2",
        )
        .bind(tenant_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        Ok(template)
    }

    #[tracing::instrument(skip(self), fields(db.table = "email_templates", db.operation = "select"))]
    pub async fn list_email_templates(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<EmailTemplate>, AppError> {
        let templates = sqlx::query_as::<Postgres, EmailTemplate>(
            "SELECT * FROM email_templates WHERE tenant_id = $1 ORDER BY kind",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "landing_pages", db.operation = "insert"))]
    pub async fn create_landing_page(
        &self,
        tenant_id: Uuid,
        request: &CreateLandingPageRequest,
    ) -> Result<LandingPage, AppError> {
        let page = sqlx::query_as::<Postgres, LandingPage>(
            r#"
            INSERT INTO landing_pages (tenant_id, slug, title, sections)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&request.slug)
        .bind(&request.title)
        .bind(Json(&request.sections))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "A landing page with slug '{}' already exists",
                request.slug
            )),
            other => other,
        })?;
        Ok(page)
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "landing_pages", db.operation = "update"))]
    pub async fn update_landing_page(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        request: &UpdateLandingPageRequest,
    ) -> Result<Option<LandingPage>, AppError> {
        let page = sqlx::query_as::<Postgres, LandingPage>(
            r#"
            UPDATE landing_pages
            SET title = COALESCE($3, title),
                sections = COALESCE($4, sections),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&request.title)
        .bind(request.sections.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await?;
        Ok(page)
    }

    #[tracing::instrument(skip(self), fields(db.table = "landing_pages", db.operation = "update"))]
    pub async fn set_landing_page_published(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        published: bool,
    ) -> Result<Option<LandingPage>, AppError> {
        let page = sqlx::query_as::<Postgres, LandingPage>(
            r#"
            UPDATE landing_pages
            SET is_published = $3,
                published_at = CASE WHEN $3 THEN COALESCE(published_at, NOW()) ELSE NULL END,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(published)
        .fetch_optional(&self.pool)
        .await?;
        Ok(page)
    }

    #[tracing::instrument(skip(self), fields(db.table = "landing_pages", db.operation = "select"))]
    pub async fn list_landing_pages(&self, tenant_id: Uuid) -> Result<Vec<LandingPage>, AppError> {
        let pages = sqlx::query_as::<Postgres, LandingPage>(
            "SELECT * FROM landing_pages WHERE tenant_id = $1 ORDER BY updated_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(pages)
    }

    #[tracing::instrument(skip(self), fields(db.table = "landing_pages", db.operation = "select"))]
    pub async fn get_landing_page_by_slug(
        &self,
        tenant_id: Uuid,
        slug: &str,
        published_only: bool,
    ) -> Result<Option<LandingPage>, AppError> {
        let page = sqlx::query_as::<Postgres, LandingPage>(
            r#"
            SELECT * FROM landing_pages
            WHERE tenant_id = $1 AND slug = $2 AND (is_published OR NOT $3)
            "#,
        )
        .bind(tenant_id)
        .bind(slug)
        .bind(published_only)
        .fetch_optional(&self.pool)
        .await?;
        Ok(page)
    }
}
