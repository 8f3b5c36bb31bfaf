//! Tenant branding: settings, custom domains, email templates and landing pages

use coursely_core::models::{
    AddDomainRequest, CreateLandingPageRequest, CustomDomain, EmailTemplate, EmailTemplateKind,
    LandingPage, RenderEmailRequest, RenderedEmail, SettingsUpdate, UpdateLandingPageRequest,
    UpsertEmailTemplateRequest, UserRole, WhiteLabelSettings,
};
use coursely_core::AppError;
use coursely_db::WhiteLabelRepository;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::actor::Actor;
use crate::ssrf::ensure_public_host;

pub const VERIFICATION_PATH: &str = "/.well-known/coursely-verification.txt";

/// Checks domain ownership by fetching the token file the tenant publishes on the domain
#[derive(Debug, Clone)]
pub struct DomainVerifier {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl DomainVerifier {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: None,
        })
    }

    /// Sends every lookup to `base_url` instead of `https://{domain}`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    fn url_for(&self, domain: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{}{}", base, VERIFICATION_PATH),
            None => format!("https://{}{}", domain, VERIFICATION_PATH),
        }
    }

    /// `Ok(true)` when the file exists and its trimmed body equals `token`. Unreachable
    /// hosts, redirects and non-2xx answers count as not verified. A domain that is internal
    /// or resolves to a private address is refused before any request is sent.
    pub async fn verify(&self, domain: &str, token: &str) -> Result<bool, AppError> {
        if self.base_url.is_none() {
            ensure_public_host(domain, 443).await.map_err(|reason| {
                tracing::warn!(domain, reason = %reason, "Refusing domain verification fetch");
                AppError::BadRequest(reason)
            })?;
        }

        let url = self.url_for(domain);
        let response = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::debug!(domain, status = %response.status(), "Verification file not served");
                return Ok(false);
            }
            Err(e) => {
                tracing::debug!(domain, error = %e, "Verification request failed");
                return Ok(false);
            }
        };
        match response.text().await {
            Ok(body) => Ok(body.trim() == token),
            Err(e) => {
                tracing::debug!(domain, error = %e, "Verification body unreadable");
                Ok(false)
            }
        }
    }
}

#[derive(Clone)]
pub struct WhiteLabelService {
    repository: WhiteLabelRepository,
    verifier: DomainVerifier,
}

impl WhiteLabelService {
    pub fn new(repository: WhiteLabelRepository, verifier: DomainVerifier) -> Self {
        Self {
            repository,
            verifier,
        }
    }

    /// Stored settings, or the defaults for a tenant that never saved any.
    pub async fn get_settings(&self, tenant_id: Uuid) -> Result<WhiteLabelSettings, AppError> {
        Ok(self
            .repository
            .get_settings(tenant_id)
            .await?
            .unwrap_or_else(|| WhiteLabelSettings::defaults_for(tenant_id)))
    }

    pub async fn update_settings(
        &self,
        actor: &Actor,
        update: SettingsUpdate,
    ) -> Result<WhiteLabelSettings, AppError> {
        actor.require(UserRole::Admin)?;
        update.validate_section()?;
        let mut settings = self.get_settings(actor.tenant_id).await?;
        settings.apply(update);
        let saved = self.repository.save_settings(&settings).await?;
        tracing::info!(tenant_id = %actor.tenant_id, "White-label settings updated");
        Ok(saved)
    }

    pub async fn add_domain(
        &self,
        actor: &Actor,
        mut request: AddDomainRequest,
    ) -> Result<CustomDomain, AppError> {
        actor.require(UserRole::Admin)?;
        request.domain = normalize_domain(&request.domain);
        request.validate()?;
        let token = verification_token();
        let created = self
            .repository
            .add_domain(actor.tenant_id, &request.domain, &token)
            .await?;
        tracing::info!(tenant_id = %actor.tenant_id, domain = %created.domain, "Custom domain added");
        Ok(created)
    }

    pub async fn list_domains(&self, actor: &Actor) -> Result<Vec<CustomDomain>, AppError> {
        actor.require(UserRole::Admin)?;
        self.repository.list_domains(actor.tenant_id).await
    }

    /// Marks the domain verified once its token file is served. Fails with
    /// `PreconditionFailed` until then.
    pub async fn verify_domain(&self, actor: &Actor, id: Uuid) -> Result<CustomDomain, AppError> {
        actor.require(UserRole::Admin)?;
        let domain = self
            .repository
            .get_domain(actor.tenant_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Domain not found".to_string()))?;
        if domain.verified {
            return Ok(domain);
        }
        if !self
            .verifier
            .verify(&domain.domain, &domain.verification_token)
            .await?
        {
            return Err(AppError::PreconditionFailed(format!(
                "Verification token not found at https://{}{}",
                domain.domain, VERIFICATION_PATH
            )));
        }
        let verified = self.repository.mark_domain_verified(id).await?;
        tracing::info!(
            target: "audit",
            event = "domain.verified",
            tenant_id = %actor.tenant_id,
            domain = %verified.domain,
            "Custom domain verified"
        );
        Ok(verified)
    }

    pub async fn upsert_email_template(
        &self,
        actor: &Actor,
        kind: EmailTemplateKind,
        request: UpsertEmailTemplateRequest,
    ) -> Result<EmailTemplate, AppError> {
        actor.require(UserRole::Admin)?;
        request.validate()?;
        self.repository
            .upsert_email_template(actor.tenant_id, kind, &request)
            .await
    }

    pub async fn list_email_templates(&self, actor: &Actor) -> Result<Vec<EmailTemplate>, AppError> {
        actor.require(UserRole::Admin)?;
        self.repository.list_email_templates(actor.tenant_id).await
    }

    pub async fn render_email_template(
        &self,
        actor: &Actor,
        kind: EmailTemplateKind,
        request: RenderEmailRequest,
    ) -> Result<RenderedEmail, AppError> {
        actor.require(UserRole::Admin)?;
        let template = self
            .repository
            .get_email_template(actor.tenant_id, kind)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No {} email template", kind)))?;
        Ok(template.render(&request.variables))
    }

    pub async fn create_landing_page(
        &self,
        actor: &Actor,
        request: CreateLandingPageRequest,
    ) -> Result<LandingPage, AppError> {
        actor.require(UserRole::Admin)?;
        request.validate()?;
        self.repository
            .create_landing_page(actor.tenant_id, &request)
            .await
    }

    pub async fn update_landing_page(
        &self,
        actor: &Actor,
        id: Uuid,
        request: UpdateLandingPageRequest,
    ) -> Result<LandingPage, AppError> {
        actor.require(UserRole::Admin)?;
        request.validate()?;
        self.repository
            .update_landing_page(actor.tenant_id, id, &request)
            .await?
            .ok_or_else(|| AppError::NotFound("Landing page not found".to_string()))
    }

    pub async fn set_landing_page_published(
        &self,
        actor: &Actor,
        id: Uuid,
        published: bool,
    ) -> Result<LandingPage, AppError> {
        actor.require(UserRole::Admin)?;
        self.repository
            .set_landing_page_published(actor.tenant_id, id, published)
            .await?
            .ok_or_else(|| AppError::NotFound("Landing page not found".to_string()))
    }

    pub async fn list_landing_pages(&self, actor: &Actor) -> Result<Vec<LandingPage>, AppError> {
        actor.require(UserRole::Admin)?;
        self.repository.list_landing_pages(actor.tenant_id).await
    }

    /// Public pages are published ones; admins of the tenant also see drafts.
    pub async fn get_landing_page(
        &self,
        actor: Option<&Actor>,
        tenant_id: Uuid,
        slug: &str,
    ) -> Result<LandingPage, AppError> {
        let drafts_visible =
            actor.is_some_and(|a| a.is_admin() && a.tenant_id == tenant_id);
        self.repository
            .get_landing_page_by_slug(tenant_id, slug, !drafts_visible)
            .await?
            .ok_or_else(|| AppError::NotFound("Landing page not found".to_string()))
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn verification_token() -> String {
    format!("coursely-verify-{:032x}", rand::random::<u128>())
}
