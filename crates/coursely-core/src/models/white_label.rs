//! Per-tenant white-label settings, custom domains, email templates and landing pages.
//!
//! Settings are stored as JSONB but modeled as closed, typed sections: unknown keys are
//! rejected at deserialization and each section validates its own values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::LazyLock;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BrandingSettings {
    #[validate(length(max = 100, message = "platformName must be at most 100 characters"))]
    pub platform_name: Option<String>,
    #[validate(url(message = "Invalid logoUrl"))]
    pub logo_url: Option<String>,
    #[validate(url(message = "Invalid faviconUrl"))]
    pub favicon_url: Option<String>,
    #[validate(email(message = "Invalid supportEmail"))]
    pub support_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ThemeSettings {
    #[validate(custom(function = "crate::validation::hex_color"))]
    pub primary_color: String,
    #[validate(custom(function = "crate::validation::hex_color"))]
    pub secondary_color: String,
    #[validate(custom(function = "crate::validation::hex_color"))]
    pub accent_color: String,
    #[validate(length(min = 1, max = 100, message = "fontFamily must be between 1 and 100 characters"))]
    pub font_family: String,
    pub dark_mode: bool,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        ThemeSettings {
            primary_color: "#4F46E5".to_string(),
            secondary_color: "#0EA5E9".to_string(),
            accent_color: "#F59E0B".to_string(),
            font_family: "Inter".to_string(),
            dark_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FeatureSettings {
    pub live_classes: bool,
    pub certificates: bool,
    pub subscriptions: bool,
    pub community: bool,
    pub custom_domain: bool,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        FeatureSettings {
            live_classes: true,
            certificates: true,
            subscriptions: false,
            community: false,
            custom_domain: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeoSettings {
    #[validate(length(max = 60, message = "metaTitle must be at most 60 characters"))]
    pub meta_title: Option<String>,
    #[validate(length(max = 160, message = "metaDescription must be at most 160 characters"))]
    pub meta_description: Option<String>,
    #[validate(url(message = "Invalid ogImageUrl"))]
    pub og_image_url: Option<String>,
    #[validate(length(max = 20, message = "At most 20 keywords"))]
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Stored settings for one tenant
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct WhiteLabelSettings {
    pub tenant_id: Uuid,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub branding: BrandingSettings,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub theme: ThemeSettings,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub features: FeatureSettings,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub seo: SeoSettings,
    pub updated_at: DateTime<Utc>,
}

impl WhiteLabelSettings {
    pub fn defaults_for(tenant_id: Uuid) -> Self {
        WhiteLabelSettings {
            tenant_id,
            branding: BrandingSettings::default(),
            theme: ThemeSettings::default(),
            features: FeatureSettings::default(),
            seo: SeoSettings::default(),
            updated_at: Utc::now(),
        }
    }

    /// Replaces exactly the section carried by `update`.
    pub fn apply(&mut self, update: SettingsUpdate) {
        match update {
            SettingsUpdate::Branding(branding) => self.branding = branding,
            SettingsUpdate::Theme(theme) => self.theme = theme,
            SettingsUpdate::Features(features) => self.features = features,
            SettingsUpdate::Seo(seo) => self.seo = seo,
        }
    }
}

/// One-section update, tagged by section name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "section", content = "settings", rename_all = "snake_case")]
pub enum SettingsUpdate {
    Branding(BrandingSettings),
    Theme(ThemeSettings),
    Features(FeatureSettings),
    Seo(SeoSettings),
}

impl SettingsUpdate {
    pub fn validate_section(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            SettingsUpdate::Branding(s) => s.validate(),
            SettingsUpdate::Theme(s) => s.validate(),
            SettingsUpdate::Features(s) => s.validate(),
            SettingsUpdate::Seo(s) => s.validate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CustomDomain {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub domain: String,
    pub verification_token: String,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddDomainRequest {
    #[validate(
        length(max = 253, message = "Domain must be at most 253 characters"),
        custom(function = "crate::validation::domain_name")
    )]
    pub domain: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "email_template_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplateKind {
    Welcome,
    EnrollmentConfirmation,
    PaymentReceipt,
    CertificateIssued,
    LiveClassReminder,
}

impl Display for EmailTemplateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EmailTemplateKind::Welcome => write!(f, "welcome"),
            EmailTemplateKind::EnrollmentConfirmation => write!(f, "enrollment_confirmation"),
            EmailTemplateKind::PaymentReceipt => write!(f, "payment_receipt"),
            EmailTemplateKind::CertificateIssued => write!(f, "certificate_issued"),
            EmailTemplateKind::LiveClassReminder => write!(f, "live_class_reminder"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub kind: EmailTemplateKind,
    pub subject: String,
    pub body_html: String,
    pub body_text: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertEmailTemplateRequest {
    #[validate(length(min = 1, max = 200, message = "Subject must be between 1 and 200 characters"))]
    pub subject: String,
    #[validate(length(min = 1, max = 100000, message = "bodyHtml must not be empty"))]
    pub body_html: String,
    pub body_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RenderEmailRequest {
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderedEmail {
    pub subject: String,
    pub body_html: String,
    pub body_text: Option<String>,
}

static PLACEHOLDER: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is valid")
});

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replaces `{{name}}` placeholders. Unknown placeholders are left untouched.
pub fn render_placeholders(
    template: &str,
    variables: &HashMap<String, String>,
    html: bool,
) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            match variables.get(&caps[1]) {
                Some(value) if html => escape_html(value),
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

impl EmailTemplate {
    pub fn render(&self, variables: &HashMap<String, String>) -> RenderedEmail {
        RenderedEmail {
            subject: render_placeholders(&self.subject, variables, false),
            body_html: render_placeholders(&self.body_html, variables, true),
            body_text: self
                .body_text
                .as_deref()
                .map(|text| render_placeholders(text, variables, false)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Testimonial {
    pub author: String,
    pub quote: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CallToAction {
    pub text: String,
    pub url: String,
}

/// Typed landing-page block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LandingSection {
    Hero {
        heading: String,
        subheading: Option<String>,
        cta: Option<CallToAction>,
    },
    FeaturedCourses {
        courses: Vec<Uuid>,
    },
    Testimonials {
        items: Vec<Testimonial>,
    },
    Faq {
        items: Vec<FaqItem>,
    },
    RichText {
        html: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct LandingPage {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub slug: String,
    pub title: String,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub sections: Vec<LandingSection>,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLandingPageRequest {
    #[validate(
        length(min = 1, max = 120, message = "Slug must be between 1 and 120 characters"),
        custom(function = "crate::validation::slug")
    )]
    pub slug: String,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(max = 50, message = "At most 50 sections"))]
    #[serde(default)]
    pub sections: Vec<LandingSection>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLandingPageRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 50, message = "At most 50 sections"))]
    pub sections: Option<Vec<LandingSection>>,
}
