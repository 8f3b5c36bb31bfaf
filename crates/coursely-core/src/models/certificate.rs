use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "certificate_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Issued,
    Revoked,
}

/// Issued completion certificate
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub signature_id: Option<Uuid>,
    /// Human-facing identifier, `CERT-YYYY-XXXXXXXX`
    pub certificate_number: String,
    /// Public lookup code for verification
    pub verification_code: String,
    pub recipient_name: String,
    pub course_title: String,
    pub storage_key: String,
    pub file_url: String,
    pub status: CertificateStatus,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revocation_reason: Option<String>,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub signature_id: Option<Uuid>,
    pub certificate_number: String,
    pub verification_code: String,
    pub recipient_name: String,
    pub course_title: String,
    pub storage_key: String,
    pub file_url: String,
}

/// What a positioned template field prints
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TemplateFieldKind {
    RecipientName,
    CourseTitle,
    IssueDate,
    CertificateNumber,
    VerificationCode,
    InstructorName,
    /// Prints the field's `text` verbatim
    StaticText,
}

/// A text field placed at absolute page coordinates (points, origin bottom-left)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TemplateField {
    pub kind: TemplateFieldKind,
    #[validate(range(min = 0.0, max = 5000.0))]
    pub x: f32,
    #[validate(range(min = 0.0, max = 5000.0))]
    pub y: f32,
    #[validate(range(min = 4.0, max = 144.0, message = "fontSize must be between 4 and 144"))]
    pub font_size: f32,
    #[serde(default)]
    pub text: Option<String>,
}

/// Placement of the signature image on the page
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignaturePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CertificateTemplate {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub name: String,
    pub page_width: f32,
    pub page_height: f32,
    pub title: String,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub fields: Vec<TemplateField>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub signature_placement: Option<SignaturePlacement>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl CertificateTemplate {
    /// Template used when neither an explicit nor a tenant default template exists.
    pub fn built_in() -> Self {
        let field = |kind, y, font_size| TemplateField {
            kind,
            x: 72.0,
            y,
            font_size,
            text: None,
        };
        CertificateTemplate {
            id: Uuid::nil(),
            tenant_id: None,
            name: "Built-in".to_string(),
            page_width: 842.0,
            page_height: 595.0,
            title: "Certificate of Completion".to_string(),
            fields: vec![
                TemplateField {
                    kind: TemplateFieldKind::StaticText,
                    x: 72.0,
                    y: 480.0,
                    font_size: 32.0,
                    text: Some("Certificate of Completion".to_string()),
                },
                TemplateField {
                    kind: TemplateFieldKind::StaticText,
                    x: 72.0,
                    y: 420.0,
                    font_size: 14.0,
                    text: Some("This certifies that".to_string()),
                },
                field(TemplateFieldKind::RecipientName, 380.0, 28.0),
                TemplateField {
                    kind: TemplateFieldKind::StaticText,
                    x: 72.0,
                    y: 340.0,
                    font_size: 14.0,
                    text: Some("has successfully completed".to_string()),
                },
                field(TemplateFieldKind::CourseTitle, 300.0, 22.0),
                field(TemplateFieldKind::InstructorName, 200.0, 12.0),
                field(TemplateFieldKind::IssueDate, 120.0, 11.0),
                field(TemplateFieldKind::CertificateNumber, 100.0, 11.0),
                field(TemplateFieldKind::VerificationCode, 80.0, 11.0),
            ],
            signature_placement: Some(SignaturePlacement {
                x: 560.0,
                y: 160.0,
                width: 180.0,
                height: 60.0,
            }),
            is_default: false,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be between 1 and 120 characters"))]
    pub name: String,
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,
    #[serde(default = "default_page_width")]
    #[validate(range(min = 100.0, max = 5000.0))]
    pub page_width: f32,
    #[serde(default = "default_page_height")]
    #[validate(range(min = 100.0, max = 5000.0))]
    pub page_height: f32,
    #[validate(length(min = 1, max = 50, message = "A template needs between 1 and 50 fields"), nested)]
    pub fields: Vec<TemplateField>,
    pub signature_placement: Option<SignaturePlacement>,
    #[serde(default)]
    pub is_default: bool,
}

fn default_page_width() -> f32 {
    842.0
}

fn default_page_height() -> f32 {
    595.0
}

/// Stored signature image that can be stamped on certificates
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct DigitalSignature {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub signer_name: String,
    pub signer_title: Option<String>,
    pub storage_key: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadSignatureRequest {
    #[validate(length(min = 1, max = 120, message = "signerName is required"))]
    pub signer_name: String,
    #[validate(length(max = 120))]
    pub signer_title: Option<String>,
    /// PNG or JPEG image, base64 encoded
    #[validate(length(min = 1, max = 2_000_000, message = "imageBase64 must be at most 2MB of base64"))]
    pub image_base64: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCertificateRequest {
    pub course_id: Uuid,
    /// Admins may issue on behalf of another user; defaults to the caller
    pub user_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub signature_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RevokeCertificateRequest {
    #[validate(length(min = 1, max = 500, message = "A revocation reason is required"))]
    pub reason: String,
}

/// Logged verification attempt
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CertificateVerification {
    pub id: Uuid,
    pub certificate_id: Option<Uuid>,
    pub verification_code: String,
    pub is_valid: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub verified_at: DateTime<Utc>,
}

/// Public answer to a verification lookup
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub valid: bool,
    pub certificate_number: Option<String>,
    pub recipient_name: Option<String>,
    pub course_title: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub status: Option<CertificateStatus>,
}

impl VerificationResult {
    pub fn invalid() -> Self {
        VerificationResult {
            valid: false,
            certificate_number: None,
            recipient_name: None,
            course_title: None,
            issued_at: None,
            status: None,
        }
    }

    pub fn for_certificate(certificate: &Certificate) -> Self {
        VerificationResult {
            valid: certificate.status == CertificateStatus::Issued,
            certificate_number: Some(certificate.certificate_number.clone()),
            recipient_name: Some(certificate.recipient_name.clone()),
            course_title: Some(certificate.course_title.clone()),
            issued_at: Some(certificate.issued_at),
            status: Some(certificate.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_field_rejects_unknown_keys() {
        let result: Result<TemplateField, _> = serde_json::from_value(serde_json::json!({
            "kind": "recipient_name",
            "x": 10.0,
            "y": 20.0,
            "fontSize": 12.0,
            "color": "red"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_revoked_certificate_is_not_valid() {
        let mut certificate = Certificate {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            tenant_id: None,
            template_id: None,
            signature_id: None,
            certificate_number: "CERT-2024-ABCDEFGH".to_string(),
            verification_code: "ABCDEFGHJKLM".to_string(),
            recipient_name: "Asha".to_string(),
            course_title: "Rust 101".to_string(),
            storage_key: "certificates/x.pdf".to_string(),
            file_url: "/files/certificates/x.pdf".to_string(),
            status: CertificateStatus::Issued,
            revoked_at: None,
            revocation_reason: None,
            issued_at: Utc::now(),
        };
        assert!(VerificationResult::for_certificate(&certificate).valid);
        certificate.status = CertificateStatus::Revoked;
        assert!(!VerificationResult::for_certificate(&certificate).valid);
    }

    #[test]
    fn test_built_in_template_prints_recipient_and_course() {
        let template = CertificateTemplate::built_in();
        let kinds: Vec<_> = template.fields.iter().map(|f| f.kind).collect();
        assert!(kinds.contains(&TemplateFieldKind::RecipientName));
        assert!(kinds.contains(&TemplateFieldKind::CourseTitle));
    }
}
