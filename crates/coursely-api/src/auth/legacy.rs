//! Adapter for access tokens minted by the previous hosted auth provider
//!
//! Those tokens are HS256 JWTs with `aud = "authenticated"`. The platform role and tenant
//! live in `app_metadata`; the top-level `role` claim is the provider's own and usually
//! just says `authenticated`.

use coursely_core::constants::DEFAULT_TENANT_ID;
use coursely_core::models::UserRole;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use super::CurrentUser;

const LEGACY_AUDIENCE: &str = "authenticated";

#[derive(Debug, Default, Deserialize)]
struct AppMetadata {
    role: Option<String>,
    tenant_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct LegacyClaims {
    sub: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    app_metadata: AppMetadata,
}

#[derive(Clone)]
pub struct LegacyTokens {
    decoding: DecodingKey,
}

impl LegacyTokens {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn decode(&self, token: &str) -> Option<CurrentUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[LEGACY_AUDIENCE]);

        let claims = match decode::<LegacyClaims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "Legacy token rejected");
                return None;
            }
        };

        let role = claims
            .app_metadata
            .role
            .as_deref()
            .or(claims.role.as_deref())
            .and_then(|r| r.parse::<UserRole>().ok())
            .unwrap_or(UserRole::Student);

        Some(CurrentUser {
            id: claims.sub,
            role,
            email: claims.email.unwrap_or_default(),
            tenant_id: claims.app_metadata.tenant_id.unwrap_or(DEFAULT_TENANT_ID),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "legacy-secret-legacy-secret-legacy";

    fn sign(claims: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_role_from_app_metadata() {
        let id = Uuid::new_v4();
        let tenant = Uuid::new_v4();
        let token = sign(json!({
            "sub": id,
            "aud": "authenticated",
            "exp": exp(),
            "email": "grace@example.com",
            "role": "authenticated",
            "app_metadata": { "role": "instructor", "tenant_id": tenant }
        }));

        let user = LegacyTokens::new(SECRET).decode(&token).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, UserRole::Instructor);
        assert_eq!(user.tenant_id, tenant);
    }

    #[test]
    fn test_plain_authenticated_user_is_student_in_default_tenant() {
        let token = sign(json!({
            "sub": Uuid::new_v4(),
            "aud": "authenticated",
            "exp": exp(),
            "role": "authenticated"
        }));

        let user = LegacyTokens::new(SECRET).decode(&token).unwrap();
        assert_eq!(user.role, UserRole::Student);
        assert_eq!(user.tenant_id, DEFAULT_TENANT_ID);
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let token = sign(json!({
            "sub": Uuid::new_v4(),
            "aud": "service_role",
            "exp": exp()
        }));
        assert!(LegacyTokens::new(SECRET).decode(&token).is_none());
    }
}
