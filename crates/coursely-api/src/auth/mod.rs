//! Request authentication
//!
//! [`Authenticator::current_user`] is the single entry point. It looks for a token in the
//! session cookie and then in `Authorization: Bearer`, and accepts either a first-party
//! session token or a legacy provider token.

mod legacy;
mod session;

pub use legacy::LegacyTokens;
pub use session::{SessionClaims, SessionTokens};

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};
use coursely_core::constants::SESSION_COOKIE;
use coursely_core::models::UserRole;
use coursely_core::{AppError, AuthConfig};
use coursely_services::Actor;
use std::convert::Infallible;
use uuid::Uuid;

use crate::error::HttpAppError;

/// Authenticated identity, stored in request extensions by the route gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: UserRole,
    pub email: String,
    pub tenant_id: Uuid,
}

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            role: self.role,
            tenant_id: self.tenant_id,
            email: self.email.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Sign in required".to_string())))
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned())
    }
}

#[derive(Clone)]
pub struct Authenticator {
    session: SessionTokens,
    legacy: Option<LegacyTokens>,
}

impl Authenticator {
    pub fn new(session: SessionTokens, legacy: Option<LegacyTokens>) -> Self {
        Self { session, legacy }
    }

    pub fn from_config(auth: &AuthConfig) -> Self {
        Self::new(
            SessionTokens::new(&auth.session_secret, auth.session_ttl_hours),
            auth.legacy_jwt_secret.as_deref().map(LegacyTokens::new),
        )
    }

    pub fn sessions(&self) -> &SessionTokens {
        &self.session
    }

    pub fn current_user(&self, headers: &HeaderMap) -> Option<CurrentUser> {
        let cookie = cookie_value(headers, SESSION_COOKIE);
        let bearer = bearer_token(headers);

        [cookie, bearer]
            .into_iter()
            .flatten()
            .find_map(|token| self.resolve(token))
    }

    fn resolve(&self, token: &str) -> Option<CurrentUser> {
        self.session
            .decode(token)
            .or_else(|| self.legacy.as_ref().and_then(|legacy| legacy.decode(token)))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub(crate) fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn authenticator() -> Authenticator {
        Authenticator::new(
            SessionTokens::new(SECRET, 24),
            Some(LegacyTokens::new("legacy-secret-legacy-secret-legacy")),
        )
    }

    fn user(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            role,
            email: "u@example.com".to_string(),
            tenant_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_cookie_session_resolves() {
        let auth = authenticator();
        let user = user(UserRole::Admin);
        let token = auth.sessions().issue(&user).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, token)).unwrap(),
        );
        assert_eq!(auth.current_user(&headers), Some(user));
    }

    #[test]
    fn test_bearer_used_when_cookie_invalid() {
        let auth = authenticator();
        let user = user(UserRole::Student);
        let token = auth.sessions().issue(&user).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}=garbage", SESSION_COOKIE)).unwrap(),
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert_eq!(auth.current_user(&headers), Some(user));
    }

    #[test]
    fn test_no_credentials() {
        assert!(authenticator().current_user(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_legacy_disabled_without_secret() {
        let auth = Authenticator::new(SessionTokens::new(SECRET, 24), None);
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert!(auth.current_user(&headers).is_none());
    }
}
