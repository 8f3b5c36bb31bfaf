//! Session cookie management
//!
//! A caller who already holds a valid token (for instance a legacy provider token sent as
//! `Authorization: Bearer`) can exchange it for a first-party `coursely_session` cookie.

use crate::auth::CurrentUser;
use crate::error::HttpAppError;
use crate::middleware::audit;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use coursely_core::constants::SESSION_COOKIE;
use coursely_core::models::UserRole;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub tenant_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

fn session_cookie(value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, value, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn with_cookie(mut response: Response, cookie: String) -> Result<Response, HttpAppError> {
    let value = HeaderValue::from_str(&cookie).map_err(|e| {
        HttpAppError(coursely_core::AppError::Internal(format!(
            "Invalid session cookie: {}",
            e
        )))
    })?;
    response.headers_mut().insert(header::SET_COOKIE, value);
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "Session cookie set", body = SessionResponse),
        (status = 401, description = "No valid token presented")
    )
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Response, HttpAppError> {
    let sessions = state.authenticator.sessions();
    let token = sessions.issue(&user)?;
    let ttl = sessions.ttl();

    audit::log_session_change(user.id, user.tenant_id, true);

    let body = SessionResponse {
        user_id: user.id,
        email: user.email,
        role: user.role,
        tenant_id: user.tenant_id,
        expires_at: Utc::now() + ttl,
    };
    let cookie = session_cookie(&token, ttl.num_seconds(), state.config.is_production());
    with_cookie(Json(body).into_response(), cookie)
}

/// Always succeeds, signed in or not.
#[utoipa::path(
    delete,
    path = "/api/auth/session",
    tag = "auth",
    responses(
        (status = 204, description = "Session cookie cleared")
    )
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    user: Option<CurrentUser>,
) -> Result<Response, HttpAppError> {
    if let Some(user) = user {
        audit::log_session_change(user.id, user.tenant_id, false);
    }
    let cookie = session_cookie("", 0, state.config.is_production());
    with_cookie(StatusCode::NO_CONTENT.into_response(), cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("abc", 3600, true);
        assert!(cookie.starts_with("coursely_session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));

        assert!(!session_cookie("", 0, false).contains("Secure"));
    }
}
