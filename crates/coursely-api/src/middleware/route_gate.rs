//! Route gate
//!
//! Runs on every request after rate limiting:
//!
//! 1. Client-supplied `X-User-*` headers are removed.
//! 2. The caller is resolved through [`Authenticator::current_user`] and mirrored into the
//!    local `users` table.
//! 3. The path is classified. Page areas redirect (303) to the matching sign-in page when
//!    the caller is missing or under-privileged; protected API paths answer 401/403 JSON.
//! 4. For an authenticated caller, [`CurrentUser`] goes into the request extensions and
//!    `X-User-ID`, `X-User-Role` and `X-User-Email` are set for downstream handlers.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use coursely_core::models::UserRole;
use coursely_core::AppError;
use coursely_services::IdentitySync;
use std::sync::Arc;

use crate::auth::{Authenticator, CurrentUser};
use crate::error::HttpAppError;
use crate::middleware::audit;
use crate::utils::ip_extraction::client_ip;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

const ADMIN_SIGN_IN: &str = "/admin/sign-in";
const INSTRUCTOR_SIGN_IN: &str = "/instructor/sign-in";
const SIGN_IN: &str = "/sign-in";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Page {
        required: UserRole,
        sign_in: &'static str,
    },
    Api {
        required: UserRole,
    },
}

/// Access rule for a request. Handlers still enforce ownership and finer role rules.
pub fn classify(method: &Method, path: &str) -> Access {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        ["admin", "sign-in"] | ["instructor", "sign-in"] | ["sign-in"] => Access::Public,
        ["admin", ..] => Access::Page {
            required: UserRole::Admin,
            sign_in: ADMIN_SIGN_IN,
        },
        ["instructor", ..] => Access::Page {
            required: UserRole::Instructor,
            sign_in: INSTRUCTOR_SIGN_IN,
        },
        ["dashboard", ..] => Access::Page {
            required: UserRole::Student,
            sign_in: SIGN_IN,
        },
        ["api", rest @ ..] => classify_api(method, rest),
        _ => Access::Public,
    }
}

fn classify_api(method: &Method, rest: &[&str]) -> Access {
    let public = match (method, rest) {
        (_, ["openapi.json"]) => true,
        (&Method::POST, ["webhooks", "razorpay" | "cashfree"]) => true,
        (&Method::GET, ["certificates", "verify", _]) => true,
        (&Method::GET, ["courses"]) => true,
        (&Method::GET, ["courses", id]) => *id != "mine",
        (&Method::GET, ["subscriptions", "plans"]) => true,
        (&Method::GET, ["tenants", "by-slug", _]) => true,
        (&Method::GET, ["tenants", _, "settings"]) => true,
        (&Method::GET, ["tenants", _, "pages", _]) => true,
        (&Method::DELETE, ["auth", "session"]) => true,
        _ => false,
    };
    if public {
        return Access::Public;
    }

    let required = match rest {
        ["analytics", ..] => UserRole::Instructor,
        ["white-label", ..] | ["tenants"] | ["webhooks"] => UserRole::Admin,
        _ => UserRole::Student,
    };
    Access::Api { required }
}

#[derive(Clone)]
pub struct GateState {
    pub authenticator: Authenticator,
    pub identity: Arc<IdentitySync>,
    pub trusted_proxy_count: usize,
}

fn strip_identity_headers(headers: &mut HeaderMap) {
    for name in [USER_ID_HEADER, USER_ROLE_HEADER, USER_EMAIL_HEADER] {
        headers.remove(name);
    }
}

fn inject_identity_headers(headers: &mut HeaderMap, user: &CurrentUser) {
    if let Ok(value) = HeaderValue::from_str(&user.id.to_string()) {
        headers.insert(USER_ID_HEADER, value);
    }
    headers.insert(USER_ROLE_HEADER, HeaderValue::from_static(user.role.as_str()));
    if let Ok(value) = HeaderValue::from_str(&user.email) {
        headers.insert(USER_EMAIL_HEADER, value);
    }
}

fn sign_in_redirect(sign_in: &str, request: &Request) -> Response {
    let callback = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let location = format!("{}?callbackUrl={}", sign_in, urlencoding::encode(callback));
    Redirect::to(&location).into_response()
}

fn has_credentials(headers: &HeaderMap) -> bool {
    headers.contains_key(header::AUTHORIZATION) || headers.contains_key(header::COOKIE)
}

pub async fn route_gate_middleware(
    State(gate): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    strip_identity_headers(request.headers_mut());

    let access = classify(request.method(), request.uri().path());
    let user = gate.authenticator.current_user(request.headers());

    if let Some(user) = &user {
        match gate.identity.ensure(&user.actor()).await {
            Ok(true) => audit::log_authentication_success(
                user.id,
                user.tenant_id,
                &client_ip(&request, gate.trusted_proxy_count),
            ),
            Ok(false) => {}
            Err(e) => return HttpAppError(e).into_response(),
        }
    }

    match (access, &user) {
        (Access::Public, _) => {}
        (Access::Page { required, .. }, Some(u)) if u.role.at_least(required) => {}
        (Access::Page { required, sign_in }, u) => {
            if let Some(u) = u {
                audit::log_access_denied(u.id, u.tenant_id, request.uri().path(), required.as_str());
            }
            return sign_in_redirect(sign_in, &request);
        }
        (Access::Api { required }, Some(u)) => {
            if !u.role.at_least(required) {
                audit::log_access_denied(u.id, u.tenant_id, request.uri().path(), required.as_str());
                return HttpAppError(AppError::Forbidden(format!(
                    "This endpoint requires the {} role",
                    required
                )))
                .into_response();
            }
        }
        (Access::Api { .. }, None) => {
            audit::log_authentication_failure(
                &client_ip(&request, gate.trusted_proxy_count),
                request.uri().path(),
                has_credentials(request.headers()),
            );
            return HttpAppError(AppError::Unauthorized("Sign in required".to_string()))
                .into_response();
        }
    }

    if let Some(user) = user {
        inject_identity_headers(request.headers_mut(), &user);
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}
