//! Role areas
//!
//! `/dashboard`, `/instructor` and `/admin` answer with the JSON summary the matching
//! front-end area renders. The route gate has already redirected anyone who may not see
//! them. The sign-in pages only echo where to go next.

use crate::auth::CurrentUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use coursely_core::models::AnalyticsQuery;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let actor = user.actor();
    let (enrollments, certificates, subscriptions) = tokio::try_join!(
        state.enrollments.list_mine(&actor),
        state.certificates.list_mine(&actor),
        state.subscriptions.list_mine(&actor),
    )?;

    Ok(Json(json!({
        "user": { "id": user.id, "email": user.email, "role": user.role },
        "enrollments": enrollments,
        "certificates": certificates,
        "subscriptions": subscriptions,
    })))
}

pub async fn instructor(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let actor = user.actor();
    let query = AnalyticsQuery::default();
    let (courses, overview) = tokio::try_join!(
        state.courses.list_mine(&actor),
        state.analytics.overview(&actor, &query),
    )?;

    Ok(Json(json!({
        "user": { "id": user.id, "email": user.email, "role": user.role },
        "courses": courses,
        "overview": overview,
    })))
}

pub async fn admin(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<impl IntoResponse, HttpAppError> {
    let actor = user.actor();
    let query = AnalyticsQuery {
        tenant_id: Some(user.tenant_id),
        ..AnalyticsQuery::default()
    };
    let (overview, revenue, webhooks) = tokio::try_join!(
        state.analytics.overview(&actor, &query),
        state.analytics.revenue(&actor, &query),
        state.webhooks.list_recent(&actor, 10, 0),
    )?;

    Ok(Json(json!({
        "user": { "id": user.id, "email": user.email, "role": user.role },
        "overview": overview,
        "revenue": revenue,
        "recentWebhooks": webhooks,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInQuery {
    pub callback_url: Option<String>,
}

/// Only same-origin paths are echoed back as the post-sign-in target.
fn safe_callback(callback: Option<String>) -> String {
    callback
        .filter(|c| c.starts_with('/') && !c.starts_with("//"))
        .unwrap_or_else(|| "/dashboard".to_string())
}

pub async fn sign_in(Query(query): Query<SignInQuery>) -> impl IntoResponse {
    Json(json!({
        "signIn": "POST /api/auth/session with Authorization: Bearer <token>",
        "callbackUrl": safe_callback(query.callback_url),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_must_be_local_path() {
        assert_eq!(safe_callback(Some("/admin/users".into())), "/admin/users");
        assert_eq!(safe_callback(Some("https://evil.example".into())), "/dashboard");
        assert_eq!(safe_callback(Some("//evil.example".into())), "/dashboard");
        assert_eq!(safe_callback(None), "/dashboard");
    }
}
