//! Gateway callbacks
//!
//! The raw body is handed to the service untouched; signatures are computed over the exact
//! bytes the gateway sent.

use crate::auth::CurrentUser;
use crate::error::HttpAppError;
use crate::handlers::Pagination;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use coursely_core::models::{WebhookAck, WebhookProvider, WebhookRecord};
use std::sync::Arc;

const RAZORPAY_SIGNATURE: &str = "x-razorpay-signature";
const RAZORPAY_EVENT_ID: &str = "x-razorpay-event-id";
const CASHFREE_SIGNATURE: &str = "x-verify";
const CASHFREE_EVENT_ID: &str = "x-webhook-id";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

async fn intake(
    state: &AppState,
    provider: WebhookProvider,
    headers: &HeaderMap,
    body: &[u8],
    signature_header: &str,
    event_id_header: &str,
) -> Result<Json<WebhookAck>, HttpAppError> {
    let ack = state
        .webhooks
        .intake(
            provider,
            body,
            header(headers, signature_header),
            header(headers, event_id_header),
        )
        .await?;
    Ok(Json(ack))
}

#[utoipa::path(
    post,
    path = "/api/webhooks/razorpay",
    tag = "webhooks",
    request_body(content = String, description = "Razorpay event JSON", content_type = "application/json"),
    params(
        ("x-razorpay-signature" = String, Header, description = "HMAC-SHA256 of the body"),
        ("x-razorpay-event-id" = Option<String>, Header, description = "Delivery id used for de-duplication")
    ),
    responses(
        (status = 200, description = "Delivery recorded", body = WebhookAck),
        (status = 400, description = "Unprocessable payload"),
        (status = 401, description = "Signature mismatch"),
        (status = 500, description = "Processing failed; the gateway should retry")
    )
)]
pub async fn razorpay_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    intake(
        &state,
        WebhookProvider::Razorpay,
        &headers,
        &body,
        RAZORPAY_SIGNATURE,
        RAZORPAY_EVENT_ID,
    )
    .await
}

#[utoipa::path(
    post,
    path = "/api/webhooks/cashfree",
    tag = "webhooks",
    request_body(content = String, description = "Cashfree event JSON", content_type = "application/json"),
    params(
        ("x-verify" = String, Header, description = "Base64 HMAC-SHA256 of the body"),
        ("x-webhook-id" = Option<String>, Header, description = "Delivery id used for de-duplication")
    ),
    responses(
        (status = 200, description = "Delivery recorded", body = WebhookAck),
        (status = 400, description = "Unprocessable payload"),
        (status = 401, description = "Signature mismatch"),
        (status = 500, description = "Processing failed; the gateway should retry")
    )
)]
pub async fn cashfree_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    intake(
        &state,
        WebhookProvider::Cashfree,
        &headers,
        &body,
        CASHFREE_SIGNATURE,
        CASHFREE_EVENT_ID,
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/webhooks",
    tag = "webhooks",
    params(Pagination),
    responses(
        (status = 200, description = "Recent deliveries", body = Vec<WebhookRecord>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_webhooks(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (limit, offset) = page.clamped();
    let records = state
        .webhooks
        .list_recent(&user.actor(), limit, offset)
        .await?;
    Ok(Json(records))
}
