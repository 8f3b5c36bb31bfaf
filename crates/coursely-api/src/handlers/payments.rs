use crate::auth::CurrentUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::handlers::Pagination;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use coursely_core::models::{
    CreateOrderRequest, CreateOrderResponse, CreateRefundRequest, Payment, Refund,
    RefundResponse, VerifyPaymentRequest, VerifyPaymentResponse,
};
use std::sync::Arc;
use uuid::Uuid;

/// Opens a gateway order for the caller.
///
/// Writes a draft invoice (subtotal, 18% tax, total), creates the remote order for the
/// total and records a pending payment. Nothing is left behind if the gateway call fails.
#[utoipa::path(
    post,
    path = "/api/payments/orders",
    tag = "payments",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = CreateOrderResponse),
        (status = 400, description = "Invalid amount, currency or subject"),
        (status = 502, description = "Payment gateway error")
    )
)]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state.payments.create_order(&user.actor(), request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/payments/verify",
    tag = "payments",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified and completed", body = VerifyPaymentResponse),
        (status = 400, description = "Signature mismatch; payment stays pending"),
        (status = 404, description = "No payment for this order")
    )
)]
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state.payments.verify(&user.actor(), request).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "payments",
    params(Pagination),
    responses(
        (status = 200, description = "Caller's payments, newest first", body = Vec<Payment>)
    )
)]
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (limit, offset) = page.clamped();
    let payments = state
        .payments
        .list_payments(&user.actor(), limit, offset)
        .await?;
    Ok(Json(payments))
}

#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    tag = "payments",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment", body = Payment),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let payment = state.payments.get_payment(&user.actor(), id).await?;
    Ok(Json(payment))
}

/// Admin only. The refund amount may not exceed what is left to refund.
#[utoipa::path(
    post,
    path = "/api/payments/{id}/refunds",
    tag = "payments",
    params(("id" = Uuid, Path, description = "Payment ID")),
    request_body = CreateRefundRequest,
    responses(
        (status = 201, description = "Refund recorded", body = RefundResponse),
        (status = 400, description = "Amount exceeds refundable balance"),
        (status = 403, description = "Admin role required"),
        (status = 412, description = "Payment is not completed")
    )
)]
pub async fn create_refund(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateRefundRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let response = state.payments.refund(&user.actor(), id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/payments/{id}/refunds",
    tag = "payments",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Refunds for the payment", body = Vec<Refund>)
    )
)]
pub async fn list_refunds(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let refunds = state.payments.list_refunds(&user.actor(), id).await?;
    Ok(Json(refunds))
}
