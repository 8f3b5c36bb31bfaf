use crate::auth::CurrentUser;
use crate::error::HttpAppError;
use crate::handlers::Pagination;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use coursely_core::models::Invoice;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "payments",
    params(Pagination),
    responses(
        (status = 200, description = "Caller's invoices", body = Vec<Invoice>)
    )
)]
pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (limit, offset) = page.clamped();
    let invoices = state
        .payments
        .list_invoices(&user.actor(), limit, offset)
        .await?;
    Ok(Json(invoices))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "payments",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice", body = Invoice),
        (status = 404, description = "Invoice not found")
    )
)]
pub async fn get_invoice(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let invoice = state.payments.get_invoice(&user.actor(), id).await?;
    Ok(Json(invoice))
}
