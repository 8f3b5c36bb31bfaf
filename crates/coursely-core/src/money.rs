//! Money arithmetic: tax, invoice totals, refund aggregation and invoice numbering.
//!
//! All amounts are `Decimal` with two fractional digits; rounding is half away from zero.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::AppError;
use crate::models::PaymentStatus;

/// Fixed tax rate applied to every order (18%).
pub const TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

const INVOICE_PREFIX: &str = "INV";

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Subtotal, tax and total of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

impl InvoiceTotals {
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let subtotal = round_money(subtotal);
        let tax_amount = round_money(subtotal * TAX_RATE);
        Self {
            subtotal,
            tax_amount,
            total_amount: subtotal + tax_amount,
        }
    }
}

/// Payment status implied by the cumulative refunded amount.
///
/// Returns `None` when nothing has been refunded, in which case the payment keeps its
/// current status.
pub fn derive_refund_status(amount: Decimal, refunded: Decimal) -> Option<PaymentStatus> {
    if refunded <= Decimal::ZERO {
        None
    } else if refunded >= amount {
        Some(PaymentStatus::Refunded)
    } else {
        Some(PaymentStatus::PartiallyRefunded)
    }
}

/// Status of a payment after its refunded total changes.
///
/// When every refund has failed, a previously refunded payment falls back to `completed`.
pub fn payment_status_after_refunds(
    current: PaymentStatus,
    amount: Decimal,
    refunded: Decimal,
) -> PaymentStatus {
    match derive_refund_status(amount, refunded) {
        Some(status) => status,
        None if matches!(
            current,
            PaymentStatus::PartiallyRefunded | PaymentStatus::Refunded
        ) =>
        {
            PaymentStatus::Completed
        }
        None => current,
    }
}

/// Month prefix for invoice numbers, e.g. `INV-202403`.
pub fn invoice_prefix(now: DateTime<Utc>) -> String {
    format!("{}-{:04}{:02}", INVOICE_PREFIX, now.year(), now.month())
}

/// Next invoice number for `prefix` given the highest number already issued under it.
pub fn next_invoice_number(prefix: &str, latest: Option<&str>) -> String {
    let next = latest
        .and_then(|n| n.strip_prefix(prefix))
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|seq| seq.parse::<u32>().ok())
        .map(|seq| seq + 1)
        .unwrap_or(1);
    format!("{}-{:04}", prefix, next)
}

/// Converts a major-unit amount to integer minor units (paise, cents).
pub fn to_minor_units(amount: Decimal) -> Result<i64, AppError> {
    let minor = round_money(amount) * Decimal::ONE_HUNDRED;
    i64::try_from(minor.trunc())
        .map_err(|_| AppError::InvalidInput(format!("Amount {} is out of range", amount)))
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}
