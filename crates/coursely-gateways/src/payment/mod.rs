//! Payment gateway abstraction
//!
//! Each adapter opens remote orders, verifies client callbacks, issues refunds and
//! normalizes webhook payloads into [`GatewayEvent`]s.

mod cashfree;
mod razorpay;

pub use cashfree::CashfreeGateway;
pub use razorpay::RazorpayGateway;

use async_trait::async_trait;
use coursely_core::models::{PaymentMethod, RefundStatus};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::fmt::Debug;
use uuid::Uuid;

use crate::error::GatewayResult;

/// Remote order to open for an invoice
#[derive(Debug, Clone)]
pub struct OrderRequest {
    /// Invoice number, echoed back by the gateway as the receipt
    pub receipt: String,
    /// Amount including tax, in major units
    pub amount: Decimal,
    pub currency: String,
    pub customer_id: Uuid,
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub order_id: String,
    /// Gateway response as returned, handed to the client to start checkout
    pub raw: JsonValue,
}

#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RefundRequest {
    pub order_id: String,
    /// Gateway payment id recorded at verification
    pub gateway_payment_id: String,
    pub amount: Decimal,
    /// Local refund id, sent as the idempotency reference
    pub refund_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct GatewayRefund {
    pub provider_refund_id: String,
    pub status: RefundStatus,
}

/// Webhook payload normalized across providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    PaymentCaptured {
        order_id: String,
        payment_id: String,
    },
    PaymentFailed {
        order_id: String,
        reason: String,
    },
    RefundProcessed {
        provider_refund_id: String,
    },
    RefundFailed {
        provider_refund_id: String,
    },
    /// Recorded without a state transition
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedWebhook {
    pub event_type: String,
    pub event: GatewayEvent,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + Debug {
    fn method(&self) -> PaymentMethod;

    async fn create_order(&self, request: &OrderRequest) -> GatewayResult<GatewayOrder>;

    /// Confirms the client-reported payment; returns the gateway payment id to store.
    /// A rejected payment is `GatewayError::VerificationFailed`.
    async fn verify_payment(&self, request: &VerificationRequest) -> GatewayResult<String>;

    async fn refund(&self, request: &RefundRequest) -> GatewayResult<GatewayRefund>;

    /// Checks the signature header against the raw request body.
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool;

    fn parse_webhook(&self, payload: &JsonValue) -> GatewayResult<ParsedWebhook>;
}
