use async_trait::async_trait;
use coursely_core::config::RazorpayConfig;
use coursely_core::models::{PaymentMethod, RefundStatus};
use coursely_core::money::to_minor_units;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use super::{
    GatewayEvent, GatewayOrder, GatewayRefund, OrderRequest, ParsedWebhook,
    PaymentGateway, RefundRequest, VerificationRequest,
};
use crate::error::{GatewayError, GatewayResult};
use crate::http::{build_client, id_at, json as parse_json, str_at, transport};
use crate::signature::{constant_time_eq, hmac_sha256_hex};

const PROVIDER: &str = "razorpay";

/// Razorpay Orders/Payments API. Amounts are sent in paise.
pub struct RazorpayGateway {
    http_client: Client,
    config: RazorpayConfig,
}

impl Debug for RazorpayGateway {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RazorpayGateway")
            .field("key_id", &self.config.key_id)
            .field("api_base", &self.config.api_base)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    id: String,
    status: String,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig, timeout: Duration) -> GatewayResult<Self> {
        Ok(Self {
            http_client: build_client(PROVIDER, timeout)?,
            config,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// `hex(HMAC-SHA256(key_secret, "{order_id}|{payment_id}"))`
    pub fn expected_signature(&self, order_id: &str, payment_id: &str) -> String {
        hmac_sha256_hex(
            &self.config.key_secret,
            format!("{}|{}", order_id, payment_id).as_bytes(),
        )
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Razorpay
    }

    #[tracing::instrument(skip(self, request), fields(receipt = %request.receipt))]
    async fn create_order(&self, request: &OrderRequest) -> GatewayResult<GatewayOrder> {
        let amount = to_minor_units(request.amount)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        let body = json!({
            "amount": amount,
            "currency": request.currency,
            "receipt": request.receipt,
            "notes": {
                "customer_id": request.customer_id.to_string(),
            },
        });

        let response = self
            .http_client
            .post(self.url("/v1/orders"))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(transport(PROVIDER))?;

        let raw: JsonValue = parse_json(PROVIDER, response).await?;
        let order_id = str_at(&raw, "/id")
            .ok_or_else(|| GatewayError::invalid_response(PROVIDER, "order id missing"))?
            .to_string();

        tracing::info!(order_id = %order_id, amount_paise = amount, "Razorpay order created");
        Ok(GatewayOrder { order_id, raw })
    }

    async fn verify_payment(&self, request: &VerificationRequest) -> GatewayResult<String> {
        let signature = request
            .signature
            .as_deref()
            .ok_or_else(|| GatewayError::VerificationFailed("Missing payment signature".into()))?;

        let expected = self.expected_signature(&request.order_id, &request.payment_id);
        if !constant_time_eq(&expected, signature) {
            return Err(GatewayError::VerificationFailed(
                "Invalid payment signature".into(),
            ));
        }

        Ok(request.payment_id.clone())
    }

    #[tracing::instrument(skip(self, request), fields(refund_id = %request.refund_id))]
    async fn refund(&self, request: &RefundRequest) -> GatewayResult<GatewayRefund> {
        let amount = to_minor_units(request.amount)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        let response = self
            .http_client
            .post(self.url(&format!(
                "/v1/payments/{}/refund",
                urlencoding::encode(&request.gateway_payment_id)
            )))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&json!({
                "amount": amount,
                "receipt": request.refund_id.to_string(),
                "notes": { "reason": request.reason },
            }))
            .send()
            .await
            .map_err(transport(PROVIDER))?;

        let refund: RefundResponse = parse_json(PROVIDER, response).await?;
        let status = match refund.status.as_str() {
            "processed" => RefundStatus::Succeeded,
            "failed" => RefundStatus::Failed,
            _ => RefundStatus::Pending,
        };

        Ok(GatewayRefund {
            provider_refund_id: refund.id,
            status,
        })
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        let Some(secret) = self.config.webhook_secret.as_deref() else {
            tracing::warn!("RAZORPAY_WEBHOOK_SECRET not set; rejecting webhook");
            return false;
        };
        constant_time_eq(&hmac_sha256_hex(secret, payload), signature.trim())
    }

    fn parse_webhook(&self, payload: &JsonValue) -> GatewayResult<ParsedWebhook> {
        let event_type = str_at(payload, "/event")
            .ok_or_else(|| GatewayError::invalid_response(PROVIDER, "webhook event missing"))?
            .to_string();

        let missing = |field: &str| {
            GatewayError::invalid_response(PROVIDER, format!("{} missing in {}", field, event_type))
        };

        let event = match event_type.as_str() {
            "payment.captured" | "order.paid" => GatewayEvent::PaymentCaptured {
                order_id: id_at(payload, "/payload/payment/entity/order_id")
                    .or_else(|| id_at(payload, "/payload/order/entity/id"))
                    .ok_or_else(|| missing("order id"))?,
                payment_id: id_at(payload, "/payload/payment/entity/id")
                    .ok_or_else(|| missing("payment id"))?,
            },
            "payment.failed" => GatewayEvent::PaymentFailed {
                order_id: id_at(payload, "/payload/payment/entity/order_id")
                    .ok_or_else(|| missing("order id"))?,
                reason: str_at(payload, "/payload/payment/entity/error_description")
                    .unwrap_or("Payment failed")
                    .to_string(),
            },
            "refund.processed" => GatewayEvent::RefundProcessed {
                provider_refund_id: id_at(payload, "/payload/refund/entity/id")
                    .ok_or_else(|| missing("refund id"))?,
            },
            "refund.failed" => GatewayEvent::RefundFailed {
                provider_refund_id: id_at(payload, "/payload/refund/entity/id")
                    .ok_or_else(|| missing("refund id"))?,
            },
            _ => GatewayEvent::Ignored,
        };

        Ok(ParsedWebhook { event_type, event })
    }
}
