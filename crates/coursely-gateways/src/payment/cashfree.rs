use async_trait::async_trait;
use coursely_core::config::CashfreeConfig;
use coursely_core::models::{PaymentMethod, RefundStatus};
use reqwest::{Client, RequestBuilder};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use uuid::Uuid;

use super::{
    GatewayEvent, GatewayOrder, GatewayRefund, OrderRequest, ParsedWebhook,
    PaymentGateway, RefundRequest, VerificationRequest,
};
use crate::error::{GatewayError, GatewayResult};
use crate::http::{build_client, id_at, json as parse_json, str_at, transport};
use crate::signature::{constant_time_eq, hmac_sha256_base64};

const PROVIDER: &str = "cashfree";

/// Cashfree PG API. Amounts are sent as decimal rupees.
pub struct CashfreeGateway {
    http_client: Client,
    config: CashfreeConfig,
}

impl Debug for CashfreeGateway {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CashfreeGateway")
            .field("app_id", &self.config.app_id)
            .field("api_base", &self.config.api_base)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct OrderStatusResponse {
    order_status: String,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    cf_refund_id: JsonValue,
    refund_status: String,
}

impl CashfreeGateway {
    pub fn new(config: CashfreeConfig, timeout: Duration) -> GatewayResult<Self> {
        Ok(Self {
            http_client: build_client(PROVIDER, timeout)?,
            config,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("x-client-id", &self.config.app_id)
            .header("x-client-secret", &self.config.secret_key)
            .header("x-api-version", &self.config.api_version)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// Cashfree expects JSON numbers, not decimal strings.
    fn rupees(amount: Decimal) -> GatewayResult<f64> {
        amount
            .round_dp(2)
            .to_f64()
            .ok_or_else(|| GatewayError::InvalidRequest(format!("Amount {} is out of range", amount)))
    }

    fn refund_status(status: &str) -> RefundStatus {
        match status {
            "SUCCESS" => RefundStatus::Succeeded,
            "CANCELLED" | "FAILED" => RefundStatus::Failed,
            _ => RefundStatus::Pending,
        }
    }
}

#[async_trait]
impl PaymentGateway for CashfreeGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Cashfree
    }

    #[tracing::instrument(skip(self, request), fields(receipt = %request.receipt))]
    async fn create_order(&self, request: &OrderRequest) -> GatewayResult<GatewayOrder> {
        // Cashfree takes the merchant's order id; generate one that is unique per attempt.
        let order_id = format!("order_{}", Uuid::new_v4().simple());

        let mut customer = json!({ "customer_id": request.customer_id.to_string() });
        if let Some(email) = &request.customer_email {
            customer["customer_email"] = json!(email);
        }

        let body = json!({
            "order_id": order_id,
            "order_amount": Self::rupees(request.amount)?,
            "order_currency": request.currency,
            "order_note": request.receipt,
            "customer_details": customer,
        });

        let response = self
            .authorized(self.http_client.post(self.url("/pg/orders")))
            .json(&body)
            .send()
            .await
            .map_err(transport(PROVIDER))?;

        let raw: JsonValue = parse_json(PROVIDER, response).await?;
        let order_id = str_at(&raw, "/order_id").unwrap_or(&order_id).to_string();

        tracing::info!(order_id = %order_id, amount = %request.amount, "Cashfree order created");
        Ok(GatewayOrder { order_id, raw })
    }

    async fn verify_payment(&self, request: &VerificationRequest) -> GatewayResult<String> {
        let response = self
            .authorized(self.http_client.get(self.url(&format!(
                "/pg/orders/{}",
                urlencoding::encode(&request.order_id)
            ))))
            .send()
            .await
            .map_err(transport(PROVIDER))?;

        let order: OrderStatusResponse = parse_json(PROVIDER, response).await?;
        if order.order_status != "PAID" {
            return Err(GatewayError::VerificationFailed(format!(
                "Order status is {}",
                order.order_status
            )));
        }

        Ok(request.payment_id.clone())
    }

    #[tracing::instrument(skip(self, request), fields(refund_id = %request.refund_id))]
    async fn refund(&self, request: &RefundRequest) -> GatewayResult<GatewayRefund> {
        let refund_amount = Self::rupees(request.amount)?;
        let response = self
            .authorized(self.http_client.post(self.url(&format!(
                "/pg/orders/{}/refunds",
                urlencoding::encode(&request.order_id)
            ))))
            .json(&json!({
                "refund_amount": refund_amount,
                "refund_id": request.refund_id.simple().to_string(),
                "refund_note": request.reason,
            }))
            .send()
            .await
            .map_err(transport(PROVIDER))?;

        let refund: RefundResponse = parse_json(PROVIDER, response).await?;
        let provider_refund_id = match refund.cf_refund_id {
            JsonValue::String(s) => s,
            JsonValue::Number(n) => n.to_string(),
            _ => {
                return Err(GatewayError::invalid_response(
                    PROVIDER,
                    "cf_refund_id missing",
                ))
            }
        };

        Ok(GatewayRefund {
            provider_refund_id,
            status: Self::refund_status(&refund.refund_status),
        })
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        let Some(secret) = self.config.webhook_secret.as_deref() else {
            tracing::warn!("CASHFREE_WEBHOOK_SECRET not set; rejecting webhook");
            return false;
        };
        constant_time_eq(&hmac_sha256_base64(secret, payload), signature.trim())
    }

    fn parse_webhook(&self, payload: &JsonValue) -> GatewayResult<ParsedWebhook> {
        let event_type = str_at(payload, "/type")
            .ok_or_else(|| GatewayError::invalid_response(PROVIDER, "webhook type missing"))?
            .to_string();

        let missing = |field: &str| {
            GatewayError::invalid_response(PROVIDER, format!("{} missing in {}", field, event_type))
        };

        let event = match event_type.as_str() {
            "PAYMENT_SUCCESS_WEBHOOK" => GatewayEvent::PaymentCaptured {
                order_id: id_at(payload, "/data/order/order_id")
                    .ok_or_else(|| missing("order id"))?,
                payment_id: id_at(payload, "/data/payment/cf_payment_id")
                    .ok_or_else(|| missing("payment id"))?,
            },
            "PAYMENT_FAILED_WEBHOOK" | "PAYMENT_USER_DROPPED_WEBHOOK" => {
                GatewayEvent::PaymentFailed {
                    order_id: id_at(payload, "/data/order/order_id")
                        .ok_or_else(|| missing("order id"))?,
                    reason: str_at(payload, "/data/payment/payment_message")
                        .unwrap_or("Payment failed")
                        .to_string(),
                }
            }
            "REFUND_STATUS_WEBHOOK" => {
                let provider_refund_id = id_at(payload, "/data/refund/cf_refund_id")
                    .ok_or_else(|| missing("refund id"))?;
                match Self::refund_status(str_at(payload, "/data/refund/refund_status").unwrap_or("")) {
                    RefundStatus::Succeeded => GatewayEvent::RefundProcessed { provider_refund_id },
                    RefundStatus::Failed => GatewayEvent::RefundFailed { provider_refund_id },
                    RefundStatus::Pending => GatewayEvent::Ignored,
                }
            }
            _ => GatewayEvent::Ignored,
        };

        Ok(ParsedWebhook { event_type, event })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(api_base: String) -> CashfreeGateway {
        CashfreeGateway::new(
            CashfreeConfig {
                app_id: "cf_app".to_string(),
                secret_key: "cf_secret".to_string(),
                webhook_secret: Some("cf_whsec".to_string()),
                api_base,
                api_version: "2023-08-01".to_string(),
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_order_sends_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/pg/orders")
            .match_header("x-client-id", "cf_app")
            .match_header("x-api-version", "2023-08-01")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"order_id":"order_cf1","payment_session_id":"session_1","order_status":"ACTIVE"}"#)
            .create_async()
            .await;

        let order = gateway(server.url())
            .create_order(&OrderRequest {
                receipt: "INV-202403-0001".to_string(),
                amount: Decimal::new(118000, 2),
                currency: "INR".to_string(),
                customer_id: Uuid::new_v4(),
                customer_email: Some("learner@example.com".to_string()),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(order.order_id, "order_cf1");
        assert_eq!(order.raw["payment_session_id"], "session_1");
    }

    #[tokio::test]
    async fn test_verify_requires_paid_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/pg/orders/order_paid")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"order_id":"order_paid","order_status":"PAID"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/pg/orders/order_active")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"order_id":"order_active","order_status":"ACTIVE"}"#)
            .create_async()
            .await;

        let gateway = gateway(server.url());
        let paid = gateway
            .verify_payment(&VerificationRequest {
                order_id: "order_paid".to_string(),
                payment_id: "cf_pay_1".to_string(),
                signature: None,
            })
            .await
            .unwrap();
        assert_eq!(paid, "cf_pay_1");

        let err = gateway
            .verify_payment(&VerificationRequest {
                order_id: "order_active".to_string(),
                payment_id: "cf_pay_2".to_string(),
                signature: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::VerificationFailed(_)));
    }

    #[test]
    fn test_webhook_signature_is_base64() {
        let gateway = gateway("http://unused".to_string());
        let body = br#"{"type":"PAYMENT_SUCCESS_WEBHOOK"}"#;
        let signature = hmac_sha256_base64("cf_whsec", body);

        assert!(gateway.verify_webhook_signature(body, &signature));
        assert!(!gateway.verify_webhook_signature(body, &hmac_sha256_base64("other", body)));
    }

    #[test]
    fn test_parse_refund_webhook_by_status() {
        let gateway = gateway("http://unused".to_string());

        let success = gateway
            .parse_webhook(&json!({
                "type": "REFUND_STATUS_WEBHOOK",
                "data": { "refund": { "cf_refund_id": 7788, "refund_status": "SUCCESS" } }
            }))
            .unwrap();
        assert_eq!(
            success.event,
            GatewayEvent::RefundProcessed {
                provider_refund_id: "7788".to_string()
            }
        );

        let pending = gateway
            .parse_webhook(&json!({
                "type": "REFUND_STATUS_WEBHOOK",
                "data": { "refund": { "cf_refund_id": "7789", "refund_status": "PENDING" } }
            }))
            .unwrap();
        assert_eq!(pending.event, GatewayEvent::Ignored);
    }

    #[test]
    fn test_parse_dropped_payment_as_failure() {
        let gateway = gateway("http://unused".to_string());
        let parsed = gateway
            .parse_webhook(&json!({
                "type": "PAYMENT_USER_DROPPED_WEBHOOK",
                "data": { "order": { "order_id": "order_x" }, "payment": {} }
            }))
            .unwrap();
        assert_eq!(
            parsed.event,
            GatewayEvent::PaymentFailed {
                order_id: "order_x".to_string(),
                reason: "Payment failed".to_string()
            }
        );
    }
}
