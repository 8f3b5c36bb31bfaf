//! Gateway webhook intake
//!
//! Every delivery is persisted before anything else happens, including deliveries with a
//! bad signature or an unreadable body, so the audit trail is complete. Only verified
//! deliveries mutate payments or refunds.

use coursely_core::models::{
    NewWebhookRecord, RefundStatus, UserRole, WebhookAck, WebhookProvider, WebhookRecord,
};
use coursely_core::AppError;
use coursely_db::{PaymentRepositoryTrait, RefundRepositoryTrait, WebhookRecordRepositoryTrait};
use coursely_gateways::{GatewayEvent, GatewayRegistry};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

use crate::actor::Actor;

#[derive(Clone)]
pub struct WebhookService {
    records: Arc<dyn WebhookRecordRepositoryTrait>,
    payments: Arc<dyn PaymentRepositoryTrait>,
    refunds: Arc<dyn RefundRepositoryTrait>,
    gateways: GatewayRegistry,
}

impl WebhookService {
    pub fn new(
        records: Arc<dyn WebhookRecordRepositoryTrait>,
        payments: Arc<dyn PaymentRepositoryTrait>,
        refunds: Arc<dyn RefundRepositoryTrait>,
        gateways: GatewayRegistry,
    ) -> Self {
        Self {
            records,
            payments,
            refunds,
            gateways,
        }
    }

    /// Records and applies one delivery.
    ///
    /// Errors map onto the answer the gateway sees: `Unauthorized` for a bad signature,
    /// `InvalidInput` for a body that can never be processed, and `Internal` for anything
    /// worth retrying.
    #[tracing::instrument(skip(self, body, signature), fields(provider = %provider, event_id = ?event_id))]
    pub async fn intake(
        &self,
        provider: WebhookProvider,
        body: &[u8],
        signature: Option<&str>,
        event_id: Option<&str>,
    ) -> Result<WebhookAck, AppError> {
        let gateway = self.gateways.payment(provider.into());
        let signature_verified = match (&gateway, signature) {
            (Ok(gateway), Some(s)) => gateway.verify_webhook_signature(body, s),
            _ => false,
        };

        let (payload, parsed) = match serde_json::from_slice::<JsonValue>(body) {
            Ok(payload) => {
                let parsed = gateway.as_ref().ok().map(|g| g.parse_webhook(&payload));
                (payload, parsed)
            }
            Err(_) => (json!({ "raw": String::from_utf8_lossy(body) }), None),
        };
        let event_type = match &parsed {
            Some(Ok(p)) => p.event_type.clone(),
            _ => "unknown".to_string(),
        };

        let record = self
            .records
            .insert(NewWebhookRecord {
                provider,
                event_type: event_type.clone(),
                event_id: event_id.map(str::to_string),
                payload,
                signature_verified,
            })
            .await?;

        if let Err(e) = gateway {
            tracing::warn!(provider = %provider, record_id = %record.id, "Webhook for an unconfigured provider");
            self.fail(&record, &e.to_string()).await;
            return Err(e.into());
        }

        if !signature_verified {
            tracing::warn!(
                target: "audit",
                event = "webhook.signature_rejected",
                provider = %provider,
                record_id = %record.id,
                signature_present = signature.is_some(),
                "Webhook signature verification failed"
            );
            self.fail(&record, "Invalid webhook signature").await;
            return Err(AppError::Unauthorized("Invalid webhook signature".to_string()));
        }

        let parsed = match parsed {
            Some(Ok(parsed)) => parsed,
            Some(Err(e)) => {
                self.fail(&record, &e.to_string()).await;
                return Err(AppError::InvalidInput(e.to_string()));
            }
            None => {
                self.fail(&record, "Payload is not valid JSON").await;
                return Err(AppError::InvalidInput(
                    "Webhook payload is not valid JSON".to_string(),
                ));
            }
        };

        if let Some(event_id) = event_id {
            if let Some(original) = self
                .records
                .find_processed_duplicate(provider, event_id, record.id)
                .await?
            {
                tracing::info!(
                    record_id = %record.id,
                    original_id = %original.id,
                    "Duplicate webhook delivery; not re-applied"
                );
                self.records.mark_processed(record.id).await?;
                return Ok(WebhookAck {
                    received: true,
                    duplicate: true,
                    record_id: record.id,
                });
            }
        }

        if let Err(e) = self.apply(parsed.event).await {
            tracing::error!(error = %e, record_id = %record.id, event_type = %event_type, "Webhook processing failed");
            self.fail(&record, &e.to_string()).await;
            return Err(AppError::Internal(format!(
                "Webhook processing failed: {}",
                e
            )));
        }

        self.records.mark_processed(record.id).await?;
        tracing::info!(record_id = %record.id, event_type = %event_type, "Webhook processed");

        Ok(WebhookAck {
            received: true,
            duplicate: false,
            record_id: record.id,
        })
    }

    async fn apply(&self, event: GatewayEvent) -> Result<(), AppError> {
        match event {
            GatewayEvent::PaymentCaptured {
                order_id,
                payment_id,
            } => {
                let payment = self
                    .payments
                    .find_by_order_id(&order_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("No payment for order {}", order_id)))?;
                self.payments.complete(payment.id, &payment_id).await?;
            }
            GatewayEvent::PaymentFailed { order_id, reason } => {
                let payment = self
                    .payments
                    .find_by_order_id(&order_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("No payment for order {}", order_id)))?;
                if self.payments.mark_failed(payment.id, &reason).await?.is_none() {
                    tracing::debug!(payment_id = %payment.id, status = %payment.status, "Failure event for a payment that is no longer pending");
                }
            }
            GatewayEvent::RefundProcessed { provider_refund_id } => {
                self.set_refund_status(&provider_refund_id, RefundStatus::Succeeded)
                    .await?;
            }
            GatewayEvent::RefundFailed { provider_refund_id } => {
                self.set_refund_status(&provider_refund_id, RefundStatus::Failed)
                    .await?;
            }
            GatewayEvent::Ignored => {}
        }
        Ok(())
    }

    async fn set_refund_status(
        &self,
        provider_refund_id: &str,
        status: RefundStatus,
    ) -> Result<(), AppError> {
        match self
            .refunds
            .set_status_by_provider_id(provider_refund_id, status)
            .await?
        {
            Some((refund, payment)) => {
                tracing::info!(
                    refund_id = %refund.id,
                    payment_id = %payment.id,
                    status = ?refund.status,
                    refunded_amount = %payment.refunded_amount,
                    "Refund status updated from webhook"
                );
            }
            // Refunds issued from the gateway dashboard have no row here
            None => tracing::warn!(provider_refund_id, "Webhook for an unknown refund"),
        }
        Ok(())
    }

    async fn fail(&self, record: &WebhookRecord, message: &str) {
        if let Err(e) = self.records.mark_failed(record.id, message).await {
            tracing::error!(error = %e, record_id = %record.id, "Failed to mark webhook record failed");
        }
    }

    pub async fn list_recent(
        &self,
        actor: &Actor,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WebhookRecord>, AppError> {
        actor.require(UserRole::Admin)?;
        self.records.list_recent(limit, offset).await
    }
}
