//! Scriptable gateway and meeting-provider doubles

use async_trait::async_trait;
use coursely_core::models::{MeetingPlatform, PaymentMethod, RefundStatus};
use coursely_gateways::{
    GatewayError, GatewayEvent, GatewayOrder, GatewayRefund, GatewayResult, Meeting,
    MeetingProvider, MeetingRequest, OrderRequest, ParsedWebhook, PaymentGateway,
    RefundRequest, VerificationRequest,
};
use serde_json::{json, Value as JsonValue};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct GatewayState {
    fail_orders: bool,
    fail_refunds: bool,
    refund_status: Option<RefundStatus>,
    orders: Vec<OrderRequest>,
    refunds: Vec<RefundRequest>,
}

/// Razorpay-flavoured double: accepts the signature `"valid"` only
#[derive(Debug, Clone, Default)]
pub struct MockPaymentGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_orders(&self) {
        self.state.lock().unwrap().fail_orders = true;
    }

    pub fn fail_refunds(&self) {
        self.state.lock().unwrap().fail_refunds = true;
    }

    pub fn refund_status(&self, status: RefundStatus) {
        self.state.lock().unwrap().refund_status = Some(status);
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.state.lock().unwrap().orders.clone()
    }

    pub fn refunds(&self) -> Vec<RefundRequest> {
        self.state.lock().unwrap().refunds.clone()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Razorpay
    }

    async fn create_order(&self, request: &OrderRequest) -> GatewayResult<GatewayOrder> {
        let mut state = self.state.lock().unwrap();
        if state.fail_orders {
            return Err(GatewayError::Api {
                provider: "mock",
                status: 502,
                message: "upstream unavailable".to_string(),
            });
        }
        state.orders.push(request.clone());
        let order_id = format!("order_mock_{}", state.orders.len());
        Ok(GatewayOrder {
            raw: json!({ "id": order_id, "receipt": request.receipt }),
            order_id,
        })
    }

    async fn verify_payment(&self, request: &VerificationRequest) -> GatewayResult<String> {
        match request.signature.as_deref() {
            Some("valid") => Ok(request.payment_id.clone()),
            _ => Err(GatewayError::VerificationFailed(
                "Payment signature mismatch".to_string(),
            )),
        }
    }

    async fn refund(&self, request: &RefundRequest) -> GatewayResult<GatewayRefund> {
        let mut state = self.state.lock().unwrap();
        if state.fail_refunds {
            return Err(GatewayError::Api {
                provider: "mock",
                status: 400,
                message: "refund rejected".to_string(),
            });
        }
        state.refunds.push(request.clone());
        Ok(GatewayRefund {
            provider_refund_id: format!("rfnd_mock_{}", state.refunds.len()),
            status: state.refund_status.unwrap_or(RefundStatus::Succeeded),
        })
    }

    fn verify_webhook_signature(&self, _payload: &[u8], signature: &str) -> bool {
        signature == "valid"
    }

    fn parse_webhook(&self, payload: &JsonValue) -> GatewayResult<ParsedWebhook> {
        let event_type = payload
            .get("event")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(ParsedWebhook {
            event_type,
            event: GatewayEvent::Ignored,
        })
    }
}

#[derive(Debug, Default)]
struct MeetingState {
    fail_create: bool,
    created: Vec<MeetingRequest>,
    deleted: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MockMeetingProvider {
    platform: MeetingPlatform,
    state: Arc<Mutex<MeetingState>>,
}

impl MockMeetingProvider {
    pub fn new(platform: MeetingPlatform) -> Self {
        Self {
            platform,
            state: Arc::default(),
        }
    }

    pub fn fail_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn created(&self) -> Vec<MeetingRequest> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }
}

#[async_trait]
impl MeetingProvider for MockMeetingProvider {
    fn platform(&self) -> MeetingPlatform {
        self.platform
    }

    async fn create_meeting(&self, request: &MeetingRequest) -> GatewayResult<Meeting> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(GatewayError::Api {
                provider: "mock",
                status: 500,
                message: "meeting service down".to_string(),
            });
        }
        state.created.push(request.clone());
        let meeting_id = format!("mtg-{}", state.created.len());
        Ok(Meeting {
            join_url: format!("https://meet.example.com/j/{}", meeting_id),
            host_url: Some(format!("https://meet.example.com/s/{}", meeting_id)),
            meeting_id,
        })
    }

    async fn delete_meeting(&self, meeting_id: &str) -> GatewayResult<()> {
        self.state.lock().unwrap().deleted.push(meeting_id.to_string());
        Ok(())
    }
}
