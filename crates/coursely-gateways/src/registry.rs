//! Registry of configured payment gateways and meeting providers

use coursely_core::models::{MeetingPlatform, PaymentMethod};
use coursely_core::Config;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{GatewayError, GatewayResult};
use crate::meeting::{GoogleMeetProvider, MeetingProvider, ZoomProvider};
use crate::payment::{CashfreeGateway, PaymentGateway, RazorpayGateway};

/// Adapters keyed by the selector clients send. Built once at startup and shared read-only.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    payments: HashMap<PaymentMethod, Arc<dyn PaymentGateway>>,
    meetings: HashMap<MeetingPlatform, Arc<dyn MeetingProvider>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every adapter whose credentials are present in `config`.
    pub fn from_config(config: &Config) -> GatewayResult<Self> {
        let timeout = Duration::from_secs(config.gateway_timeout_secs());
        let mut registry = Self::new();

        if let Some(razorpay) = config.razorpay() {
            registry.register_payment(Arc::new(RazorpayGateway::new(razorpay.clone(), timeout)?));
        }
        if let Some(cashfree) = config.cashfree() {
            registry.register_payment(Arc::new(CashfreeGateway::new(cashfree.clone(), timeout)?));
        }
        if let Some(zoom) = config.zoom() {
            registry.register_meeting(Arc::new(ZoomProvider::new(zoom.clone(), timeout)?));
        }
        if let Some(google_meet) = config.google_meet() {
            registry.register_meeting(Arc::new(GoogleMeetProvider::new(
                google_meet.clone(),
                timeout,
            )?));
        }

        tracing::info!(
            payment_gateways = ?registry.payment_methods(),
            meeting_providers = registry.meetings.len(),
            "Gateway registry initialized"
        );
        Ok(registry)
    }

    pub fn register_payment(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.payments.insert(gateway.method(), gateway);
    }

    pub fn register_meeting(&mut self, provider: Arc<dyn MeetingProvider>) {
        self.meetings.insert(provider.platform(), provider);
    }

    pub fn payment(&self, method: PaymentMethod) -> GatewayResult<Arc<dyn PaymentGateway>> {
        self.payments
            .get(&method)
            .cloned()
            .ok_or_else(|| GatewayError::NotConfigured(format!("Payment method '{}'", method)))
    }

    pub fn meeting(&self, platform: MeetingPlatform) -> GatewayResult<Arc<dyn MeetingProvider>> {
        self.meetings
            .get(&platform)
            .cloned()
            .ok_or_else(|| GatewayError::NotConfigured(format!("Meeting platform '{}'", platform)))
    }

    pub fn payment_methods(&self) -> Vec<PaymentMethod> {
        let mut methods: Vec<_> = self.payments.keys().copied().collect();
        methods.sort_by_key(|m| m.as_str());
        methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursely_core::config::RazorpayConfig;

    fn razorpay() -> Arc<dyn PaymentGateway> {
        Arc::new(
            RazorpayGateway::new(
                RazorpayConfig {
                    key_id: "k".to_string(),
                    key_secret: "s".to_string(),
                    webhook_secret: None,
                    api_base: "http://localhost".to_string(),
                },
                Duration::from_secs(1),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_registered_gateway_is_returned() {
        let mut registry = GatewayRegistry::new();
        registry.register_payment(razorpay());

        assert_eq!(
            registry.payment(PaymentMethod::Razorpay).unwrap().method(),
            PaymentMethod::Razorpay
        );
        assert_eq!(registry.payment_methods(), vec![PaymentMethod::Razorpay]);
    }

    #[test]
    fn test_missing_adapters_are_not_configured() {
        let registry = GatewayRegistry::new();
        assert!(matches!(
            registry.payment(PaymentMethod::Cashfree),
            Err(GatewayError::NotConfigured(_))
        ));
        assert!(matches!(
            registry.meeting(MeetingPlatform::Zoom),
            Err(GatewayError::NotConfigured(_))
        ));
    }
}
