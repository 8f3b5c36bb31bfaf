//! Security audit entries emitted at the edge
//!
//! Entries go to the `audit` tracing target as one JSON document each, so they can be
//! routed to a separate sink with an `EnvFilter` directive. Domain events such as refunds
//! and certificate verifications are logged by the services on the same target.

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    AuthenticationSuccess,
    AuthenticationFailure,
    AccessDenied,
    RateLimitExceeded,
    SessionIssued,
    SessionCleared,
}

#[derive(Debug, Serialize)]
pub struct AuditLogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event_type: AuditEventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AuditLogEntry {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            timestamp: chrono::Utc::now(),
            event_type,
            tenant_id: None,
            user_id: None,
            client_ip: None,
            request_path: None,
            details: None,
            success: true,
            error_message: None,
        }
    }

    pub fn with_user(mut self, user_id: Uuid, tenant_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = Some(client_ip.into());
        self
    }

    pub fn with_request_path(mut self, path: impl Into<String>) -> Self {
        self.request_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_failure(mut self, error_message: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(error_message.into());
        self
    }

    pub fn log(&self) {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());

        if self.success {
            tracing::info!(
                target: "audit",
                audit_entry = %json,
                event_type = ?self.event_type,
                user_id = ?self.user_id,
                "Security audit log"
            );
        } else {
            tracing::warn!(
                target: "audit",
                audit_entry = %json,
                event_type = ?self.event_type,
                user_id = ?self.user_id,
                error = ?self.error_message,
                "Security audit log - failure"
            );
        }
    }
}

pub fn log_rate_limit_exceeded(client_ip: &str, request_path: &str, limit: u32) {
    AuditLogEntry::new(AuditEventType::RateLimitExceeded)
        .with_client_ip(client_ip)
        .with_request_path(request_path)
        .with_details(serde_json::json!({ "rate_limit": limit }))
        .with_failure("Rate limit exceeded")
        .log();
}

/// Protected path requested without valid credentials.
pub fn log_authentication_failure(client_ip: &str, request_path: &str, credentials_present: bool) {
    let reason = if credentials_present {
        "Invalid or expired token"
    } else {
        "Missing credentials"
    };
    AuditLogEntry::new(AuditEventType::AuthenticationFailure)
        .with_client_ip(client_ip)
        .with_request_path(request_path)
        .with_failure(reason)
        .log();
}

pub fn log_access_denied(user_id: Uuid, tenant_id: Uuid, request_path: &str, required: &str) {
    AuditLogEntry::new(AuditEventType::AccessDenied)
        .with_user(user_id, tenant_id)
        .with_request_path(request_path)
        .with_details(serde_json::json!({ "required_role": required }))
        .with_failure("Insufficient role")
        .log();
}

/// First sighting of an identity by this process.
pub fn log_authentication_success(user_id: Uuid, tenant_id: Uuid, client_ip: &str) {
    AuditLogEntry::new(AuditEventType::AuthenticationSuccess)
        .with_user(user_id, tenant_id)
        .with_client_ip(client_ip)
        .log();
}

pub fn log_session_change(user_id: Uuid, tenant_id: Uuid, issued: bool) {
    let event_type = if issued {
        AuditEventType::SessionIssued
    } else {
        AuditEventType::SessionCleared
    };
    AuditLogEntry::new(event_type).with_user(user_id, tenant_id).log();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_without_empty_fields() {
        let entry = AuditLogEntry::new(AuditEventType::RateLimitExceeded)
            .with_client_ip("203.0.113.9")
            .with_failure("Rate limit exceeded");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["event_type"], "rate_limit_exceeded");
        assert_eq!(json["success"], false);
        assert!(json.get("user_id").is_none());
    }
}
