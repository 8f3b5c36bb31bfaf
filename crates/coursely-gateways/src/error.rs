use coursely_core::AppError;
use thiserror::Error;

/// Failure talking to an external payment or meeting provider
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} returned an unexpected response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    #[error("Invalid gateway request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    VerificationFailed(String),

    #[error("{0} is not configured")]
    NotConfigured(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub(crate) fn invalid_response(provider: &'static str, message: impl Into<String>) -> Self {
        GatewayError::InvalidResponse {
            provider,
            message: message.into(),
        }
    }

    /// Converts a meeting-provider failure, which surfaces differently from payment errors.
    pub fn into_meeting_error(self) -> AppError {
        match self {
            GatewayError::NotConfigured(m) => AppError::BadRequest(format!("{} is not configured", m)),
            GatewayError::InvalidRequest(m) => AppError::InvalidInput(m),
            other => AppError::MeetingProvider(other.to_string()),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::VerificationFailed(m) => AppError::PaymentVerificationFailed(m),
            GatewayError::NotConfigured(m) => {
                AppError::BadRequest(format!("{} is not configured", m))
            }
            GatewayError::InvalidRequest(m) => AppError::InvalidInput(m),
            other => AppError::PaymentGateway(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_failure_maps_to_payment_verification_error() {
        let err: AppError = GatewayError::VerificationFailed("bad signature".into()).into();
        assert!(matches!(err, AppError::PaymentVerificationFailed(_)));
    }

    #[test]
    fn test_meeting_errors_map_to_meeting_provider() {
        let err = GatewayError::Api {
            provider: "zoom",
            status: 500,
            message: "boom".into(),
        }
        .into_meeting_error();
        assert!(matches!(err, AppError::MeetingProvider(_)));
    }
}
