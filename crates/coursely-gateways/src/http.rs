use crate::error::{GatewayError, GatewayResult};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;

pub(crate) fn build_client(provider: &'static str, timeout: Duration) -> GatewayResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| GatewayError::Transport { provider, source })
}

/// Passes through 2xx responses; anything else becomes `GatewayError::Api` with the body text.
pub(crate) async fn check_status(provider: &'static str, response: Response) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    tracing::warn!(provider, status = status.as_u16(), error = %message, "Gateway request rejected");

    Err(GatewayError::Api {
        provider,
        status: status.as_u16(),
        message,
    })
}

pub(crate) async fn json<T: DeserializeOwned>(
    provider: &'static str,
    response: Response,
) -> GatewayResult<T> {
    let response = check_status(provider, response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| GatewayError::invalid_response(provider, e.to_string()))
}

pub(crate) fn transport(provider: &'static str) -> impl FnOnce(reqwest::Error) -> GatewayError {
    move |source| GatewayError::Transport { provider, source }
}

pub(crate) fn str_at<'a>(value: &'a JsonValue, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(|v| v.as_str())
}

/// Reads a string or number at `pointer` as a string.
pub(crate) fn id_at(value: &JsonValue, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
