use async_trait::async_trait;
use chrono::SecondsFormat;
use coursely_core::config::ZoomConfig;
use coursely_core::models::MeetingPlatform;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{Meeting, MeetingProvider, MeetingRequest};
use crate::error::{GatewayError, GatewayResult};
use crate::http::{build_client, check_status, id_at, json as parse_json, transport};

const PROVIDER: &str = "zoom";
/// Refresh the cached token this long before Zoom expires it.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Zoom Meetings API with server-to-server OAuth
pub struct ZoomProvider {
    http_client: Client,
    config: ZoomConfig,
    token: Mutex<Option<(String, Instant)>>,
}

impl Debug for ZoomProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ZoomProvider")
            .field("account_id", &self.config.account_id)
            .field("api_base", &self.config.api_base)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

impl ZoomProvider {
    pub fn new(config: ZoomConfig, timeout: Duration) -> GatewayResult<Self> {
        Ok(Self {
            http_client: build_client(PROVIDER, timeout)?,
            config,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> GatewayResult<String> {
        let mut cached = self.token.lock().await;
        if let Some((token, expires_at)) = cached.as_ref() {
            if Instant::now() < *expires_at {
                return Ok(token.clone());
            }
        }

        let response = self
            .http_client
            .post(format!(
                "{}/oauth/token",
                self.config.oauth_base.trim_end_matches('/')
            ))
            .query(&[
                ("grant_type", "account_credentials"),
                ("account_id", self.config.account_id.as_str()),
            ])
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .send()
            .await
            .map_err(transport(PROVIDER))?;

        let token: TokenResponse = parse_json(PROVIDER, response).await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some((token.access_token.clone(), Instant::now() + lifetime));

        tracing::debug!(expires_in = token.expires_in, "Zoom access token refreshed");
        Ok(token.access_token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl MeetingProvider for ZoomProvider {
    fn platform(&self) -> MeetingPlatform {
        MeetingPlatform::Zoom
    }

    #[tracing::instrument(skip(self, request), fields(topic = %request.topic))]
    async fn create_meeting(&self, request: &MeetingRequest) -> GatewayResult<Meeting> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .post(self.url("/users/me/meetings"))
            .bearer_auth(token)
            .json(&json!({
                "topic": request.topic,
                "agenda": request.agenda,
                "type": 2,
                "start_time": request.start_time.to_rfc3339_opts(SecondsFormat::Secs, true),
                "duration": request.duration_minutes,
                "settings": {
                    "join_before_host": false,
                    "waiting_room": true,
                },
            }))
            .send()
            .await
            .map_err(transport(PROVIDER))?;

        let raw: serde_json::Value = parse_json(PROVIDER, response).await?;
        let meeting = Meeting {
            meeting_id: id_at(&raw, "/id")
                .ok_or_else(|| GatewayError::invalid_response(PROVIDER, "meeting id missing"))?,
            join_url: id_at(&raw, "/join_url")
                .ok_or_else(|| GatewayError::invalid_response(PROVIDER, "join_url missing"))?,
            host_url: id_at(&raw, "/start_url"),
        };

        tracing::info!(meeting_id = %meeting.meeting_id, "Zoom meeting created");
        Ok(meeting)
    }

    async fn delete_meeting(&self, meeting_id: &str) -> GatewayResult<()> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .delete(self.url(&format!("/meetings/{}", urlencoding::encode(meeting_id))))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport(PROVIDER))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(PROVIDER, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn provider(base: String) -> ZoomProvider {
        ZoomProvider::new(
            ZoomConfig {
                account_id: "acct".to_string(),
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                api_base: format!("{}/v2", base),
                oauth_base: base,
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_meeting_fetches_token_once() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/oauth/token")
            .match_query(mockito::Matcher::UrlEncoded(
                "grant_type".into(),
                "account_credentials".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;
        server
            .mock("POST", "/v2/users/me/meetings")
            .match_header("authorization", "Bearer tok")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":85012345678,"join_url":"https://zoom.us/j/85012345678","start_url":"https://zoom.us/s/85012345678"}"#)
            .expect(2)
            .create_async()
            .await;

        let provider = provider(server.url());
        let request = MeetingRequest {
            topic: "Week 1 Q&A".to_string(),
            agenda: None,
            start_time: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            duration_minutes: 60,
        };

        let meeting = provider.create_meeting(&request).await.unwrap();
        provider.create_meeting(&request).await.unwrap();

        token_mock.assert_async().await;
        assert_eq!(meeting.meeting_id, "85012345678");
        assert_eq!(meeting.host_url.as_deref(), Some("https://zoom.us/s/85012345678"));
    }

    #[tokio::test]
    async fn test_delete_missing_meeting_is_ok() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth/token")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok","expires_in":3600}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", "/v2/meetings/123")
            .with_status(404)
            .create_async()
            .await;

        assert!(provider(server.url()).delete_meeting("123").await.is_ok());
    }
}
