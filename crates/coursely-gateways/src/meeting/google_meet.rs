use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, SecondsFormat};
use coursely_core::config::GoogleMeetConfig;
use coursely_core::models::MeetingPlatform;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use uuid::Uuid;

use super::{Meeting, MeetingProvider, MeetingRequest};
use crate::error::{GatewayError, GatewayResult};
use crate::http::{build_client, check_status, id_at, json as parse_json, transport};

const PROVIDER: &str = "google_meet";

/// Google Calendar events with an attached Meet conference
pub struct GoogleMeetProvider {
    http_client: Client,
    config: GoogleMeetConfig,
}

impl Debug for GoogleMeetProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GoogleMeetProvider")
            .field("calendar_id", &self.config.calendar_id)
            .finish()
    }
}

impl GoogleMeetProvider {
    pub fn new(config: GoogleMeetConfig, timeout: Duration) -> GatewayResult<Self> {
        Ok(Self {
            http_client: build_client(PROVIDER, timeout)?,
            config,
        })
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.config.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.config.calendar_id)
        )
    }
}

#[async_trait]
impl MeetingProvider for GoogleMeetProvider {
    fn platform(&self) -> MeetingPlatform {
        MeetingPlatform::GoogleMeet
    }

    #[tracing::instrument(skip(self, request), fields(topic = %request.topic))]
    async fn create_meeting(&self, request: &MeetingRequest) -> GatewayResult<Meeting> {
        let end = request.start_time + ChronoDuration::minutes(i64::from(request.duration_minutes));

        let response = self
            .http_client
            .post(self.events_url())
            .query(&[("conferenceDataVersion", "1")])
            .bearer_auth(&self.config.access_token)
            .json(&json!({
                "summary": request.topic,
                "description": request.agenda,
                "start": { "dateTime": request.start_time.to_rfc3339_opts(SecondsFormat::Secs, true) },
                "end": { "dateTime": end.to_rfc3339_opts(SecondsFormat::Secs, true) },
                "conferenceData": {
                    "createRequest": {
                        "requestId": Uuid::new_v4().to_string(),
                        "conferenceSolutionKey": { "type": "hangoutsMeet" },
                    },
                },
            }))
            .send()
            .await
            .map_err(transport(PROVIDER))?;

        let raw: serde_json::Value = parse_json(PROVIDER, response).await?;
        let meeting = Meeting {
            meeting_id: id_at(&raw, "/id")
                .ok_or_else(|| GatewayError::invalid_response(PROVIDER, "event id missing"))?,
            join_url: id_at(&raw, "/hangoutLink")
                .ok_or_else(|| GatewayError::invalid_response(PROVIDER, "hangoutLink missing"))?,
            host_url: id_at(&raw, "/htmlLink"),
        };

        tracing::info!(meeting_id = %meeting.meeting_id, "Google Meet event created");
        Ok(meeting)
    }

    async fn delete_meeting(&self, meeting_id: &str) -> GatewayResult<()> {
        let response = self
            .http_client
            .delete(format!(
                "{}/{}",
                self.events_url(),
                urlencoding::encode(meeting_id)
            ))
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(transport(PROVIDER))?;

        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Ok(());
        }
        check_status(PROVIDER, response).await?;
        Ok(())
    }
}
