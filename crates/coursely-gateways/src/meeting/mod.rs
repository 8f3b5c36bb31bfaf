//! Meeting provider abstraction for live classes

mod google_meet;
mod zoom;

pub use google_meet::GoogleMeetProvider;
pub use zoom::ZoomProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coursely_core::models::MeetingPlatform;
use std::fmt::Debug;

use crate::error::GatewayResult;

#[derive(Debug, Clone)]
pub struct MeetingRequest {
    pub topic: String,
    pub agenda: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meeting {
    pub meeting_id: String,
    pub join_url: String,
    pub host_url: Option<String>,
}

#[async_trait]
pub trait MeetingProvider: Send + Sync + Debug {
    fn platform(&self) -> MeetingPlatform;

    async fn create_meeting(&self, request: &MeetingRequest) -> GatewayResult<Meeting>;

    /// Deleting a meeting that no longer exists succeeds.
    async fn delete_meeting(&self, meeting_id: &str) -> GatewayResult<()>;
}
