use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Meeting platform hosting a live class
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "meeting_platform", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum MeetingPlatform {
    Zoom,
    GoogleMeet,
}

impl Display for MeetingPlatform {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MeetingPlatform::Zoom => write!(f, "zoom"),
            MeetingPlatform::GoogleMeet => write!(f, "google_meet"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "live_class_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum LiveClassStatus {
    Scheduled,
    Live,
    Completed,
    Cancelled,
}

impl Display for LiveClassStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LiveClassStatus::Scheduled => write!(f, "scheduled"),
            LiveClassStatus::Live => write!(f, "live"),
            LiveClassStatus::Completed => write!(f, "completed"),
            LiveClassStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl LiveClassStatus {
    /// Allowed forward transitions.
    pub fn can_transition_to(&self, next: LiveClassStatus) -> bool {
        matches!(
            (self, next),
            (LiveClassStatus::Scheduled, LiveClassStatus::Live)
                | (LiveClassStatus::Live, LiveClassStatus::Completed)
                | (LiveClassStatus::Scheduled, LiveClassStatus::Cancelled)
                | (LiveClassStatus::Live, LiveClassStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct LiveClass {
    pub id: Uuid,
    pub course_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub instructor_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub platform: MeetingPlatform,
    pub meeting_id: String,
    pub join_url: String,
    pub host_url: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: LiveClassStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLiveClass {
    pub course_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub instructor_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub platform: MeetingPlatform,
    pub meeting_id: String,
    pub join_url: String,
    pub host_url: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleLiveClassRequest {
    pub course_id: Uuid,
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub platform: MeetingPlatform,
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 15, max = 480, message = "Duration must be between 15 and 480 minutes"))]
    pub duration_minutes: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(LiveClassStatus::Scheduled.can_transition_to(LiveClassStatus::Live));
        assert!(LiveClassStatus::Live.can_transition_to(LiveClassStatus::Completed));
        assert!(!LiveClassStatus::Scheduled.can_transition_to(LiveClassStatus::Completed));
        assert!(!LiveClassStatus::Completed.can_transition_to(LiveClassStatus::Live));
        assert!(!LiveClassStatus::Cancelled.can_transition_to(LiveClassStatus::Scheduled));
    }
}
