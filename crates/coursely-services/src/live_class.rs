//! Live class scheduling on external meeting platforms

use coursely_core::models::{
    LiveClass, LiveClassStatus, NewLiveClass, ScheduleLiveClassRequest, UserRole,
};
use coursely_core::AppError;
use coursely_db::LiveClassRepositoryTrait;
use coursely_gateways::{GatewayRegistry, MeetingRequest};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::actor::Actor;

#[derive(Clone)]
pub struct LiveClassService {
    live_classes: Arc<dyn LiveClassRepositoryTrait>,
    gateways: GatewayRegistry,
}

impl LiveClassService {
    pub fn new(live_classes: Arc<dyn LiveClassRepositoryTrait>, gateways: GatewayRegistry) -> Self {
        Self {
            live_classes,
            gateways,
        }
    }

    /// Creates the remote meeting, then the row. If the row cannot be written the meeting
    /// is deleted again.
    #[tracing::instrument(skip(self, actor, request), fields(course_id = %request.course_id, platform = %request.platform))]
    pub async fn schedule(
        &self,
        actor: &Actor,
        request: ScheduleLiveClassRequest,
    ) -> Result<LiveClass, AppError> {
        actor.require(UserRole::Instructor)?;
        request.validate()?;

        let owner = self
            .live_classes
            .course_owner(request.course_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;
        actor.ensure_owner(owner.instructor_id)?;

        let provider = self
            .gateways
            .meeting(request.platform)
            .map_err(|e| e.into_meeting_error())?;
        let meeting = provider
            .create_meeting(&MeetingRequest {
                topic: request.title.clone(),
                agenda: request.description.clone(),
                start_time: request.scheduled_at,
                duration_minutes: request.duration_minutes,
            })
            .await
            .map_err(|e| e.into_meeting_error())?;

        let inserted = self
            .live_classes
            .insert(NewLiveClass {
                course_id: request.course_id,
                tenant_id: Some(owner.tenant_id),
                instructor_id: owner.instructor_id,
                title: request.title,
                description: request.description,
                platform: request.platform,
                meeting_id: meeting.meeting_id.clone(),
                join_url: meeting.join_url,
                host_url: meeting.host_url,
                scheduled_at: request.scheduled_at,
                duration_minutes: request.duration_minutes,
            })
            .await;

        match inserted {
            Ok(live_class) => {
                tracing::info!(live_class_id = %live_class.id, meeting_id = %live_class.meeting_id, "Live class scheduled");
                Ok(live_class)
            }
            Err(e) => {
                if let Err(delete_err) = provider.delete_meeting(&meeting.meeting_id).await {
                    tracing::error!(
                        error = %delete_err,
                        meeting_id = %meeting.meeting_id,
                        "Failed to delete meeting after live class insert failed"
                    );
                }
                Err(e)
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<LiveClass, AppError> {
        self.live_classes
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Live class not found".to_string()))
    }

    pub async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<LiveClass>, AppError> {
        self.live_classes.list_by_course(course_id).await
    }

    pub async fn start(&self, actor: &Actor, id: Uuid) -> Result<LiveClass, AppError> {
        self.transition(actor, id, LiveClassStatus::Live).await
    }

    pub async fn complete(&self, actor: &Actor, id: Uuid) -> Result<LiveClass, AppError> {
        self.transition(actor, id, LiveClassStatus::Completed).await
    }

    /// Cancels the class and removes the remote meeting. A failed remote delete is logged;
    /// the class stays cancelled.
    pub async fn cancel(&self, actor: &Actor, id: Uuid) -> Result<LiveClass, AppError> {
        let cancelled = self.transition(actor, id, LiveClassStatus::Cancelled).await?;
        match self.gateways.meeting(cancelled.platform) {
            Ok(provider) => {
                if let Err(e) = provider.delete_meeting(&cancelled.meeting_id).await {
                    tracing::warn!(error = %e, meeting_id = %cancelled.meeting_id, "Failed to delete meeting for cancelled live class");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, live_class_id = %id, "Meeting provider unavailable; remote meeting left in place");
            }
        }
        Ok(cancelled)
    }

    async fn transition(
        &self,
        actor: &Actor,
        id: Uuid,
        next: LiveClassStatus,
    ) -> Result<LiveClass, AppError> {
        let current = self.get(id).await?;
        actor.ensure_owner(current.instructor_id)?;
        if !current.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Live class cannot move from {} to {}",
                current.status, next
            )));
        }
        let updated = self
            .live_classes
            .transition(id, current.status, next)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("Live class status changed concurrently".to_string())
            })?;
        tracing::info!(live_class_id = %id, from = %current.status, to = %next, "Live class status changed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{actor, course, MockLearningStore, MockMeetingProvider};
    use chrono::{Duration, Utc};
    use coursely_core::models::MeetingPlatform;
    use rust_decimal::Decimal;

    struct Harness {
        learning: MockLearningStore,
        zoom: MockMeetingProvider,
        service: LiveClassService,
    }

    fn harness() -> Harness {
        let learning = MockLearningStore::new();
        let zoom = MockMeetingProvider::new(MeetingPlatform::Zoom);
        let mut registry = GatewayRegistry::new();
        registry.register_meeting(Arc::new(zoom.clone()));
        let service = LiveClassService::new(Arc::new(learning.clone()), registry);
        Harness {
            learning,
            zoom,
            service,
        }
    }

    fn request(course_id: Uuid, platform: MeetingPlatform) -> ScheduleLiveClassRequest {
        ScheduleLiveClassRequest {
            course_id,
            title: "Office hours".to_string(),
            description: Some("Lifetimes Q&A".to_string()),
            platform,
            scheduled_at: Utc::now() + Duration::days(1),
            duration_minutes: 60,
        }
    }

    fn instructor_with_course(h: &Harness) -> (Actor, Uuid) {
        let instructor = actor(UserRole::Instructor);
        let owned = course(instructor.tenant_id, instructor.user_id, Decimal::ZERO);
        h.learning.add_course(owned.clone());
        (instructor, owned.id)
    }

    #[tokio::test]
    async fn test_schedule_creates_meeting_and_row() {
        let h = harness();
        let (instructor, course_id) = instructor_with_course(&h);

        let live_class = h
            .service
            .schedule(&instructor, request(course_id, MeetingPlatform::Zoom))
            .await
            .unwrap();

        assert_eq!(live_class.status, LiveClassStatus::Scheduled);
        assert_eq!(live_class.meeting_id, "mtg-1");
        assert_eq!(live_class.tenant_id, Some(instructor.tenant_id));
        assert_eq!(h.zoom.created()[0].topic, "Office hours");
    }

    #[tokio::test]
    async fn test_failed_insert_deletes_remote_meeting() {
        let h = harness();
        let (instructor, course_id) = instructor_with_course(&h);
        h.learning.fail_live_class_inserts();

        let result = h
            .service
            .schedule(&instructor, request(course_id, MeetingPlatform::Zoom))
            .await;

        assert!(result.is_err());
        assert_eq!(h.zoom.deleted(), vec!["mtg-1".to_string()]);
        assert!(h.learning.live_classes().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_writes_nothing() {
        let h = harness();
        let (instructor, course_id) = instructor_with_course(&h);
        h.zoom.fail_create();

        let result = h
            .service
            .schedule(&instructor, request(course_id, MeetingPlatform::Zoom))
            .await;

        assert!(matches!(result, Err(AppError::MeetingProvider(_))));
        assert!(h.learning.live_classes().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_platform_is_rejected() {
        let h = harness();
        let (instructor, course_id) = instructor_with_course(&h);

        let result = h
            .service
            .schedule(&instructor, request(course_id, MeetingPlatform::GoogleMeet))
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_other_instructor_cannot_schedule() {
        let h = harness();
        let (_, course_id) = instructor_with_course(&h);

        let result = h
            .service
            .schedule(&actor(UserRole::Instructor), request(course_id, MeetingPlatform::Zoom))
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
        assert!(h.zoom.created().is_empty());
    }

    #[tokio::test]
    async fn test_lifecycle_and_cancel() {
        let h = harness();
        let (instructor, course_id) = instructor_with_course(&h);
        let scheduled = h
            .service
            .schedule(&instructor, request(course_id, MeetingPlatform::Zoom))
            .await
            .unwrap();

        let early = h.service.complete(&instructor, scheduled.id).await;
        assert!(matches!(early, Err(AppError::Conflict(_))));

        let live = h.service.start(&instructor, scheduled.id).await.unwrap();
        assert_eq!(live.status, LiveClassStatus::Live);
        let done = h.service.complete(&instructor, scheduled.id).await.unwrap();
        assert_eq!(done.status, LiveClassStatus::Completed);

        let other = h
            .service
            .schedule(&instructor, request(course_id, MeetingPlatform::Zoom))
            .await
            .unwrap();
        let cancelled = h.service.cancel(&instructor, other.id).await.unwrap();
        assert_eq!(cancelled.status, LiveClassStatus::Cancelled);
        assert_eq!(h.zoom.deleted(), vec![other.meeting_id]);
        assert_eq!(h.service.list_by_course(course_id).await.unwrap().len(), 2);
    }
}
