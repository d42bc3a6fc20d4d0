//! Typed enqueue helpers, one per data class.
//!
//! This is the documented entry point for application code. Each helper
//! fixes the item's type, action, and strategy-derived defaults (priority,
//! retry ceiling, conflict policy), so call sites cannot invent ad hoc
//! policies per call.

use crate::engine::{NewSyncItem, SyncEngine};
use crate::error::SyncResult;
use crate::transport::SyncTransport;
use learnsync_model::{
    AnalyticsEvent, ContentPatch, EnrollmentRequest, NotificationState, PaymentIntent,
    ProfilePatch, ProgressUpdate, QuizAnswers, SyncPayload, SyncType,
};
use learnsync_store::SnapshotStore;
use uuid::Uuid;

/// Queues a lesson progress update.
pub async fn sync_course_progress<S: SnapshotStore, T: SyncTransport>(
    engine: &SyncEngine<S, T>,
    update: ProgressUpdate,
) -> SyncResult<Uuid> {
    let item = NewSyncItem::new(
        SyncType::CourseProgress,
        "update_progress",
        SyncPayload::CourseProgress(update.clone()),
    )
    .with_metadata("course_id", &update.course_id)
    .with_metadata("lesson_id", &update.lesson_id);
    engine.enqueue(item).await
}

/// Queues a quiz submission.
///
/// `dependencies` lets a submission wait for prerequisite work (typically
/// the enrollment that grants access to the quiz).
pub async fn sync_quiz_submission<S: SnapshotStore, T: SyncTransport>(
    engine: &SyncEngine<S, T>,
    answers: QuizAnswers,
    dependencies: Vec<Uuid>,
) -> SyncResult<Uuid> {
    let item = NewSyncItem::new(
        SyncType::QuizSubmission,
        "submit_quiz",
        SyncPayload::QuizSubmission(answers.clone()),
    )
    .with_metadata("course_id", &answers.course_id)
    .with_metadata("quiz_id", &answers.quiz_id)
    .with_dependencies(dependencies);
    engine.enqueue(item).await
}

/// Queues a user profile edit.
pub async fn sync_user_profile<S: SnapshotStore, T: SyncTransport>(
    engine: &SyncEngine<S, T>,
    patch: ProfilePatch,
) -> SyncResult<Uuid> {
    let item = NewSyncItem::new(
        SyncType::UserProfile,
        "update_profile",
        SyncPayload::UserProfile(patch),
    );
    engine.enqueue(item).await
}

/// Queues a course enrollment.
pub async fn sync_course_enrollment<S: SnapshotStore, T: SyncTransport>(
    engine: &SyncEngine<S, T>,
    request: EnrollmentRequest,
) -> SyncResult<Uuid> {
    let item = NewSyncItem::new(
        SyncType::CourseEnrollment,
        "enroll",
        SyncPayload::CourseEnrollment(request.clone()),
    )
    .with_metadata("course_id", &request.course_id);
    engine.enqueue(item).await
}

/// Queues a payment submission.
///
/// `dependencies` typically carries the enrollment the payment settles.
pub async fn sync_payment<S: SnapshotStore, T: SyncTransport>(
    engine: &SyncEngine<S, T>,
    intent: PaymentIntent,
    dependencies: Vec<Uuid>,
) -> SyncResult<Uuid> {
    let item = NewSyncItem::new(
        SyncType::Payment,
        "process_payment",
        SyncPayload::Payment(intent.clone()),
    )
    .with_metadata("order_id", &intent.order_id)
    .with_dependencies(dependencies);
    engine.enqueue(item).await
}

/// Queues a notification read/dismiss update.
pub async fn sync_notification<S: SnapshotStore, T: SyncTransport>(
    engine: &SyncEngine<S, T>,
    state: NotificationState,
) -> SyncResult<Uuid> {
    let item = NewSyncItem::new(
        SyncType::Notification,
        "update_notification",
        SyncPayload::Notification(state),
    );
    engine.enqueue(item).await
}

/// Queues an instructor content edit.
pub async fn sync_content_update<S: SnapshotStore, T: SyncTransport>(
    engine: &SyncEngine<S, T>,
    patch: ContentPatch,
) -> SyncResult<Uuid> {
    let item = NewSyncItem::new(
        SyncType::ContentUpdate,
        "update_content",
        SyncPayload::ContentUpdate(patch.clone()),
    )
    .with_metadata("content_id", &patch.content_id);
    engine.enqueue(item).await
}

/// Queues a telemetry event.
pub async fn sync_analytics_event<S: SnapshotStore, T: SyncTransport>(
    engine: &SyncEngine<S, T>,
    event: AnalyticsEvent,
) -> SyncResult<Uuid> {
    let item = NewSyncItem::new(
        SyncType::Analytics,
        "track_event",
        SyncPayload::Analytics(event),
    );
    engine.enqueue(item).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::transport::MockTransport;
    use learnsync_model::{now_millis, ConflictPolicy, SyncPriority, SyncStrategies};
    use learnsync_store::MemoryStore;
    use std::sync::Arc;

    fn idle_engine() -> Arc<SyncEngine<MemoryStore, MockTransport>> {
        SyncEngine::new(
            EngineConfig::new().with_auto_start(false),
            SyncStrategies::default(),
            MemoryStore::new(),
            MockTransport::new(),
        )
    }

    #[tokio::test]
    async fn payment_helper_fixes_policy_and_priority() {
        let engine = idle_engine();
        let enrollment_id = sync_course_enrollment(
            &engine,
            EnrollmentRequest {
                course_id: "rust-101".into(),
                coupon_code: None,
            },
        )
        .await
        .unwrap();

        sync_payment(
            &engine,
            PaymentIntent {
                order_id: "ord-7".into(),
                amount_cents: 12900,
                currency: "EUR".into(),
                method: "card".into(),
            },
            vec![enrollment_id],
        )
        .await
        .unwrap();

        let stats = engine.get_sync_stats();
        assert_eq!(stats.queue_size, 2);

        let queue = engine.pending_items();
        let payment = queue
            .iter()
            .find(|i| i.sync_type == SyncType::Payment)
            .unwrap();
        assert_eq!(payment.priority, SyncPriority::Critical);
        assert_eq!(payment.max_retries, 10);
        assert_eq!(payment.conflict_resolution, ConflictPolicy::ServerWins);
        assert_eq!(payment.dependencies, vec![enrollment_id]);
        assert_eq!(payment.metadata["order_id"], "ord-7");
        assert_eq!(payment.action, "process_payment");
    }

    #[tokio::test]
    async fn progress_helper_carries_course_metadata() {
        let engine = idle_engine();
        sync_course_progress(
            &engine,
            ProgressUpdate {
                course_id: "rust-101".into(),
                lesson_id: "ownership".into(),
                percent_complete: 50.0,
                position_seconds: None,
            },
        )
        .await
        .unwrap();

        let queue = engine.pending_items();
        let item = &queue[0];
        assert_eq!(item.sync_type, SyncType::CourseProgress);
        assert_eq!(item.priority, SyncPriority::High);
        assert_eq!(item.conflict_resolution, ConflictPolicy::LastWriteWins);
        assert_eq!(item.metadata["course_id"], "rust-101");
        assert_eq!(item.metadata["lesson_id"], "ownership");
    }

    #[tokio::test]
    async fn best_effort_helpers_default_to_low_priority() {
        let engine = idle_engine();
        sync_analytics_event(
            &engine,
            AnalyticsEvent {
                event: "page_view".into(),
                properties: serde_json::json!({"page": "catalog"}),
                occurred_at_ms: now_millis(),
            },
        )
        .await
        .unwrap();
        sync_notification(
            &engine,
            NotificationState {
                notification_id: "n-1".into(),
                read: true,
                dismissed: false,
            },
        )
        .await
        .unwrap();

        let queue = engine.pending_items();
        assert!(queue.iter().all(|i| i.priority == SyncPriority::Low));
        assert!(queue
            .iter()
            .all(|i| i.conflict_resolution == ConflictPolicy::ClientWins));
    }

    #[tokio::test]
    async fn profile_helper_uses_merge() {
        let engine = idle_engine();
        let mut fields = serde_json::Map::new();
        fields.insert("display_name".into(), serde_json::json!("Ada"));
        sync_user_profile(&engine, ProfilePatch { fields }).await.unwrap();

        let queue = engine.pending_items();
        assert_eq!(queue[0].conflict_resolution, ConflictPolicy::Merge);
        assert_eq!(queue[0].action, "update_profile");
    }
}
