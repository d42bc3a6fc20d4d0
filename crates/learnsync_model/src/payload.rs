//! Typed sync payloads.
//!
//! Payloads are a tagged union with one variant per [`SyncType`], so the
//! dispatch boundary can type-check bodies per data class instead of passing
//! opaque blobs. Free-form segments (quiz answers, analytics properties,
//! content bodies) stay [`serde_json::Value`].

use crate::item::SyncType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A lesson/video progress update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// The course being studied.
    pub course_id: String,
    /// The lesson within the course.
    pub lesson_id: String,
    /// Completion percentage, 0.0 to 100.0.
    pub percent_complete: f64,
    /// Playback position for resumable media, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_seconds: Option<u64>,
}

/// A completed quiz submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAnswers {
    /// The course the quiz belongs to.
    pub course_id: String,
    /// The quiz being submitted.
    pub quiz_id: String,
    /// Question-id to answer mapping, quiz-specific shape.
    pub answers: Value,
    /// Locally computed score, if grading happened client-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Submission time in epoch milliseconds.
    pub submitted_at_ms: u64,
}

/// A partial user-profile edit.
///
/// Only the edited fields are carried; the `merge` conflict policy unions
/// them with the remote profile field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    /// Edited fields and their new values.
    pub fields: serde_json::Map<String, Value>,
}

/// A course enrollment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    /// The course to enroll in.
    pub course_id: String,
    /// Optional discount coupon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

/// A payment submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// The order this payment settles.
    pub order_id: String,
    /// Amount in minor currency units.
    pub amount_cents: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Payment method token.
    pub method: String,
}

/// Notification read/dismiss state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationState {
    /// The notification this state applies to.
    pub notification_id: String,
    /// Whether the user has read it.
    pub read: bool,
    /// Whether the user has dismissed it.
    pub dismissed: bool,
}

/// An instructor content edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPatch {
    /// The content item being edited.
    pub content_id: String,
    /// Local revision counter.
    pub revision: u64,
    /// The edited content body.
    pub body: Value,
}

/// A telemetry event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// Event name.
    pub event: String,
    /// Event properties.
    pub properties: Value,
    /// Occurrence time in epoch milliseconds.
    pub occurred_at_ms: u64,
}

/// A typed payload, one variant per [`SyncType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum SyncPayload {
    /// Payload for [`SyncType::CourseProgress`].
    CourseProgress(ProgressUpdate),
    /// Payload for [`SyncType::QuizSubmission`].
    QuizSubmission(QuizAnswers),
    /// Payload for [`SyncType::UserProfile`].
    UserProfile(ProfilePatch),
    /// Payload for [`SyncType::CourseEnrollment`].
    CourseEnrollment(EnrollmentRequest),
    /// Payload for [`SyncType::Payment`].
    Payment(PaymentIntent),
    /// Payload for [`SyncType::Notification`].
    Notification(NotificationState),
    /// Payload for [`SyncType::ContentUpdate`].
    ContentUpdate(ContentPatch),
    /// Payload for [`SyncType::Analytics`].
    Analytics(AnalyticsEvent),
}

impl SyncPayload {
    /// Returns the sync type this payload belongs to.
    pub fn sync_type(&self) -> SyncType {
        match self {
            SyncPayload::CourseProgress(_) => SyncType::CourseProgress,
            SyncPayload::QuizSubmission(_) => SyncType::QuizSubmission,
            SyncPayload::UserProfile(_) => SyncType::UserProfile,
            SyncPayload::CourseEnrollment(_) => SyncType::CourseEnrollment,
            SyncPayload::Payment(_) => SyncType::Payment,
            SyncPayload::Notification(_) => SyncType::Notification,
            SyncPayload::ContentUpdate(_) => SyncType::ContentUpdate,
            SyncPayload::Analytics(_) => SyncType::Analytics,
        }
    }

    /// Returns true if this payload's variant matches the given type.
    pub fn matches(&self, sync_type: SyncType) -> bool {
        self.sync_type() == sync_type
    }

    /// Serializes the payload body to a JSON value for dispatch.
    ///
    /// The body is the inner struct only; the type tag travels in the
    /// dispatch path, not the body.
    pub fn to_body(&self) -> Value {
        let full = serde_json::to_value(self).unwrap_or(Value::Null);
        match full {
            Value::Object(mut map) => map.remove("body").unwrap_or(Value::Null),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_reports_matching_type() {
        let payload = SyncPayload::Payment(PaymentIntent {
            order_id: "ord-1".into(),
            amount_cents: 4999,
            currency: "USD".into(),
            method: "card".into(),
        });
        assert_eq!(payload.sync_type(), SyncType::Payment);
        assert!(payload.matches(SyncType::Payment));
        assert!(!payload.matches(SyncType::Analytics));
    }

    #[test]
    fn body_strips_the_type_tag() {
        let payload = SyncPayload::CourseProgress(ProgressUpdate {
            course_id: "rust-101".into(),
            lesson_id: "ownership".into(),
            percent_complete: 75.0,
            position_seconds: Some(120),
        });
        let body = payload.to_body();
        assert_eq!(body["course_id"], "rust-101");
        assert_eq!(body["percent_complete"], 75.0);
        assert!(body.get("kind").is_none());
    }

    #[test]
    fn payload_serde_round_trip() {
        let payload = SyncPayload::QuizSubmission(QuizAnswers {
            course_id: "rust-101".into(),
            quiz_id: "quiz-3".into(),
            answers: json!({"q1": "b", "q2": "a"}),
            score: Some(80.0),
            submitted_at_ms: 1_700_000_000_000,
        });
        let bytes = serde_json::to_vec(&payload).unwrap();
        let back: SyncPayload = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn every_variant_covers_a_distinct_type() {
        let payloads = [
            SyncPayload::CourseProgress(ProgressUpdate {
                course_id: String::new(),
                lesson_id: String::new(),
                percent_complete: 0.0,
                position_seconds: None,
            }),
            SyncPayload::QuizSubmission(QuizAnswers {
                course_id: String::new(),
                quiz_id: String::new(),
                answers: Value::Null,
                score: None,
                submitted_at_ms: 0,
            }),
            SyncPayload::UserProfile(ProfilePatch {
                fields: serde_json::Map::new(),
            }),
            SyncPayload::CourseEnrollment(EnrollmentRequest {
                course_id: String::new(),
                coupon_code: None,
            }),
            SyncPayload::Payment(PaymentIntent {
                order_id: String::new(),
                amount_cents: 0,
                currency: String::new(),
                method: String::new(),
            }),
            SyncPayload::Notification(NotificationState {
                notification_id: String::new(),
                read: false,
                dismissed: false,
            }),
            SyncPayload::ContentUpdate(ContentPatch {
                content_id: String::new(),
                revision: 0,
                body: Value::Null,
            }),
            SyncPayload::Analytics(AnalyticsEvent {
                event: String::new(),
                properties: Value::Null,
                occurred_at_ms: 0,
            }),
        ];

        let mut seen: Vec<SyncType> = payloads.iter().map(|p| p.sync_type()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), SyncType::ALL.len());
    }
}
