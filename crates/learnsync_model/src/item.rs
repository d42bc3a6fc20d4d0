//! Sync items: the unit of pending work.

use crate::conflict::ConflictPolicy;
use crate::payload::SyncPayload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// The closed set of data classes the engine synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    /// Lesson/video progress updates.
    CourseProgress,
    /// Quiz answer submissions.
    QuizSubmission,
    /// User profile edits.
    UserProfile,
    /// Course enrollments.
    CourseEnrollment,
    /// Payment submissions.
    Payment,
    /// Notification read/dismiss state.
    Notification,
    /// Instructor content edits.
    ContentUpdate,
    /// Telemetry events.
    Analytics,
}

impl SyncType {
    /// All sync types, in declaration order.
    pub const ALL: [SyncType; 8] = [
        SyncType::CourseProgress,
        SyncType::QuizSubmission,
        SyncType::UserProfile,
        SyncType::CourseEnrollment,
        SyncType::Payment,
        SyncType::Notification,
        SyncType::ContentUpdate,
        SyncType::Analytics,
    ];

    /// Returns the wire name of this type (also the dispatch path segment).
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::CourseProgress => "course_progress",
            SyncType::QuizSubmission => "quiz_submission",
            SyncType::UserProfile => "user_profile",
            SyncType::CourseEnrollment => "course_enrollment",
            SyncType::Payment => "payment",
            SyncType::Notification => "notification",
            SyncType::ContentUpdate => "content_update",
            SyncType::Analytics => "analytics",
        }
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown sync type: {s}"))
    }
}

/// Priority band governing scheduling order and overflow eviction.
///
/// The derived ordering puts `Critical` first, so sorting ascending yields
/// the most urgent work at the front.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SyncPriority {
    /// Must never be silently dropped (payments, quiz submissions).
    Critical,
    /// User-visible soon (progress, enrollment).
    High,
    /// Ordinary background work.
    #[default]
    Normal,
    /// Best-effort, user-invisible (analytics, notifications).
    Low,
}

impl SyncPriority {
    /// Returns the wire name of this priority.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPriority::Critical => "critical",
            SyncPriority::High => "high",
            SyncPriority::Normal => "normal",
            SyncPriority::Low => "low",
        }
    }
}

impl fmt::Display for SyncPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single queued mutation awaiting delivery to the remote authority.
///
/// # Invariants
///
/// - `retry_count <= max_retries`; once the ceiling is reached the item is
///   terminally failed and never re-queued
/// - `id` and `enqueued_at_ms` are stamped once, at enqueue time
/// - `dependencies` reference ids previously returned by the enqueue API;
///   they are validated lazily at dispatch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncItem {
    /// Unique item id, generated at enqueue time.
    pub id: Uuid,
    /// The data class of this mutation.
    pub sync_type: SyncType,
    /// Short verb describing the mutation ("update_progress", "submit_quiz", ...).
    pub action: String,
    /// The typed payload delivered to the remote.
    pub payload: SyncPayload,
    /// Scheduling priority, fixed at enqueue time.
    pub priority: SyncPriority,
    /// Retry attempts consumed so far.
    pub retry_count: u32,
    /// Retry ceiling, taken from the type's strategy unless overridden.
    pub max_retries: u32,
    /// Ids of items that must have succeeded before this one may dispatch.
    pub dependencies: Vec<Uuid>,
    /// Conflict resolution policy applied when the remote version diverges.
    pub conflict_resolution: ConflictPolicy,
    /// Enqueue time in epoch milliseconds; tie-breaker within a priority band.
    pub enqueued_at_ms: u64,
    /// Free-form observability context (e.g. the related course id).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl SyncItem {
    /// The key the scheduler sorts by: priority band, then enqueue time.
    pub fn schedule_key(&self) -> (SyncPriority, u64) {
        (self.priority, self.enqueued_at_ms)
    }

    /// Returns true if this item may still be retried.
    pub fn has_retries_left(&self) -> bool {
        self.retry_count < self.max_retries
    }
}
