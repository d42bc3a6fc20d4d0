//! # learnsync Model
//!
//! Data model for the learnsync background synchronization engine.
//!
//! This crate defines:
//! - Sync items: typed, prioritized, retry-aware mutation descriptors
//! - Typed payloads, one variant per data class
//! - The sync strategy table (per-type scheduling/retry/conflict policy)
//! - Conflict policies and the mechanical resolver
//! - History records and the bounded history container with stats derivation
//!
//! ## Key Invariants
//!
//! - `retry_count` never exceeds `max_retries`; exceeding is terminal
//! - The strategy table is loaded once and immutable for the process lifetime
//! - History records are immutable; the container evicts FIFO past its cap
//! - Statistics are derived purely from history records

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod conflict;
mod history;
mod item;
mod payload;
mod strategy;

pub use conflict::{ConflictPolicy, Resolution};
pub use history::{
    now_millis, HistoryStats, SyncHistory, SyncHistoryItem, SyncStatus, TypeStats,
    DAY_MS, DEFAULT_HISTORY_LIMIT, WEEK_MS,
};
pub use item::{SyncItem, SyncPriority, SyncType};
pub use payload::{
    AnalyticsEvent, ContentPatch, EnrollmentRequest, NotificationState, PaymentIntent,
    ProfilePatch, ProgressUpdate, QuizAnswers, SyncPayload,
};
pub use strategy::{SyncStrategies, SyncStrategy};
