//! The sync strategy table.
//!
//! A fixed mapping from [`SyncType`] to scheduling, retry, timeout, and
//! conflict-resolution defaults. The table is configuration, not runtime
//! state: it is built once and is immutable for the process lifetime.

use crate::conflict::ConflictPolicy;
use crate::item::{SyncPriority, SyncType};
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-type sync behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStrategy {
    /// Whether items of this type are dispatched at all. Disabled types
    /// stay queued and are skipped by the batcher.
    pub enabled: bool,
    /// Default priority for items of this type.
    pub priority: SyncPriority,
    /// Retry ceiling for items of this type.
    pub max_retries: u32,
    /// Dispatch timeout; a slower call is aborted and treated as a failure.
    pub timeout: Duration,
    /// Default conflict resolution policy.
    pub conflict_resolution: ConflictPolicy,
    /// Whether items of this type honor the dependency graph.
    pub gate_on_dependencies: bool,
    /// Preferred dispatch chunk for this type, surfaced for observability.
    pub batch_size: usize,
}

/// The immutable per-type strategy table.
///
/// Embedded invariants: `Payment` and `QuizSubmission` carry the highest
/// retry ceilings and timeouts (financial/assessment correctness must not
/// be silently dropped); `Analytics` and `Notification` carry the lowest
/// (best-effort, user-invisible).
#[derive(Debug, Clone, PartialEq)]
pub struct SyncStrategies {
    table: BTreeMap<SyncType, SyncStrategy>,
}

impl SyncStrategies {
    /// Looks up the strategy for a type. Every type has an entry.
    pub fn for_type(&self, sync_type: SyncType) -> &SyncStrategy {
        // The constructor populates all variants; the table is total.
        &self.table[&sync_type]
    }

    /// Replaces a single type's strategy. Intended for tests and for hosts
    /// that must tune one data class without rebuilding the table.
    #[must_use]
    pub fn with_strategy(mut self, sync_type: SyncType, strategy: SyncStrategy) -> Self {
        self.table.insert(sync_type, strategy);
        self
    }

    /// Iterates over all (type, strategy) entries in type order.
    pub fn iter(&self) -> impl Iterator<Item = (SyncType, &SyncStrategy)> {
        self.table.iter().map(|(t, s)| (*t, s))
    }
}

impl Default for SyncStrategies {
    fn default() -> Self {
        let mut table = BTreeMap::new();

        table.insert(
            SyncType::CourseProgress,
            SyncStrategy {
                enabled: true,
                priority: SyncPriority::High,
                max_retries: 5,
                timeout: Duration::from_secs(10),
                conflict_resolution: ConflictPolicy::LastWriteWins,
                gate_on_dependencies: false,
                batch_size: 10,
            },
        );
        table.insert(
            SyncType::QuizSubmission,
            SyncStrategy {
                enabled: true,
                priority: SyncPriority::Critical,
                max_retries: 10,
                timeout: Duration::from_secs(30),
                conflict_resolution: ConflictPolicy::ServerWins,
                gate_on_dependencies: true,
                batch_size: 5,
            },
        );
        table.insert(
            SyncType::UserProfile,
            SyncStrategy {
                enabled: true,
                priority: SyncPriority::Normal,
                max_retries: 3,
                timeout: Duration::from_secs(15),
                conflict_resolution: ConflictPolicy::Merge,
                gate_on_dependencies: false,
                batch_size: 3,
            },
        );
        table.insert(
            SyncType::CourseEnrollment,
            SyncStrategy {
                enabled: true,
                priority: SyncPriority::High,
                max_retries: 7,
                timeout: Duration::from_secs(20),
                conflict_resolution: ConflictPolicy::ServerWins,
                gate_on_dependencies: true,
                batch_size: 5,
            },
        );
        table.insert(
            SyncType::Payment,
            SyncStrategy {
                enabled: true,
                priority: SyncPriority::Critical,
                max_retries: 10,
                timeout: Duration::from_secs(60),
                conflict_resolution: ConflictPolicy::ServerWins,
                gate_on_dependencies: true,
                batch_size: 1,
            },
        );
        table.insert(
            SyncType::Notification,
            SyncStrategy {
                enabled: true,
                priority: SyncPriority::Low,
                max_retries: 2,
                timeout: Duration::from_secs(5),
                conflict_resolution: ConflictPolicy::ClientWins,
                gate_on_dependencies: false,
                batch_size: 20,
            },
        );
        table.insert(
            SyncType::ContentUpdate,
            SyncStrategy {
                enabled: true,
                priority: SyncPriority::Normal,
                max_retries: 5,
                timeout: Duration::from_secs(30),
                conflict_resolution: ConflictPolicy::ServerWins,
                gate_on_dependencies: false,
                batch_size: 10,
            },
        );
        table.insert(
            SyncType::Analytics,
            SyncStrategy {
                enabled: true,
                priority: SyncPriority::Low,
                max_retries: 1,
                timeout: Duration::from_secs(5),
                conflict_resolution: ConflictPolicy::ClientWins,
                gate_on_dependencies: false,
                batch_size: 50,
            },
        );

        Self { table }
    }
}
