//! Sync history: immutable per-attempt records and derived statistics.
//!
//! History is the sole source of truth for statistics and for dependency
//! satisfaction checks. It grows monotonically during a session and is
//! capped; the oldest records are evicted FIFO once the bound is exceeded.

use crate::item::SyncType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// One day in milliseconds.
pub const DAY_MS: u64 = 24 * 60 * 60 * 1000;
/// One week in milliseconds.
pub const WEEK_MS: u64 = 7 * DAY_MS;

/// Default bound on retained history records.
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Outcome of one sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// The attempt delivered the item.
    Success,
    /// Retries exhausted (or a fatal error); the item was abandoned.
    Failed,
    /// The remote version diverged; the conflict policy was applied.
    Conflict,
    /// The attempt failed and a retry was scheduled.
    Retry,
}

impl SyncStatus {
    /// Returns the wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
            SyncStatus::Conflict => "conflict",
            SyncStatus::Retry => "retry",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable record of one sync attempt.
///
/// An item retried three times produces three `Retry` records plus a
/// terminal one; records are never mutated after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncHistoryItem {
    /// Unique record id.
    pub id: Uuid,
    /// The sync item this attempt belongs to.
    pub sync_item_id: Uuid,
    /// The item's data class.
    pub sync_type: SyncType,
    /// Attempt outcome.
    pub status: SyncStatus,
    /// Attempt time in epoch milliseconds.
    pub timestamp_ms: u64,
    /// Attempt duration in milliseconds.
    pub duration_ms: u64,
    /// Error description for failed/retried attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The item's retry count at the time of this attempt.
    pub retry_count: u32,
    /// A copy of the attempt's result or input data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Per-type success/failure tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeStats {
    /// Success records for this type.
    pub success: u64,
    /// Failed records for this type.
    pub failed: u64,
    /// All records for this type.
    pub total: u64,
}

/// Statistics derived purely from history records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryStats {
    /// All-time success records.
    pub total_synced: u64,
    /// Success records in the last 24 hours.
    pub synced_last_24_hours: u64,
    /// Success records in the last 7 days.
    pub synced_last_7_days: u64,
    /// `total_synced / total records * 100`; 0 when history is empty.
    pub success_rate: f64,
    /// Per-type tallies across all history.
    pub by_type: BTreeMap<SyncType, TypeStats>,
    /// The last 10 failed records from the last 24 hours, most-recent-last.
    pub recent_failures: Vec<SyncHistoryItem>,
}

/// Bounded, append-only container of history records.
#[derive(Debug, Clone)]
pub struct SyncHistory {
    records: VecDeque<SyncHistoryItem>,
    limit: usize,
}

impl SyncHistory {
    /// Creates an empty history with the given retention bound.
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Rebuilds a history from persisted records, applying the bound.
    pub fn with_records(limit: usize, records: Vec<SyncHistoryItem>) -> Self {
        let mut history = Self::new(limit);
        for record in records {
            history.push(record);
        }
        history
    }

    /// Appends a record, evicting the oldest once over the bound.
    pub fn push(&mut self, record: SyncHistoryItem) {
        self.records.push_back(record);
        while self.records.len() > self.limit {
            self.records.pop_front();
        }
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Discards all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Iterates records oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &SyncHistoryItem> {
        self.records.iter()
    }

    /// Clones the retained records for persistence.
    pub fn snapshot(&self) -> Vec<SyncHistoryItem> {
        self.records.iter().cloned().collect()
    }

    /// Returns true if a `Success` record exists for the given item id.
    ///
    /// This is the dependency-satisfaction check: a dependency is satisfied
    /// iff its item has a recorded successful outcome.
    pub fn has_success_for(&self, sync_item_id: Uuid) -> bool {
        self.records
            .iter()
            .any(|r| r.sync_item_id == sync_item_id && r.status == SyncStatus::Success)
    }

    /// Derives statistics from the retained records, anchored to `now_ms`.
    pub fn stats(&self, now_ms: u64) -> HistoryStats {
        let total_records = self.records.len() as u64;
        let day_floor = now_ms.saturating_sub(DAY_MS);
        let week_floor = now_ms.saturating_sub(WEEK_MS);

        let mut stats = HistoryStats::default();
        for record in &self.records {
            let entry = stats.by_type.entry(record.sync_type).or_default();
            entry.total += 1;
            match record.status {
                SyncStatus::Success => {
                    entry.success += 1;
                    stats.total_synced += 1;
                    if record.timestamp_ms >= day_floor {
                        stats.synced_last_24_hours += 1;
                    }
                    if record.timestamp_ms >= week_floor {
                        stats.synced_last_7_days += 1;
                    }
                }
                SyncStatus::Failed => {
                    entry.failed += 1;
                    if record.timestamp_ms >= day_floor {
                        stats.recent_failures.push(record.clone());
                    }
                }
                SyncStatus::Conflict | SyncStatus::Retry => {}
            }
        }

        // Keep only the 10 most recent failures, most-recent-last
        if stats.recent_failures.len() > 10 {
            let skip = stats.recent_failures.len() - 10;
            stats.recent_failures.drain(..skip);
        }

        if total_records > 0 {
            stats.success_rate = stats.total_synced as f64 / total_records as f64 * 100.0;
        }

        stats
    }
}

impl Default for SyncHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(status: SyncStatus, sync_type: SyncType, timestamp_ms: u64) -> SyncHistoryItem {
        SyncHistoryItem {
            id: Uuid::new_v4(),
            sync_item_id: Uuid::new_v4(),
            sync_type,
            status,
            timestamp_ms,
            duration_ms: 5,
            error: None,
            retry_count: 0,
            data: None,
        }
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let mut history = SyncHistory::new(3);
        let first = make_record(SyncStatus::Success, SyncType::Analytics, 1);
        let first_id = first.id;
        history.push(first);
        for ts in 2..=4 {
            history.push(make_record(SyncStatus::Success, SyncType::Analytics, ts));
        }

        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|r| r.id != first_id));
        assert_eq!(history.iter().next().unwrap().timestamp_ms, 2);
    }

    #[test]
    fn success_rate_has_no_zero_division() {
        let history = SyncHistory::new(10);
        let stats = history.stats(now_millis());
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.total_synced, 0);
    }

    #[test]
    fn success_rate_counts_all_records() {
        let mut history = SyncHistory::new(10);
        let now = now_millis();
        history.push(make_record(SyncStatus::Success, SyncType::Payment, now));
        history.push(make_record(SyncStatus::Retry, SyncType::Payment, now));
        history.push(make_record(SyncStatus::Failed, SyncType::Payment, now));
        history.push(make_record(SyncStatus::Success, SyncType::Analytics, now));

        let stats = history.stats(now);
        assert_eq!(stats.total_synced, 2);
        assert_eq!(stats.success_rate, 50.0);
    }

    #[test]
    fn sliding_windows_anchor_to_now() {
        let mut history = SyncHistory::new(10);
        let now = now_millis();
        history.push(make_record(SyncStatus::Success, SyncType::Analytics, now));
        history.push(make_record(
            SyncStatus::Success,
            SyncType::Analytics,
            now - DAY_MS - 1,
        ));
        history.push(make_record(
            SyncStatus::Success,
            SyncType::Analytics,
            now - WEEK_MS - 1,
        ));

        let stats = history.stats(now);
        assert_eq!(stats.total_synced, 3);
        assert_eq!(stats.synced_last_24_hours, 1);
        assert_eq!(stats.synced_last_7_days, 2);
    }

    #[test]
    fn by_type_tallies_success_failed_total() {
        let mut history = SyncHistory::new(10);
        let now = now_millis();
        history.push(make_record(SyncStatus::Success, SyncType::Payment, now));
        history.push(make_record(SyncStatus::Failed, SyncType::Payment, now));
        history.push(make_record(SyncStatus::Retry, SyncType::Payment, now));

        let stats = history.stats(now);
        let payment = stats.by_type[&SyncType::Payment];
        assert_eq!(payment.success, 1);
        assert_eq!(payment.failed, 1);
        assert_eq!(payment.total, 3);
    }

    #[test]
    fn recent_failures_keeps_last_ten_within_a_day() {
        let mut history = SyncHistory::new(100);
        let now = now_millis();
        // One stale failure outside the window
        history.push(make_record(
            SyncStatus::Failed,
            SyncType::Notification,
            now - DAY_MS - 1,
        ));
        for i in 0..12 {
            history.push(make_record(
                SyncStatus::Failed,
                SyncType::Notification,
                now - 12 + i,
            ));
        }

        let stats = history.stats(now);
        assert_eq!(stats.recent_failures.len(), 10);
        // Most-recent-last ordering
        let timestamps: Vec<u64> = stats.recent_failures.iter().map(|r| r.timestamp_ms).collect();
        let mut sorted = timestamps.clone();
        sorted.sort();
        assert_eq!(timestamps, sorted);
        assert_eq!(*timestamps.last().unwrap(), now - 1);
    }

    #[test]
    fn dependency_satisfaction_requires_a_success_record() {
        let mut history = SyncHistory::new(10);
        let item_id = Uuid::new_v4();

        let mut retry = make_record(SyncStatus::Retry, SyncType::Payment, 1);
        retry.sync_item_id = item_id;
        history.push(retry);
        assert!(!history.has_success_for(item_id));

        let mut success = make_record(SyncStatus::Success, SyncType::Payment, 2);
        success.sync_item_id = item_id;
        history.push(success);
        assert!(history.has_success_for(item_id));
    }

    #[test]
    fn restore_round_trip() {
        let mut history = SyncHistory::new(10);
        let now = now_millis();
        history.push(make_record(SyncStatus::Success, SyncType::Payment, now));
        history.push(make_record(SyncStatus::Failed, SyncType::Analytics, now));

        let restored = SyncHistory::with_records(10, history.snapshot());
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.snapshot(), history.snapshot());
    }
}
