//! CLI command implementations.

pub mod clear;
pub mod history;
pub mod queue;
pub mod stats;

use learnsync_engine::{decode_history_snapshot, decode_queue_snapshot};
use learnsync_model::{SyncHistoryItem, SyncItem};
use learnsync_store::{FileStore, SnapshotStore};
use std::path::Path;

/// Store collection holding the queue snapshot.
pub const QUEUE_COLLECTION: &str = "sync_queue";
/// Store collection holding the history snapshot.
pub const HISTORY_COLLECTION: &str = "sync_history";

/// Shorthand for command results.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Loads pending queue items from the data directory, empty if absent.
pub async fn load_queue(path: &Path) -> Result<Vec<SyncItem>, Box<dyn std::error::Error>> {
    let store = FileStore::new(path);
    match store.get(QUEUE_COLLECTION).await? {
        Some(bytes) => Ok(decode_queue_snapshot(&bytes)?),
        None => Ok(Vec::new()),
    }
}

/// Loads history records from the data directory, empty if absent.
pub async fn load_history(
    path: &Path,
) -> Result<Vec<SyncHistoryItem>, Box<dyn std::error::Error>> {
    let store = FileStore::new(path);
    match store.get(HISTORY_COLLECTION).await? {
        Some(bytes) => Ok(decode_history_snapshot(&bytes)?),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnsync_engine::{encode_history_snapshot, encode_queue_snapshot};
    use learnsync_model::{
        now_millis, AnalyticsEvent, ConflictPolicy, SyncPayload, SyncPriority, SyncStatus,
        SyncType,
    };
    use uuid::Uuid;

    #[tokio::test]
    async fn missing_snapshots_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_queue(dir.path()).await.unwrap().is_empty());
        assert!(load_history(dir.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn snapshots_round_trip_through_the_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let item = SyncItem {
            id: Uuid::new_v4(),
            sync_type: SyncType::Analytics,
            action: "track_event".into(),
            payload: SyncPayload::Analytics(AnalyticsEvent {
                event: "page_view".into(),
                properties: serde_json::json!({}),
                occurred_at_ms: now_millis(),
            }),
            priority: SyncPriority::Low,
            retry_count: 0,
            max_retries: 1,
            dependencies: Vec::new(),
            conflict_resolution: ConflictPolicy::ClientWins,
            enqueued_at_ms: now_millis(),
            metadata: Default::default(),
        };
        let record = SyncHistoryItem {
            id: Uuid::new_v4(),
            sync_item_id: item.id,
            sync_type: item.sync_type,
            status: SyncStatus::Success,
            timestamp_ms: now_millis(),
            duration_ms: 3,
            error: None,
            retry_count: 0,
            data: None,
        };

        store
            .put(
                QUEUE_COLLECTION,
                &encode_queue_snapshot(std::slice::from_ref(&item)).unwrap(),
            )
            .await
            .unwrap();
        store
            .put(
                HISTORY_COLLECTION,
                &encode_history_snapshot(std::slice::from_ref(&record)).unwrap(),
            )
            .await
            .unwrap();

        let items = load_queue(dir.path()).await.unwrap();
        assert_eq!(items, vec![item]);
        let records = load_history(dir.path()).await.unwrap();
        assert_eq!(records, vec![record]);
    }
}
