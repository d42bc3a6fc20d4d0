//! Snapshot encoding for the queue and history collections.
//!
//! Snapshots are versioned CBOR documents. The store holds them as opaque
//! bytes; this module is the only place that interprets them, shared by the
//! engine and the maintenance CLI.

use crate::error::{SyncError, SyncResult};
use learnsync_model::{SyncHistoryItem, SyncItem};
use serde::{Deserialize, Serialize};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct QueueSnapshot {
    version: u32,
    items: Vec<SyncItem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HistorySnapshot {
    version: u32,
    records: Vec<SyncHistoryItem>,
}

/// Encodes pending queue items to snapshot bytes.
pub fn encode_queue_snapshot(items: &[SyncItem]) -> SyncResult<Vec<u8>> {
    encode(&QueueSnapshot {
        version: SNAPSHOT_VERSION,
        items: items.to_vec(),
    })
}

/// Decodes queue items from snapshot bytes.
pub fn decode_queue_snapshot(bytes: &[u8]) -> SyncResult<Vec<SyncItem>> {
    let snapshot: QueueSnapshot = decode(bytes)?;
    check_version(snapshot.version)?;
    Ok(snapshot.items)
}

/// Encodes history records to snapshot bytes.
pub fn encode_history_snapshot(records: &[SyncHistoryItem]) -> SyncResult<Vec<u8>> {
    encode(&HistorySnapshot {
        version: SNAPSHOT_VERSION,
        records: records.to_vec(),
    })
}

/// Decodes history records from snapshot bytes.
pub fn decode_history_snapshot(bytes: &[u8]) -> SyncResult<Vec<SyncHistoryItem>> {
    let snapshot: HistorySnapshot = decode(bytes)?;
    check_version(snapshot.version)?;
    Ok(snapshot.records)
}

fn encode<T: Serialize>(value: &T) -> SyncResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| SyncError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> SyncResult<T> {
    ciborium::de::from_reader(bytes).map_err(|e| SyncError::Serialization(e.to_string()))
}

fn check_version(version: u32) -> SyncResult<()> {
    if version != SNAPSHOT_VERSION {
        return Err(SyncError::Serialization(format!(
            "unsupported snapshot version {version}, expected {SNAPSHOT_VERSION}"
        )));
    }
    Ok(())
}
