//! # learnsync Engine
//!
//! Offline-first background synchronization engine for the learnsync client.
//!
//! This crate provides:
//! - A priority/dependency-aware scheduler and batcher
//! - Per-type retry policies with exponential backoff and jitter
//! - Mechanical conflict resolution per data class
//! - Durable persistence of the pending queue and a bounded audit history
//! - Statistics derived from that history
//! - A typed facade for enqueueing domain-specific work
//!
//! ## Architecture
//!
//! The engine is a single logical actor: a caller enqueues a sync item, the
//! scheduler wakes if idle, selects a bounded batch respecting priority and
//! concurrency, gates each item on its dependencies, dispatches the batch
//! concurrently through the abstract transport boundary, records every
//! outcome in history, and hands failures to the retry controller. The loop
//! drains cycles until the queue is empty.
//!
//! ## Key Invariants
//!
//! - At most one sync run is ever in flight (`is_syncing` guard)
//! - An item removed from the queue for dispatch never reappears there
//!   until the retry controller re-enqueues it explicitly
//! - `retry_count` never exceeds the type's `max_retries`; exhaustion is
//!   terminal and isolated - it never halts other queued items
//! - Every queue or history mutation is mirrored to the snapshot store, so
//!   a crash loses at most the in-flight batch, never the backlog
//! - Statistics are derived purely from history records

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
pub mod facade;
mod http;
mod queue;
mod snapshot;
mod transport;

pub use config::{EngineConfig, RetryPolicy};
pub use engine::{NewSyncItem, SyncEngine, SyncStats};
pub use error::{SyncError, SyncResult};
pub use http::{HttpClient, HttpResponse, HttpTransport, LoopbackClient, LoopbackServer};
pub use queue::SyncQueue;
pub use snapshot::{
    decode_history_snapshot, decode_queue_snapshot, encode_history_snapshot,
    encode_queue_snapshot, SNAPSHOT_VERSION,
};
pub use transport::{DispatchOutcome, MockBehavior, MockTransport, SyncTransport};
