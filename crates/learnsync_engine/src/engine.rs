//! The background sync engine.

use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::queue::SyncQueue;
use crate::snapshot;
use crate::transport::{DispatchOutcome, SyncTransport};
use learnsync_model::{
    now_millis, ConflictPolicy, HistoryStats, SyncHistory, SyncHistoryItem, SyncItem, SyncPayload,
    SyncPriority, SyncStatus, SyncStrategies, SyncStrategy, SyncType, TypeStats,
};
use learnsync_store::SnapshotStore;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A sync item as callers describe it: type, action, payload, and optional
/// overrides. Id, timestamp, and retry state are stamped by the engine.
#[derive(Debug, Clone)]
pub struct NewSyncItem {
    /// The data class of the mutation.
    pub sync_type: SyncType,
    /// Short verb describing the mutation.
    pub action: String,
    /// The typed payload; its variant must match `sync_type`.
    pub payload: SyncPayload,
    /// Priority override; defaults to the type's strategy.
    pub priority: Option<SyncPriority>,
    /// Retry-ceiling override; defaults to the type's strategy.
    pub max_retries: Option<u32>,
    /// Conflict-policy override; defaults to the type's strategy.
    pub conflict_resolution: Option<ConflictPolicy>,
    /// Ids of items that must succeed before this one dispatches.
    pub dependencies: Vec<Uuid>,
    /// Free-form observability context.
    pub metadata: BTreeMap<String, String>,
}

impl NewSyncItem {
    /// Creates a new item description with no overrides.
    pub fn new(
        sync_type: SyncType,
        action: impl Into<String>,
        payload: SyncPayload,
    ) -> Self {
        Self {
            sync_type,
            action: action.into(),
            payload,
            priority: None,
            max_retries: None,
            conflict_resolution: None,
            dependencies: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Overrides the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: SyncPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Overrides the retry ceiling.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Overrides the conflict policy.
    #[must_use]
    pub fn with_conflict_resolution(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_resolution = Some(policy);
        self
    }

    /// Sets the dependency list.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<Uuid>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Adds one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A point-in-time view of engine state and history-derived statistics.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStats {
    /// Current pending count.
    pub queue_size: usize,
    /// Whether a sync run is in flight.
    pub is_syncing: bool,
    /// All-time success records.
    pub total_synced: u64,
    /// Success records in the last 24 hours.
    pub synced_last_24_hours: u64,
    /// Success records in the last 7 days.
    pub synced_last_7_days: u64,
    /// Success records / total records * 100; 0 when history is empty.
    pub success_rate: f64,
    /// Per-type tallies across all history.
    pub by_type: BTreeMap<SyncType, TypeStats>,
    /// The last 10 failed records from the last 24 hours, most-recent-last.
    pub recent_failures: Vec<SyncHistoryItem>,
}

/// The background sync engine.
///
/// An explicitly constructed, dependency-injected service instance: the
/// host's composition root owns it behind an [`Arc`] and hands it to the
/// application. At most one sync run is in flight per instance.
///
/// # Example
///
/// ```no_run
/// use learnsync_engine::{EngineConfig, MockTransport, SyncEngine};
/// use learnsync_model::SyncStrategies;
/// use learnsync_store::MemoryStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let engine = SyncEngine::new(
///     EngineConfig::default(),
///     SyncStrategies::default(),
///     MemoryStore::new(),
///     MockTransport::new(),
/// );
/// engine.restore().await.unwrap();
/// # }
/// ```
pub struct SyncEngine<S: SnapshotStore, T: SyncTransport> {
    config: EngineConfig,
    strategies: SyncStrategies,
    store: S,
    transport: Arc<T>,
    queue: Mutex<SyncQueue>,
    history: Mutex<SyncHistory>,
    is_syncing: AtomicBool,
    retry_timers: Mutex<Vec<JoinHandle<()>>>,
    me: Weak<Self>,
}

impl<S: SnapshotStore, T: SyncTransport> SyncEngine<S, T> {
    /// Creates a new engine over the given store and transport.
    ///
    /// Call [`SyncEngine::restore`] afterwards to reload persisted state.
    pub fn new(
        config: EngineConfig,
        strategies: SyncStrategies,
        store: S,
        transport: T,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            queue: Mutex::new(SyncQueue::new(config.max_queue_size)),
            history: Mutex::new(SyncHistory::new(config.history_limit)),
            config,
            strategies,
            store,
            transport: Arc::new(transport),
            is_syncing: AtomicBool::new(false),
            retry_timers: Mutex::new(Vec::new()),
            me: me.clone(),
        })
    }

    /// The engine's strategy table.
    pub fn strategies(&self) -> &SyncStrategies {
        &self.strategies
    }

    /// Current pending count.
    pub fn queue_size(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether a sync run is in flight.
    pub fn is_syncing(&self) -> bool {
        self.is_syncing.load(Ordering::SeqCst)
    }

    /// A copy of the pending items, in insertion order.
    pub fn pending_items(&self) -> Vec<SyncItem> {
        self.queue.lock().items().to_vec()
    }

    /// Number of retry timers that have not fired yet.
    pub fn pending_retries(&self) -> usize {
        self.retry_timers
            .lock()
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Reloads the queue and history snapshots from the store.
    ///
    /// Missing collections are treated as empty (first run on this device).
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a snapshot cannot be decoded.
    pub async fn restore(&self) -> SyncResult<()> {
        if let Some(bytes) = self.store.get(&self.config.queue_collection).await? {
            let items = snapshot::decode_queue_snapshot(&bytes)?;
            info!(items = items.len(), "restored pending sync queue");
            self.queue.lock().restore(items);
        }
        if let Some(bytes) = self.store.get(&self.config.history_collection).await? {
            let records = snapshot::decode_history_snapshot(&bytes)?;
            info!(records = records.len(), "restored sync history");
            *self.history.lock() = SyncHistory::with_records(self.config.history_limit, records);
        }
        Ok(())
    }

    /// Enqueues a sync item and returns its id.
    ///
    /// The item's priority, retry ceiling, and conflict policy default to
    /// its type's strategy. The queue mutation is persisted before this
    /// returns, and a sync run is started if the engine is idle (unless
    /// `auto_start` is off). Dispatch outcomes are never reported here -
    /// they are observable through [`SyncEngine::get_sync_stats`].
    ///
    /// # Errors
    ///
    /// Fails only on misuse: a payload whose variant does not match the
    /// declared type.
    pub async fn enqueue(&self, new_item: NewSyncItem) -> SyncResult<Uuid> {
        if !new_item.payload.matches(new_item.sync_type) {
            return Err(SyncError::PayloadMismatch {
                expected: new_item.sync_type,
                found: new_item.payload.sync_type(),
            });
        }

        let strategy = self.strategies.for_type(new_item.sync_type);
        let item = SyncItem {
            id: Uuid::new_v4(),
            sync_type: new_item.sync_type,
            action: new_item.action,
            payload: new_item.payload,
            priority: new_item.priority.unwrap_or(strategy.priority),
            retry_count: 0,
            max_retries: new_item.max_retries.unwrap_or(strategy.max_retries),
            dependencies: new_item.dependencies,
            conflict_resolution: new_item
                .conflict_resolution
                .unwrap_or(strategy.conflict_resolution),
            enqueued_at_ms: now_millis(),
            metadata: new_item.metadata,
        };
        let id = item.id;
        debug!(item = %id, sync_type = %item.sync_type, priority = %item.priority, "enqueued");

        let evicted = self.queue.lock().push(item);
        if let Some(evicted) = evicted {
            warn!(
                item = %evicted.id,
                priority = %evicted.priority,
                "queue at capacity; dropped lowest-priority item"
            );
        }
        self.persist_queue().await;

        if self.config.auto_start {
            self.start_sync();
        }
        Ok(id)
    }

    /// Starts a sync run if none is active. Idempotent: calling this while
    /// a run is in progress is a no-op.
    pub fn start_sync(&self) {
        let Some(engine) = self.me.upgrade() else {
            return;
        };
        if self
            .is_syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("sync already in progress");
            return;
        }
        tokio::spawn(async move {
            engine.run_loop().await;
            engine.is_syncing.store(false, Ordering::SeqCst);
            // Work enqueued between the last empty batch and the flag reset
            // would otherwise wait for the next trigger
            let pending = engine.queue.lock().has_dispatchable(&engine.strategies);
            if pending {
                engine.start_sync();
            }
        });
    }

    /// Drains the queue in batches until empty.
    async fn run_loop(&self) {
        info!("sync run started");
        loop {
            let batch = self
                .queue
                .lock()
                .take_batch(self.config.max_concurrent_syncs, &self.strategies);
            if batch.is_empty() {
                break;
            }
            debug!(size = batch.len(), "dispatching batch");
            // Admitted items already left the queue; persist so a crash
            // cannot re-deliver and a concurrent enqueue cannot double-schedule
            self.persist_queue().await;

            let mut inflight = JoinSet::new();
            for item in batch {
                let Some(engine) = self.me.upgrade() else {
                    return;
                };
                inflight.spawn(async move { engine.dispatch_one(item).await });
            }
            while let Some(joined) = inflight.join_next().await {
                if let Err(e) = joined {
                    // A panicking dispatch must not halt the run
                    warn!(error = %e, "dispatch task aborted");
                }
            }
            self.persist_history().await;
        }
        info!("sync run complete");
    }

    /// Dispatches one item and routes its outcome.
    async fn dispatch_one(&self, item: SyncItem) {
        let strategy = self.strategies.for_type(item.sync_type);
        let started = Instant::now();
        let outcome = self.attempt(&item, strategy).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(DispatchOutcome::Success(data)) => {
                debug!(item = %item.id, sync_type = %item.sync_type, "sync succeeded");
                self.record(&item, SyncStatus::Success, duration_ms, None, data);
            }
            Ok(DispatchOutcome::Conflict {
                remote,
                remote_timestamp_ms,
            }) => {
                self.resolve_conflict(item, remote, remote_timestamp_ms, duration_ms);
            }
            Err(error) => self.handle_failure(item, error, duration_ms),
        }
    }

    /// One dispatch attempt: dependency gate, then transport under timeout.
    async fn attempt(
        &self,
        item: &SyncItem,
        strategy: &SyncStrategy,
    ) -> SyncResult<DispatchOutcome> {
        if strategy.gate_on_dependencies {
            self.check_dependencies(item)?;
        }
        match tokio::time::timeout(
            strategy.timeout,
            self.transport.dispatch(item, strategy.timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout {
                timeout_ms: strategy.timeout.as_millis() as u64,
            }),
        }
    }

    /// A dependency is satisfied iff history holds a success record for it.
    fn check_dependencies(&self, item: &SyncItem) -> SyncResult<()> {
        let history = self.history.lock();
        for dependency in &item.dependencies {
            if !history.has_success_for(*dependency) {
                return Err(SyncError::DependencyNotMet {
                    item: item.id,
                    dependency: *dependency,
                });
            }
        }
        Ok(())
    }

    /// Applies the item's conflict policy to a divergent remote version.
    fn resolve_conflict(
        &self,
        item: SyncItem,
        remote: Value,
        remote_timestamp_ms: u64,
        duration_ms: u64,
    ) {
        let local = item.payload.to_body();
        let resolution = item.conflict_resolution.resolve(
            &local,
            &remote,
            item.enqueued_at_ms,
            remote_timestamp_ms,
        );

        match resolution.winner(&local, &remote) {
            Some(winner) => {
                debug!(
                    item = %item.id,
                    policy = %item.conflict_resolution,
                    "conflict auto-resolved"
                );
                self.record(
                    &item,
                    SyncStatus::Conflict,
                    duration_ms,
                    None,
                    Some(json!({ "local": local, "remote": remote, "resolved": winner })),
                );
                // The resolved value is the delivered state; dependents of
                // this item unblock on the success record
                self.record(&item, SyncStatus::Success, duration_ms, None, Some(winner));
            }
            None => {
                warn!(item = %item.id, "conflict requires manual resolution; item finalized");
                self.record(
                    &item,
                    SyncStatus::Conflict,
                    duration_ms,
                    Some(SyncError::UnresolvedConflict(item.id).to_string()),
                    Some(json!({ "local": local, "remote": remote })),
                );
            }
        }
    }

    /// Retry controller: re-queue with backoff, or finalize as failed.
    fn handle_failure(&self, mut item: SyncItem, error: SyncError, duration_ms: u64) {
        if error.is_retryable() && item.has_retries_left() {
            item.retry_count += 1;
            self.record(
                &item,
                SyncStatus::Retry,
                duration_ms,
                Some(error.to_string()),
                None,
            );
            let delay = self.config.retry.delay_for_retry(item.retry_count);
            debug!(
                item = %item.id,
                retry = item.retry_count,
                max = item.max_retries,
                delay_ms = delay.as_millis() as u64,
                "scheduling retry"
            );
            let weak = self.me.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(engine) = weak.upgrade() {
                    engine.requeue(item).await;
                }
            });
            let mut timers = self.retry_timers.lock();
            timers.retain(|h| !h.is_finished());
            timers.push(handle);
        } else {
            warn!(
                item = %item.id,
                sync_type = %item.sync_type,
                retries = item.retry_count,
                error = %error,
                "sync abandoned"
            );
            self.record(
                &item,
                SyncStatus::Failed,
                duration_ms,
                Some(error.to_string()),
                None,
            );
        }
    }

    /// Re-inserts a retried item and restarts the loop if idle.
    async fn requeue(&self, item: SyncItem) {
        debug!(item = %item.id, retry = item.retry_count, "retry timer fired; re-enqueueing");
        let evicted = self.queue.lock().push(item);
        if let Some(evicted) = evicted {
            warn!(
                item = %evicted.id,
                priority = %evicted.priority,
                "queue at capacity during retry; dropped lowest-priority item"
            );
        }
        self.persist_queue().await;
        self.start_sync();
    }

    /// Appends one history record.
    fn record(
        &self,
        item: &SyncItem,
        status: SyncStatus,
        duration_ms: u64,
        error: Option<String>,
        data: Option<Value>,
    ) {
        let record = SyncHistoryItem {
            id: Uuid::new_v4(),
            sync_item_id: item.id,
            sync_type: item.sync_type,
            status,
            timestamp_ms: now_millis(),
            duration_ms,
            error,
            retry_count: item.retry_count,
            data,
        };
        self.history.lock().push(record);
    }

    /// Persists the queue snapshot, degrading to in-memory on store failure.
    async fn persist_queue(&self) {
        let encoded = {
            let queue = self.queue.lock();
            snapshot::encode_queue_snapshot(queue.items())
        };
        match encoded {
            Ok(bytes) => {
                if let Err(e) = self.store.put(&self.config.queue_collection, &bytes).await {
                    warn!(error = %e, "queue snapshot persist failed; continuing in memory");
                }
            }
            Err(e) => warn!(error = %e, "queue snapshot encoding failed"),
        }
    }

    /// Persists the history snapshot, degrading to in-memory on store failure.
    async fn persist_history(&self) {
        let encoded = {
            let history = self.history.lock();
            snapshot::encode_history_snapshot(&history.snapshot())
        };
        match encoded {
            Ok(bytes) => {
                if let Err(e) = self
                    .store
                    .put(&self.config.history_collection, &bytes)
                    .await
                {
                    warn!(error = %e, "history snapshot persist failed; continuing in memory");
                }
            }
            Err(e) => warn!(error = %e, "history snapshot encoding failed"),
        }
    }

    /// Computes current statistics purely from history plus the live queue
    /// length and run flag.
    pub fn get_sync_stats(&self) -> SyncStats {
        let HistoryStats {
            total_synced,
            synced_last_24_hours,
            synced_last_7_days,
            success_rate,
            by_type,
            recent_failures,
        } = self.history.lock().stats(now_millis());

        SyncStats {
            queue_size: self.queue.lock().len(),
            is_syncing: self.is_syncing(),
            total_synced,
            synced_last_24_hours,
            synced_last_7_days,
            success_rate,
            by_type,
            recent_failures,
        }
    }

    /// Discards pending (not yet dispatched) items. An already-dispatched
    /// in-flight batch is unaffected, as are scheduled retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot drop the queue collection.
    pub async fn clear_queue(&self) -> SyncResult<()> {
        let dropped = {
            let mut queue = self.queue.lock();
            let n = queue.len();
            queue.clear();
            n
        };
        info!(dropped, "sync queue cleared");
        self.store.clear(&self.config.queue_collection).await?;
        Ok(())
    }

    /// Discards all history records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot drop the history collection.
    pub async fn clear_history(&self) -> SyncResult<()> {
        self.history.lock().clear();
        info!("sync history cleared");
        self.store.clear(&self.config.history_collection).await?;
        Ok(())
    }

    /// Cancels all pending retry timers. Items whose timers are cancelled
    /// stay absent from the queue; their latest state is already recorded
    /// in history.
    pub fn shutdown(&self) {
        let mut timers = self.retry_timers.lock();
        let cancelled = timers.len();
        for handle in timers.drain(..) {
            handle.abort();
        }
        if cancelled > 0 {
            info!(cancelled, "pending retry timers cancelled");
        }
    }
}

impl<S: SnapshotStore, T: SyncTransport> std::fmt::Debug for SyncEngine<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("queue_size", &self.queue_size())
            .field("is_syncing", &self.is_syncing())
            .finish()
    }
}
