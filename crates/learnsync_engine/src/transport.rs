//! Transport layer abstraction for dispatching sync items.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use learnsync_model::{SyncItem, SyncType};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Outcome of dispatching one item to the remote authority.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The remote accepted the mutation; optional result body.
    Success(Option<Value>),
    /// The remote holds a divergent version; the engine applies the item's
    /// conflict policy to decide the winner.
    Conflict {
        /// The remote's current version of the data.
        remote: Value,
        /// The remote version's write time, epoch milliseconds.
        remote_timestamp_ms: u64,
    },
}

/// A sync transport delivers items to the remote authority.
///
/// This trait abstracts the network layer, allowing different
/// implementations (HTTP, mock for testing, etc.). The engine additionally
/// bounds each call with the type's timeout; transports should also abort
/// at the network layer where they can.
#[async_trait]
pub trait SyncTransport: Send + Sync + 'static {
    /// Dispatches one item, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a transport error on network failure or remote rejection;
    /// `is_retryable()` on the error decides whether the retry controller
    /// re-queues the item.
    async fn dispatch(&self, item: &SyncItem, timeout: Duration) -> SyncResult<DispatchOutcome>;
}

#[async_trait]
impl<T: SyncTransport + ?Sized> SyncTransport for std::sync::Arc<T> {
    async fn dispatch(&self, item: &SyncItem, timeout: Duration) -> SyncResult<DispatchOutcome> {
        (**self).dispatch(item, timeout).await
    }
}

/// Scripted behavior for [`MockTransport`].
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Dispatch succeeds with the given result body.
    Succeed(Option<Value>),
    /// Dispatch fails with a retryable transport error.
    FailTransient,
    /// Dispatch fails with a non-retryable transport error.
    FailFatal,
    /// Dispatch reports a divergent remote version.
    Conflict {
        /// Remote version returned to the engine.
        remote: Value,
        /// Remote write time.
        remote_timestamp_ms: u64,
    },
}

/// A mock transport for testing.
///
/// Behaviors resolve in order: one-shot per-item scripts, then sticky
/// per-item behavior, then per-type behavior, then the default (success).
/// Every dispatched item is recorded for assertions.
#[derive(Debug, Default)]
pub struct MockTransport {
    default_behavior: Mutex<Option<MockBehavior>>,
    per_type: Mutex<HashMap<SyncType, MockBehavior>>,
    per_item: Mutex<HashMap<Uuid, MockBehavior>>,
    one_shot: Mutex<HashMap<Uuid, Vec<MockBehavior>>>,
    dispatched: Mutex<Vec<SyncItem>>,
}

impl MockTransport {
    /// Creates a mock transport that succeeds by default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default behavior for unscripted dispatches.
    pub fn set_default(&self, behavior: MockBehavior) {
        *self.default_behavior.lock() = Some(behavior);
    }

    /// Sets a sticky behavior for one sync type.
    pub fn set_type_behavior(&self, sync_type: SyncType, behavior: MockBehavior) {
        self.per_type.lock().insert(sync_type, behavior);
    }

    /// Sets a sticky behavior for one item id.
    pub fn set_item_behavior(&self, id: Uuid, behavior: MockBehavior) {
        self.per_item.lock().insert(id, behavior);
    }

    /// Queues a one-shot behavior for one item id; consumed FIFO before
    /// sticky behaviors apply.
    pub fn push_one_shot(&self, id: Uuid, behavior: MockBehavior) {
        self.one_shot.lock().entry(id).or_default().push(behavior);
    }

    /// All items dispatched so far, in dispatch order.
    pub fn dispatched(&self) -> Vec<SyncItem> {
        self.dispatched.lock().clone()
    }

    /// Number of dispatch attempts for one item id.
    pub fn dispatch_count(&self, id: Uuid) -> usize {
        self.dispatched.lock().iter().filter(|i| i.id == id).count()
    }

    fn behavior_for(&self, item: &SyncItem) -> MockBehavior {
        {
            let mut one_shot = self.one_shot.lock();
            if let Some(scripts) = one_shot.get_mut(&item.id) {
                if !scripts.is_empty() {
                    return scripts.remove(0);
                }
            }
        }
        if let Some(behavior) = self.per_item.lock().get(&item.id) {
            return behavior.clone();
        }
        if let Some(behavior) = self.per_type.lock().get(&item.sync_type) {
            return behavior.clone();
        }
        self.default_behavior
            .lock()
            .clone()
            .unwrap_or(MockBehavior::Succeed(None))
    }
}

#[async_trait]
impl SyncTransport for MockTransport {
    async fn dispatch(&self, item: &SyncItem, _timeout: Duration) -> SyncResult<DispatchOutcome> {
        self.dispatched.lock().push(item.clone());
        match self.behavior_for(item) {
            MockBehavior::Succeed(body) => Ok(DispatchOutcome::Success(body)),
            MockBehavior::FailTransient => Err(SyncError::transport_retryable(format!(
                "simulated transient failure for {}",
                item.sync_type
            ))),
            MockBehavior::FailFatal => Err(SyncError::transport_fatal(format!(
                "simulated fatal failure for {}",
                item.sync_type
            ))),
            MockBehavior::Conflict {
                remote,
                remote_timestamp_ms,
            } => Ok(DispatchOutcome::Conflict {
                remote,
                remote_timestamp_ms,
            }),
        }
    }
}
