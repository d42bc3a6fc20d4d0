//! In-memory snapshot store for testing.

use crate::error::{validate_collection, StoreResult};
use crate::store::SnapshotStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory snapshot store.
///
/// Suitable for unit tests, integration tests, and sessions that do not
/// need persistence across restarts.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across tasks.
///
/// # Example
///
/// ```rust
/// use learnsync_store::{MemoryStore, SnapshotStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MemoryStore::new();
/// assert!(store.get("sync_queue").await.unwrap().is_none());
/// store.put("sync_queue", b"data").await.unwrap();
/// assert!(store.get("sync_queue").await.unwrap().is_some());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the names of all written collections, sorted.
    ///
    /// Useful for test assertions.
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn get(&self, collection: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_collection(collection)?;
        Ok(self.collections.read().get(collection).cloned())
    }

    async fn put(&self, collection: &str, bytes: &[u8]) -> StoreResult<()> {
        validate_collection(collection)?;
        self.collections
            .write()
            .insert(collection.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn clear(&self, collection: &str) -> StoreResult<()> {
        validate_collection(collection)?;
        self.collections.write().remove(collection);
        Ok(())
    }
}
