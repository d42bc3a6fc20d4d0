//! Snapshot store trait definition.

use crate::error::StoreResult;
use async_trait::async_trait;

/// A durable key-value store for engine snapshots.
///
/// Stores hold **opaque byte snapshots** keyed by collection name. The
/// engine owns all snapshot encoding - stores never interpret contents.
///
/// # Invariants
///
/// - `get` returns exactly the bytes most recently `put` for that
///   collection, or `None` if the collection has never been written
/// - `put` replaces the collection's snapshot atomically; a crash mid-put
///   leaves either the old or the new snapshot, never a torn one
/// - Collections are created on first use
/// - Stores must be `Send + Sync`; the engine persists from async tasks
///
/// # Implementors
///
/// - [`super::MemoryStore`] - For tests and ephemeral sessions
/// - [`super::FileStore`] - For persistent storage
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    /// Reads the current snapshot of a collection.
    ///
    /// Returns `None` if the collection has never been written.
    ///
    /// # Errors
    ///
    /// Returns an error on an invalid collection name or I/O failure.
    async fn get(&self, collection: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Replaces a collection's snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error on an invalid collection name or I/O failure.
    async fn put(&self, collection: &str, bytes: &[u8]) -> StoreResult<()>;

    /// Removes a collection's snapshot, if present.
    ///
    /// # Errors
    ///
    /// Returns an error on an invalid collection name or I/O failure.
    async fn clear(&self, collection: &str) -> StoreResult<()>;
}

#[async_trait]
impl<S: SnapshotStore + ?Sized> SnapshotStore for std::sync::Arc<S> {
    async fn get(&self, collection: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(collection).await
    }

    async fn put(&self, collection: &str, bytes: &[u8]) -> StoreResult<()> {
        (**self).put(collection, bytes).await
    }

    async fn clear(&self, collection: &str) -> StoreResult<()> {
        (**self).clear(collection).await
    }
}
